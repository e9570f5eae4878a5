//! Stage 1: Filesystem setup.
//!
//! Ensures the web directories exist and keeps the legacy htdocs path alive.

use crate::storage::ensure_dir;
use doliboot_shared::errors::{BootError, BootResult};
use doliboot_shared::layout::BootLayout;

/// Mode for directories created at startup.
pub const DIR_MODE: u32 = 0o755;

/// Create documents, web root and scripts directories.
pub fn run(layout: &BootLayout) -> BootResult<()> {
    tracing::info!("Creating directories");
    for dir in layout.provisioned_dirs() {
        ensure_dir(&dir, DIR_MODE)?;
    }
    Ok(())
}

/// Point /var/www/htdocs at the web root unless something is already there.
///
/// A dangling symlink counts as present. Returns whether a link was created.
pub fn ensure_compat_link(layout: &BootLayout) -> BootResult<bool> {
    let link = layout.htdocs_compat_link();
    if link.symlink_metadata().is_ok() {
        return Ok(false);
    }

    let target = layout.html_dir();
    tracing::info!(
        "Creating symlink from {} to {}",
        link.display(),
        target.display()
    );
    std::os::unix::fs::symlink(&target, &link).map_err(|e| {
        BootError::Storage(format!(
            "Failed to create symlink {} -> {}: {}",
            link.display(),
            target.display(),
            e
        ))
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_creates_all_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = BootLayout::new(temp.path());
        run(&layout).unwrap();
        for dir in layout.provisioned_dirs() {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        run(&layout).unwrap();
    }

    #[test]
    fn test_compat_link_created_once() {
        let temp = TempDir::new().unwrap();
        let layout = BootLayout::new(temp.path());
        run(&layout).unwrap();

        assert!(ensure_compat_link(&layout).unwrap());
        assert_eq!(
            std::fs::read_link(layout.htdocs_compat_link()).unwrap(),
            layout.html_dir()
        );
        assert!(!ensure_compat_link(&layout).unwrap());
    }

    #[test]
    fn test_compat_link_keeps_existing_directory() {
        let temp = TempDir::new().unwrap();
        let layout = BootLayout::new(temp.path());
        std::fs::create_dir_all(layout.htdocs_compat_link()).unwrap();
        assert!(!ensure_compat_link(&layout).unwrap());
        assert!(layout.htdocs_compat_link().is_dir());
    }
}
