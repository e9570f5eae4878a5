//! Directory provisioning and tree copy/removal.

use doliboot_shared::errors::{BootError, BootResult};
use nix::unistd::{Gid, Uid, chown};
use std::fs::{self, DirBuilder, Permissions};
use std::os::unix::fs::{DirBuilderExt, MetadataExt, PermissionsExt, symlink};
use std::path::{Path, PathBuf};

/// Create `path` and any missing ancestors with `mode`.
///
/// Existing directories are left as they are.
pub fn ensure_dir(path: &Path, mode: u32) -> BootResult<()> {
    tracing::debug!("mkdir {} ({:o})", path.display(), mode);
    DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|e| {
            BootError::Storage(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })
}

/// Copy `src` onto `dst`, carrying each source entry's owner, group and mode.
///
/// Directories are created (or reused), regular files are overwritten with
/// the source contents, symlinks are recreated pointing at the same target.
/// Other file types are skipped. Returns the number of entries copied.
pub fn copy_tree(src: &Path, dst: &Path) -> BootResult<usize> {
    let mut stack: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dst.to_path_buf())];
    let mut copied = 0;

    while let Some((from, to)) = stack.pop() {
        let meta = fs::symlink_metadata(&from)
            .map_err(|e| BootError::Storage(format!("Failed to stat {}: {}", from.display(), e)))?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
        } else if file_type.is_dir() {
            tracing::trace!("mkdir {}", to.display());
            fs::create_dir_all(&to).map_err(|e| {
                BootError::Storage(format!("Failed to create directory {}: {}", to.display(), e))
            })?;
        } else if file_type.is_file() {
            tracing::trace!("cp {} {}", from.display(), to.display());
            fs::copy(&from, &to).map_err(|e| {
                BootError::Storage(format!(
                    "Failed to copy {} -> {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
        } else {
            tracing::debug!("Skipping special file {}", from.display());
            continue;
        }

        preserve_metadata(&to, &meta)?;
        copied += 1;

        if file_type.is_dir() {
            let entries = fs::read_dir(&from).map_err(|e| {
                BootError::Storage(format!("Failed to read directory {}: {}", from.display(), e))
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| {
                    BootError::Storage(format!("Failed to read entry in {}: {}", from.display(), e))
                })?;
                stack.push((entry.path(), to.join(entry.file_name())));
            }
        }
    }

    Ok(copied)
}

/// Remove `path` and everything below it. Absent paths are not an error.
///
/// Returns whether anything was removed.
pub fn remove_tree(path: &Path) -> BootResult<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(BootError::Storage(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            )));
        }
    };

    tracing::debug!("rm -r {}", path.display());
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| BootError::Storage(format!("Failed to remove {}: {}", path.display(), e)))?;
    Ok(true)
}

fn copy_symlink(from: &Path, to: &Path) -> BootResult<()> {
    let target = fs::read_link(from).map_err(|e| {
        BootError::Storage(format!("Failed to read symlink {}: {}", from.display(), e))
    })?;

    if let Ok(existing) = fs::symlink_metadata(to) {
        if existing.is_dir() {
            return Err(BootError::Storage(format!(
                "Cannot replace directory {} with a symlink",
                to.display()
            )));
        }
        fs::remove_file(to).map_err(|e| {
            BootError::Storage(format!("Failed to replace {}: {}", to.display(), e))
        })?;
    }

    tracing::trace!("ln -s {} {}", target.display(), to.display());
    symlink(&target, to).map_err(|e| {
        BootError::Storage(format!(
            "Failed to create symlink {} -> {}: {}",
            to.display(),
            target.display(),
            e
        ))
    })
}

/// Apply the source entry's owner, group and (for non-links) mode to `to`.
fn preserve_metadata(to: &Path, meta: &fs::Metadata) -> BootResult<()> {
    if meta.file_type().is_symlink() {
        return std::os::unix::fs::lchown(to, Some(meta.uid()), Some(meta.gid())).map_err(|e| {
            BootError::Storage(format!("Failed to chown link {}: {}", to.display(), e))
        });
    }

    chown(
        to,
        Some(Uid::from_raw(meta.uid())),
        Some(Gid::from_raw(meta.gid())),
    )
    .map_err(|e| BootError::Storage(format!("Failed to chown {}: {}", to.display(), e)))?;

    fs::set_permissions(to, Permissions::from_mode(meta.mode() & 0o7777))
        .map_err(|e| BootError::Storage(format!("Failed to chmod {}: {}", to.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// relative path -> (kind, mode, uid, gid, contents)
    type Snapshot = BTreeMap<PathBuf, (char, u32, u32, u32, Vec<u8>)>;

    fn snapshot(root: &Path) -> Snapshot {
        let mut out = BTreeMap::new();
        for entry in walkdir::WalkDir::new(root).min_depth(1) {
            let entry = entry.unwrap();
            let meta = entry.path().symlink_metadata().unwrap();
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let (kind, contents) = if meta.file_type().is_symlink() {
                ('l', fs::read_link(entry.path()).unwrap().into_os_string().into_encoded_bytes())
            } else if meta.is_dir() {
                ('d', Vec::new())
            } else {
                ('f', fs::read(entry.path()).unwrap())
            };
            let mode = if kind == 'l' { 0 } else { meta.mode() & 0o7777 };
            out.insert(rel, (kind, mode, meta.uid(), meta.gid(), contents));
        }
        out
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("core/lib")).unwrap();
        fs::write(root.join("index.php"), "<?php echo 1;").unwrap();
        fs::write(root.join("core/lib/functions.lib.php"), vec![0u8, 1, 2, 255]).unwrap();
        fs::write(root.join("core/run.sh"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(root.join("core/run.sh"), Permissions::from_mode(0o750)).unwrap();
        fs::set_permissions(root.join("index.php"), Permissions::from_mode(0o640)).unwrap();
        symlink("lib/functions.lib.php", root.join("core/alias.php")).unwrap();
    }

    #[test]
    fn test_ensure_dir_creates_ancestors_and_tolerates_existing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("var/www/documents");
        ensure_dir(&dir, 0o755).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir, 0o755).unwrap();
    }

    #[test]
    fn test_copy_tree_preserves_contents_and_modes() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        sample_tree(&src);

        let copied = copy_tree(&src, &dst).unwrap();
        // src, index.php, core, lib, functions.lib.php, run.sh, alias.php
        assert_eq!(copied, 7);

        let expected = snapshot(&src);
        assert_eq!(snapshot(&dst), expected);
        assert_eq!(
            fs::metadata(dst.join("core/run.sh")).unwrap().mode() & 0o777,
            0o750
        );
    }

    #[test]
    fn test_copy_tree_twice_is_identical() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        sample_tree(&src);

        copy_tree(&src, &dst).unwrap();
        let first = snapshot(&dst);
        copy_tree(&src, &dst).unwrap();
        assert_eq!(snapshot(&dst), first);
    }

    #[test]
    fn test_copy_tree_keeps_unrelated_target_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        sample_tree(&src);
        fs::create_dir_all(dst.join("conf")).unwrap();
        fs::write(dst.join("conf/conf.php"), "secret").unwrap();

        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("conf/conf.php")).unwrap(), "secret");
    }

    #[test]
    fn test_copy_tree_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let err = copy_tree(&temp.path().join("nope"), &temp.path().join("dst")).unwrap_err();
        assert!(matches!(err, BootError::Storage(_)));
    }

    #[test]
    fn test_remove_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("staging");
        sample_tree(&root);

        assert!(remove_tree(&root).unwrap());
        assert!(!root.exists());
        assert!(!remove_tree(&root).unwrap());
    }
}
