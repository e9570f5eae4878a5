//! Recursive ownership sweep.

use crate::config::ServiceIdentity;
use doliboot_shared::errors::{BootError, BootResult};
use nix::unistd::{Gid, Uid, chown};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use walkdir::WalkDir;

/// Apply `identity` as owner and group of `root` and everything below it.
///
/// Symlinks are re-owned themselves and never followed, so a link pointing
/// outside the tree cannot redirect the sweep.
pub fn apply_ownership(root: &Path, identity: ServiceIdentity) -> BootResult<usize> {
    tracing::info!(
        path = %root.display(),
        uid = identity.uid,
        gid = identity.gid,
        "Correcting owner"
    );

    let mut count = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            BootError::Storage(format!("Failed to walk {}: {}", root.display(), e))
        })?;
        chown_entry(entry.path(), entry.path_is_symlink(), identity)?;
        count += 1;
    }

    tracing::debug!(path = %root.display(), entries = count, "Ownership applied");
    Ok(count)
}

/// Change owner and group of a single path.
///
/// With `no_follow` the link itself is changed rather than its target.
pub fn chown_entry(path: &Path, no_follow: bool, identity: ServiceIdentity) -> BootResult<()> {
    tracing::trace!("chown {}:{} {}", identity.uid, identity.gid, path.display());

    if no_follow {
        return std::os::unix::fs::lchown(path, Some(identity.uid), Some(identity.gid)).map_err(
            |e| BootError::Storage(format!("Failed to chown link {}: {}", path.display(), e)),
        );
    }

    chown(
        path,
        Some(Uid::from_raw(identity.uid)),
        Some(Gid::from_raw(identity.gid)),
    )
    .map_err(|e| BootError::Storage(format!("Failed to chown {}: {}", path.display(), e)))
}

/// Whether `path` is already owned by `identity`.
pub fn owned_by(path: &Path, identity: ServiceIdentity) -> BootResult<bool> {
    let meta = std::fs::metadata(path)
        .map_err(|e| BootError::Storage(format!("Failed to stat {}: {}", path.display(), e)))?;
    Ok(meta.uid() == identity.uid && meta.gid() == identity.gid)
}
