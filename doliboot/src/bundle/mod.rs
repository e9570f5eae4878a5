//! Versioned installation of the application bundle.
//!
//! Each subtree (web root, scripts) is gated by its own version marker:
//!
//! ```text
//! Absent ──┐
//!          ├──→ extract (once) ──→ copy_tree ──→ chown -R ──→ write marker ──→ Current
//! Stale ───┘
//! ```
//!
//! The archive is extracted at most once per start, only if some subtree
//! needs it, and the staging directory is removed afterwards.

pub mod archive;
pub mod version;

use crate::config::ServiceIdentity;
use crate::storage::{apply_ownership, copy_tree, remove_tree};
use doliboot_shared::constants::bundle;
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;
use std::path::{Path, PathBuf};
pub use version::SubtreeState;

/// An installable part of the bundle.
#[derive(Debug, Clone)]
pub struct Subtree {
    /// Directory name inside the release
    pub name: &'static str,
    pub target: PathBuf,
    pub marker: PathBuf,
}

impl Subtree {
    /// The subtrees shipped in a release, in install order.
    pub fn all(layout: &BootLayout) -> [Subtree; 2] {
        [
            Subtree {
                name: bundle::HTDOCS_SUBTREE,
                target: layout.html_dir(),
                marker: layout.html_version_marker(),
            },
            Subtree {
                name: bundle::SCRIPTS_SUBTREE,
                target: layout.scripts_dir(),
                marker: layout.scripts_version_marker(),
            },
        ]
    }
}

/// What an install pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub extracted: bool,
    pub installed: Vec<&'static str>,
}

/// Bring every subtree to `version`.
pub fn install(
    layout: &BootLayout,
    version: &str,
    identity: ServiceIdentity,
) -> BootResult<BundleReport> {
    let mut pending = Vec::new();
    for subtree in Subtree::all(layout) {
        let state = version::check(&subtree.marker, version)?;
        if state.needs_install() {
            tracing::info!(subtree = subtree.name, ?state, version, "Subtree needs install");
            pending.push(subtree);
        }
    }

    if pending.is_empty() {
        tracing::info!(version, "Bundle already installed");
        return Ok(BundleReport::default());
    }

    tracing::info!("Version outdated or not installed - extracting bundle");
    let staging = StagingGuard::new(layout.staging_dir());
    archive::extract(&layout.bundle_archive(), staging.path())?;
    let release = layout.staged_release(version);

    let mut report = BundleReport {
        extracted: true,
        installed: Vec::with_capacity(pending.len()),
    };
    for subtree in pending {
        install_subtree(&release, &subtree, version, identity)?;
        report.installed.push(subtree.name);
    }

    staging.finish()?;
    Ok(report)
}

fn install_subtree(
    release: &Path,
    subtree: &Subtree,
    version: &str,
    identity: ServiceIdentity,
) -> BootResult<()> {
    tracing::info!(
        subtree = subtree.name,
        target = %subtree.target.display(),
        "Copying subtree"
    );
    let copied = copy_tree(&release.join(subtree.name), &subtree.target)?;
    apply_ownership(&subtree.target, identity)?;
    version::write_marker(&subtree.marker, version)?;
    tracing::info!(subtree = subtree.name, entries = copied, version, "Subtree installed");
    Ok(())
}

/// Removes the staging directory when dropped.
///
/// `finish` removes it and reports failures; a guard dropped on an error path
/// removes it best-effort.
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn finish(mut self) -> BootResult<()> {
        self.armed = false;
        tracing::info!(path = %self.path.display(), "Removing extracted bundle");
        remove_tree(&self.path).map(|_| ())
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = remove_tree(&self.path) {
            tracing::warn!("Failed to remove staging directory: {}", e);
        }
    }
}
