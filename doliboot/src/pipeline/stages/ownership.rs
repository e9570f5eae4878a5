//! Stage 3: Ownership drift correction.

use super::identity::IdentityOutput;
use crate::config::BootConfig;
use crate::storage::{apply_ownership, owned_by};
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;
use std::path::PathBuf;

/// Re-own the web tree after an ID change, then any root that drifted.
///
/// Returns the roots that were swept.
pub fn run(
    layout: &BootLayout,
    config: &BootConfig,
    identity: &IdentityOutput,
) -> BootResult<Vec<PathBuf>> {
    let mut swept = Vec::new();

    if identity.changed() {
        let www = layout.www_root();
        apply_ownership(&www, config.identity)?;
        swept.push(www);
    }

    for dir in layout.provisioned_dirs() {
        if !owned_by(&dir, config.identity)? {
            apply_ownership(&dir, config.identity)?;
            swept.push(dir);
        }
    }

    Ok(swept)
}
