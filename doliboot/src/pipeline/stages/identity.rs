//! Stage 2: Identity reconciliation.

use crate::config::BootConfig;
use crate::identity::{self, Reassignment};
use doliboot_shared::constants::identity::SERVICE_ACCOUNT;
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityOutput {
    pub uid: Reassignment,
    pub gid: Reassignment,
}

impl IdentityOutput {
    /// Whether either ID moved, which invalidates existing file ownership.
    pub fn changed(&self) -> bool {
        self.uid.changed() || self.gid.changed()
    }
}

/// Map www-data onto the configured UID and GID.
pub fn run(layout: &BootLayout, config: &BootConfig) -> BootResult<IdentityOutput> {
    let uid = identity::reassign_uid(layout, SERVICE_ACCOUNT, config.identity.uid)?;
    let gid = identity::reassign_gid(layout, SERVICE_ACCOUNT, config.identity.gid)?;
    Ok(IdentityOutput { uid, gid })
}
