//! Stage 4: Bundle installation.

use crate::bundle::{self, BundleReport};
use crate::config::BootConfig;
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;

pub fn run(layout: &BootLayout, config: &BootConfig) -> BootResult<BundleReport> {
    bundle::install(layout, &config.desired_version, config.identity)
}
