//! Boot orchestration.
//!
//! ## Architecture
//!
//! `BootPipeline` runs every stage strictly in sequence and ends in a
//! `Handoff`, the only terminal action of a successful boot:
//!
//! ```text
//! 1. Filesystem ──→ 2. Identity ──→ 3. Ownership ──→ 4. Bundle
//!                                                       │
//!        Handoff ←── 7. Install? ←── 6. Render ←── 5. CompatLink
//! ```
//!
//! Any stage error stops the pipeline before the handoff is built.

mod stages;

use crate::bundle::BundleReport;
use crate::config::BootConfig;
use crate::db::{Connector, ScriptRunner};
use crate::handoff::Handoff;
use crate::install::{CONNECT_RETRY_INTERVAL, InstallOutcome};
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;
use std::path::PathBuf;
use std::time::Duration;

pub use stages::identity::IdentityOutput;

/// Everything a boot did, plus the action that finishes it.
#[derive(Debug)]
pub struct BootReport {
    pub identity: IdentityOutput,
    pub swept: Vec<PathBuf>,
    pub bundle: BundleReport,
    pub compat_link_created: bool,
    pub app_conf_written: bool,
    pub install: Option<InstallOutcome>,
    pub handoff: Handoff,
}

/// Runs the boot stages against a layout.
///
/// # Example
///
/// ```ignore
/// let report = BootPipeline::new(&layout, &config)
///     .run(&connector, &scripts)
///     .await?;
/// report.handoff.exec()?;
/// ```
pub struct BootPipeline<'a> {
    layout: &'a BootLayout,
    config: &'a BootConfig,
    retry_interval: Duration,
}

impl<'a> BootPipeline<'a> {
    pub fn new(layout: &'a BootLayout, config: &'a BootConfig) -> Self {
        Self {
            layout,
            config,
            retry_interval: CONNECT_RETRY_INTERVAL,
        }
    }

    /// Override the database connect retry interval.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub async fn run(
        &self,
        connector: &dyn Connector,
        scripts: &dyn ScriptRunner,
    ) -> BootResult<BootReport> {
        let (layout, config) = (self.layout, self.config);

        stages::filesystem::run(layout)?;
        let identity = stages::identity::run(layout, config)?;
        let swept = stages::ownership::run(layout, config, &identity)?;
        let bundle = stages::bundle::run(layout, config)?;
        let compat_link_created = stages::filesystem::ensure_compat_link(layout)?;
        let rendered = stages::render::run(layout, config)?;
        let install =
            stages::install::run(layout, config, connector, scripts, self.retry_interval).await?;

        let handoff = Handoff::from_command(&config.command)?;
        tracing::info!(version = %config.desired_version, "Bootstrap complete");

        Ok(BootReport {
            identity,
            swept,
            bundle,
            compat_link_created,
            app_conf_written: rendered.app_conf_written,
            install,
            handoff,
        })
    }
}
