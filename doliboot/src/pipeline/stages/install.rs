//! Stage 6: First-run database installation (auto-install only).

use crate::config::BootConfig;
use crate::db::{Connector, ScriptRunner};
use crate::install::{InstallOrchestrator, InstallOutcome};
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;
use std::time::Duration;

pub async fn run(
    layout: &BootLayout,
    config: &BootConfig,
    connector: &dyn Connector,
    scripts: &dyn ScriptRunner,
    retry_interval: Duration,
) -> BootResult<Option<InstallOutcome>> {
    if !config.install_auto {
        tracing::debug!("Auto-install disabled");
        return Ok(None);
    }

    let outcome = InstallOrchestrator::new(layout, config, connector, scripts)
        .with_retry_interval(retry_interval)
        .run()
        .await?;
    Ok(Some(outcome))
}
