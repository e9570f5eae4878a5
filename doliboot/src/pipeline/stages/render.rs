//! Stage 5: Configuration rendering.

use crate::config::BootConfig;
use crate::render::{render_app_conf, render_php_ini};
use doliboot_shared::errors::BootResult;
use doliboot_shared::layout::BootLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutput {
    pub app_conf_written: bool,
}

pub fn run(layout: &BootLayout, config: &BootConfig) -> BootResult<RenderOutput> {
    render_php_ini(layout, config.timezone.as_deref())?;
    let app_conf_written = render_app_conf(layout, config)?;
    Ok(RenderOutput { app_conf_written })
}
