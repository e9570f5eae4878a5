//! Replace the bootstrap with the web server.

use doliboot_shared::errors::{BootError, BootResult};
use std::convert::Infallible;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// The terminal action of a successful boot.
///
/// The pipeline returns it instead of exec'ing directly, so callers decide
/// when the process image is replaced and tests can inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    program: String,
    args: Vec<String>,
}

impl Handoff {
    /// Build from a command line; the first element is the program.
    pub fn from_command(command: &[String]) -> BootResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| BootError::Handoff("empty handoff command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// exec(2) the server. Only returns if the exec itself failed.
    pub fn exec(self) -> BootResult<Infallible> {
        tracing::info!(program = %self.program, args = ?self.args, "Starting web server");
        let err = Command::new(&self.program).args(&self.args).exec();
        Err(BootError::Handoff(format!(
            "Failed to exec {}: {}",
            self.program, err
        )))
    }
}
