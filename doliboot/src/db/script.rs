//! SQL script execution through the MariaDB command-line client.

use super::ScriptRunner;
use crate::config::DbSettings;
use async_trait::async_trait;
use doliboot_shared::constants::sql;
use doliboot_shared::errors::{BootError, BootResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Feeds script files to `mariadb` on stdin.
///
/// The password travels in `MYSQL_PWD` rather than on the command line so it
/// does not show up in the process list.
#[derive(Debug, Clone)]
pub struct MariadbClient {
    binary: PathBuf,
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    database: String,
}

impl MariadbClient {
    pub fn new(db: &DbSettings) -> Self {
        Self {
            binary: PathBuf::from(sql::CLIENT_BINARY),
            host: db.host.clone().unwrap_or_default(),
            port: db.port,
            user: db.user.clone().unwrap_or_default(),
            password: db.password.clone(),
            database: db.name.clone().unwrap_or_default(),
        }
    }

    /// Use a different client executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(format!("--host={}", self.host))
            .arg(format!("--port={}", self.port))
            .arg(format!("--user={}", self.user))
            .arg(&self.database);
        if let Some(password) = &self.password {
            cmd.env("MYSQL_PWD", password);
        }
        cmd
    }
}

#[async_trait]
impl ScriptRunner for MariadbClient {
    async fn run(&self, script: &Path) -> BootResult<()> {
        tracing::info!("Executing script {}", script.display());

        let input = File::open(script).map_err(|e| {
            BootError::Script(format!("Failed to open script {}: {}", script.display(), e))
        })?;

        let status = self
            .command()
            .stdin(Stdio::from(input))
            .status()
            .await
            .map_err(|e| {
                BootError::Script(format!(
                    "Failed to run {} for {}: {}",
                    self.binary.display(),
                    script.display(),
                    e
                ))
            })?;

        if !status.success() {
            return Err(BootError::Script(format!(
                "{} exited with {} while executing {}",
                self.binary.display(),
                status,
                script.display()
            )));
        }
        Ok(())
    }
}
