//! Database access for the install orchestrator.
//!
//! The orchestrator only needs three things from the database: a connection,
//! a probe telling whether the schema is present, and plain statements with
//! string binds. Schema scripts go through a separate `ScriptRunner` because
//! they are fed to the SQL client as whole files.

pub mod mysql;
pub mod script;

use async_trait::async_trait;
use doliboot_shared::errors::BootResult;
use std::path::Path;

pub use mysql::MysqlConnector;
pub use script::MariadbClient;

/// Result of probing for an existing installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The probe table answered.
    Installed,
    /// The server rejected the probe (table missing, unreadable rows).
    Missing,
}

/// An open database session.
#[async_trait]
pub trait Database: Send {
    /// Check whether `table` can be queried.
    ///
    /// Server-side rejections map to `Missing`; transport failures are errors.
    async fn probe(&mut self, table: &str) -> BootResult<ProbeOutcome>;

    /// Execute one statement with positional string binds.
    ///
    /// Returns the number of affected rows.
    async fn execute(&mut self, sql: &str, binds: &[&str]) -> BootResult<u64>;
}

/// Opens database sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Try once to connect.
    async fn connect(&self) -> BootResult<Box<dyn Database>>;
}

/// Runs a SQL script file against the database.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path) -> BootResult<()>;
}
