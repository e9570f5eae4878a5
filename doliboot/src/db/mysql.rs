//! MySQL / MariaDB sessions over sqlx.

use super::{Connector, Database, ProbeOutcome};
use crate::config::DbSettings;
use async_trait::async_trait;
use doliboot_shared::errors::{BootError, BootResult};
use sqlx::Connection;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};

/// Connects with the settings from the environment.
pub struct MysqlConnector {
    options: MySqlConnectOptions,
    target: String,
}

impl MysqlConnector {
    pub fn new(db: &DbSettings) -> Self {
        let host = db.host.as_deref().unwrap_or_default();
        let name = db.name.as_deref().unwrap_or_default();
        let user = db.user.as_deref().unwrap_or_default();

        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(db.port)
            .database(name)
            .username(user);
        if let Some(password) = db.password.as_deref() {
            options = options.password(password);
        }

        Self {
            options,
            target: format!("{}:{}/{} as {}", host, db.port, name, user),
        }
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    async fn connect(&self) -> BootResult<Box<dyn Database>> {
        tracing::info!("Connecting to database {}", self.target);
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| {
                BootError::Database(format!("Failed to connect to {}: {}", self.target, e))
            })?;
        Ok(Box::new(MysqlSession { conn }))
    }
}

/// A single MySQL connection.
pub struct MysqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Database for MysqlSession {
    async fn probe(&mut self, table: &str) -> BootResult<ProbeOutcome> {
        let sql = format!("SELECT 1 FROM {table} LIMIT 1");
        match sqlx::query(&sql).fetch_optional(&mut self.conn).await {
            Ok(_) => Ok(ProbeOutcome::Installed),
            Err(e) => classify_probe_error(table, e),
        }
    }

    async fn execute(&mut self, sql: &str, binds: &[&str]) -> BootResult<u64> {
        if sql.trim().is_empty() {
            tracing::debug!("Skipping empty sql command");
            return Ok(0);
        }

        tracing::info!(binds = binds.len(), "Executing SQL: {}", sql);
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(bind.to_string());
        }

        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| BootError::Database(format!("Failed to execute '{}': {}", sql, e)))?;
        Ok(result.rows_affected())
    }
}

/// Split probe failures into "not installed" and real connectivity errors.
///
/// Anything the server answered (unknown table, bad rows) means the schema is
/// not usable and must be loaded; transport errors abort instead of risking
/// a reinstall over a live database.
pub fn classify_probe_error(table: &str, err: sqlx::Error) -> BootResult<ProbeOutcome> {
    match err {
        sqlx::Error::Database(db_err) => {
            tracing::info!(table, "Probe rejected by server: {}", db_err);
            Ok(ProbeOutcome::Missing)
        }
        sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            tracing::warn!(table, "Probe could not read rows: {}", err);
            Ok(ProbeOutcome::Missing)
        }
        other => Err(BootError::Database(format!(
            "Probe of {} failed: {}",
            table, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbKind;

    #[test]
    fn test_server_side_failures_mean_missing() {
        assert_eq!(
            classify_probe_error("llx_const", sqlx::Error::RowNotFound).unwrap(),
            ProbeOutcome::Missing
        );
        assert_eq!(
            classify_probe_error("llx_const", sqlx::Error::ColumnNotFound("x".into())).unwrap(),
            ProbeOutcome::Missing
        );
    }

    #[test]
    fn test_transport_failures_are_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = classify_probe_error("llx_const", sqlx::Error::Io(io)).unwrap_err();
        assert!(matches!(err, BootError::Database(_)));
        assert!(classify_probe_error("llx_const", sqlx::Error::PoolClosed).is_err());
    }

    #[test]
    fn test_connector_target_omits_password() {
        let connector = MysqlConnector::new(&DbSettings {
            kind: DbKind::Mariadb,
            host: Some("db".into()),
            port: 3307,
            name: Some("dolibarr".into()),
            user: Some("doli".into()),
            password: Some("s3cret".into()),
        });
        assert_eq!(connector.target, "db:3307/dolibarr as doli");
    }
}
