//! First-run database installation.
//!
//! ```text
//! lock present? ──yes──→ Skipped(LockPresent)
//!      │no
//! Connect (retry every interval, forever)
//!      │
//! Probe ──Installed──→ Skipped(AlreadyInstalled)
//!      │Missing
//! Load: tables → keys → functions → data
//!      │
//! Bootstrap admin → Seed constants → Write lock ──→ Installed
//! ```
//!
//! Any failure after the probe aborts the run; a half-loaded schema is left
//! for the operator.

use crate::config::{BootConfig, ServiceIdentity};
use crate::db::{Connector, Database, ProbeOutcome, ScriptRunner};
use crate::storage::ownership::chown_entry;
use doliboot_shared::constants::sql;
use doliboot_shared::errors::{BootError, BootResult};
use doliboot_shared::layout::BootLayout;
use std::fs::{OpenOptions, Permissions};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay between connection attempts.
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Permission bits of the install lock.
pub const INSTALL_LOCK_MODE: u32 = 0o400;

const INSERT_ADMIN: &str = "INSERT INTO llx_user \
     (entity, login, pass_crypted, lastname, admin, statut) \
     VALUES (0, ?, ?, 'SuperAdmin', 1, 1)";
const DELETE_CONST: &str = "DELETE FROM llx_const WHERE name=?";
const INSERT_VERSION_CONST: &str = "INSERT INTO llx_const \
     (name, value, type, visible, note, entity) \
     VALUES ('MAIN_VERSION_LAST_INSTALL', ?, 'chaine', 0, 'Dolibarr version when install', 0)";
const INSERT_LANG_CONST: &str = "INSERT INTO llx_const \
     (name, value, type, visible, note, entity) \
     VALUES ('MAIN_LANG_DEFAULT', 'auto', 'chaine', 0, 'Default language', 1)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// install.lock exists
    LockPresent,
    /// The probe table answered
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Skipped(SkipReason),
    Installed { scripts: usize },
}

/// Drives the one-time schema load.
pub struct InstallOrchestrator<'a> {
    layout: &'a BootLayout,
    config: &'a BootConfig,
    connector: &'a dyn Connector,
    scripts: &'a dyn ScriptRunner,
    retry_interval: Duration,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(
        layout: &'a BootLayout,
        config: &'a BootConfig,
        connector: &'a dyn Connector,
        scripts: &'a dyn ScriptRunner,
    ) -> Self {
        Self {
            layout,
            config,
            connector,
            scripts,
            retry_interval: CONNECT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub async fn run(&self) -> BootResult<InstallOutcome> {
        let lock = self.layout.install_lock();
        if lock.exists() {
            tracing::info!(lock = %lock.display(), "Install lock present, skipping installation");
            return Ok(InstallOutcome::Skipped(SkipReason::LockPresent));
        }

        tracing::info!("Running dolibarr installation");
        let mut db = self.connect().await;

        if db.probe(sql::PROBE_TABLE).await? == ProbeOutcome::Installed {
            tracing::info!(table = sql::PROBE_TABLE, "Database already installed");
            return Ok(InstallOutcome::Skipped(SkipReason::AlreadyInstalled));
        }

        let plan = schema_plan(&self.layout.sql_install_dir())?;
        tracing::info!(scripts = plan.len(), "Running installation SQL scripts");
        for script in &plan {
            self.scripts.run(script).await?;
        }

        self.create_admin(db.as_mut()).await?;
        self.seed_constants(db.as_mut()).await?;
        write_install_lock(&lock, self.config.identity)?;

        Ok(InstallOutcome::Installed {
            scripts: plan.len(),
        })
    }

    /// Connect, retrying at a fixed interval until the server accepts.
    async fn connect(&self) -> Box<dyn Database> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.connector.connect().await {
                Ok(db) => {
                    tracing::info!(attempt, "Connected to database");
                    return db;
                }
                Err(e) => {
                    tracing::warn!(attempt, "Error connecting to database: {}", e);
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    async fn create_admin(&self, db: &mut dyn Database) -> BootResult<()> {
        let admin = self.config.admin.as_ref().ok_or_else(|| {
            BootError::Config("administrator credentials are not configured".to_string())
        })?;

        tracing::info!(login = %admin.login, "Creating SuperAdmin account");
        let digest = legacy_password_digest(&admin.password);
        db.execute(INSERT_ADMIN, &[admin.login.as_str(), digest.as_str()])
            .await?;
        Ok(())
    }

    async fn seed_constants(&self, db: &mut dyn Database) -> BootResult<()> {
        tracing::info!("Setting default constants");
        for name in sql::RESET_CONSTS {
            db.execute(DELETE_CONST, &[*name]).await?;
        }
        db.execute(INSERT_VERSION_CONST, &[self.config.desired_version.as_str()])
            .await?;
        db.execute(INSERT_LANG_CONST, &[]).await?;
        Ok(())
    }
}

/// Hex MD5 of the admin password.
///
/// The application still accepts unsalted MD5 in `pass_crypted` and rehashes
/// on first login; do not use this anywhere else.
pub fn legacy_password_digest(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}

/// Ordered list of schema scripts under `install_dir`.
///
/// `tables/*.sql` without keys, then `tables/*.key.sql`, then
/// `functions/*.sql`, then `data/*.sql`; each group sorted by file name.
pub fn schema_plan(install_dir: &Path) -> BootResult<Vec<PathBuf>> {
    let tables = sql_files(&install_dir.join("tables"))?;
    let (keys, plain): (Vec<PathBuf>, Vec<PathBuf>) =
        tables.into_iter().partition(|path| is_key_script(path));

    let mut plan = plain;
    plan.extend(keys);
    plan.extend(sql_files(&install_dir.join("functions"))?);
    plan.extend(sql_files(&install_dir.join("data"))?);
    Ok(plan)
}

fn is_key_script(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".key.sql"))
}

fn sql_files(dir: &Path) -> BootResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BootError::Storage(format!("Failed to list {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BootError::Storage(format!("Failed to read entry in {}: {}", dir.display(), e))
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sql") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn write_install_lock(lock: &Path, identity: ServiceIdentity) -> BootResult<()> {
    tracing::info!(lock = %lock.display(), "Creating install.lock");
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(lock)
        .map_err(|e| BootError::Storage(format!("Failed to create {}: {}", lock.display(), e)))?;

    chown_entry(lock, false, identity)?;
    std::fs::set_permissions(lock, Permissions::from_mode(INSTALL_LOCK_MODE))
        .map_err(|e| BootError::Storage(format!("Failed to chmod {}: {}", lock.display(), e)))
}
