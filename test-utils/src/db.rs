use async_trait::async_trait;
use doliboot::db::{Connector, Database, ProbeOutcome, ScriptRunner};
use doliboot::{BootError, BootResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One executed statement and its binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<String>,
}

/// In-memory connector.
///
/// Refuses the first `failures` connects, then hands out sessions that share
/// one statement log.
#[derive(Clone)]
pub struct FakeConnector {
    failures: usize,
    attempts: Arc<AtomicUsize>,
    probe: ProbeOutcome,
    log: Arc<Mutex<Vec<Statement>>>,
}

impl FakeConnector {
    /// A server with an empty database.
    pub fn empty() -> Self {
        Self {
            failures: 0,
            attempts: Arc::new(AtomicUsize::new(0)),
            probe: ProbeOutcome::Missing,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A server whose schema is already loaded.
    pub fn installed() -> Self {
        Self {
            probe: ProbeOutcome::Installed,
            ..Self::empty()
        }
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> BootResult<Box<dyn Database>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(BootError::Database(format!(
                "connection refused (attempt {attempt})"
            )));
        }
        Ok(Box::new(FakeDatabase {
            probe: self.probe,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeDatabase {
    probe: ProbeOutcome,
    log: Arc<Mutex<Vec<Statement>>>,
}

#[async_trait]
impl Database for FakeDatabase {
    async fn probe(&mut self, _table: &str) -> BootResult<ProbeOutcome> {
        Ok(self.probe)
    }

    async fn execute(&mut self, sql: &str, binds: &[&str]) -> BootResult<u64> {
        self.log.lock().push(Statement {
            sql: sql.to_string(),
            binds: binds.iter().map(|b| b.to_string()).collect(),
        });
        Ok(1)
    }
}

/// Records script paths instead of running them.
#[derive(Default)]
pub struct RecordingScripts {
    runs: Mutex<Vec<PathBuf>>,
    fail_on: Option<String>,
}

impl RecordingScripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when a script with this file name is run.
    pub fn failing_on(file_name: &str) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            fail_on: Some(file_name.to_string()),
        }
    }

    pub fn runs(&self) -> Vec<PathBuf> {
        self.runs.lock().clone()
    }

    /// File names of the scripts run, relative to `base`.
    pub fn relative_runs(&self, base: &Path) -> Vec<String> {
        self.runs()
            .iter()
            .map(|p| p.strip_prefix(base).unwrap_or(p).display().to_string())
            .collect()
    }
}

#[async_trait]
impl ScriptRunner for RecordingScripts {
    async fn run(&self, script: &Path) -> BootResult<()> {
        self.runs.lock().push(script.to_path_buf());
        let name = script.file_name().and_then(|n| n.to_str());
        if self.fail_on.is_some() && name == self.fail_on.as_deref() {
            return Err(BootError::Script(format!("{} failed", script.display())));
        }
        Ok(())
    }
}
