//! Write-once conf.php.
//!
//! The file carries the database password and the installation identity, so
//! it is created exclusively on first boot and never touched again.

use crate::config::BootConfig;
use crate::storage::ownership::chown_entry;
use doliboot_shared::constants::sql;
use doliboot_shared::errors::{BootError, BootResult};
use doliboot_shared::layout::BootLayout;
use std::fs::{OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Final permission bits: owner read only.
pub const APP_CONF_MODE: u32 = 0o400;

/// Escape a value for a PHP single-quoted string.
fn php_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// The ordered `$name='value';` assignments of conf.php.
pub fn conf_entries(layout: &BootLayout, config: &BootConfig) -> Vec<(&'static str, String)> {
    let html = layout.html_dir();
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    vec![
        ("dolibarr_main_url_root", opt(&config.url_root)),
        ("dolibarr_main_document_root", html.display().to_string()),
        ("dolibarr_main_url_root_alt", "/custom".to_string()),
        (
            "dolibarr_main_document_root_alt",
            layout.custom_dir().display().to_string(),
        ),
        (
            "dolibarr_main_data_root",
            layout.documents_dir().display().to_string(),
        ),
        ("dolibarr_main_db_host", opt(&config.db.host)),
        ("dolibarr_main_db_port", config.db.port.to_string()),
        ("dolibarr_main_db_name", opt(&config.db.name)),
        ("dolibarr_main_db_prefix", sql::TABLE_PREFIX.to_string()),
        ("dolibarr_main_db_user", opt(&config.db.user)),
        ("dolibarr_main_db_pass", opt(&config.db.password)),
        ("dolibarr_main_db_type", config.db.kind.driver().to_string()),
        ("dolibarr_main_prod", opt(&config.production)),
    ]
}

/// Render the full conf.php text.
pub fn render(layout: &BootLayout, config: &BootConfig) -> String {
    let mut out = String::from("<?php\n");
    for (name, value) in conf_entries(layout, config) {
        out.push_str(&format!("  ${}='{}';\n", name, php_quote(&value)));
    }
    out
}

/// Create conf.php unless it already exists.
///
/// Returns whether the file was written.
pub fn render_app_conf(layout: &BootLayout, config: &BootConfig) -> BootResult<bool> {
    let path = layout.app_conf();
    if path.exists() {
        tracing::info!(path = %path.display(), "conf.php already present, leaving it untouched");
        return Ok(false);
    }

    tracing::info!(path = %path.display(), "Creating conf.php");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            BootError::Storage(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&path)
        .map_err(|e| BootError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
    file.write_all(render(layout, config).as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| BootError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;
    drop(file);

    chown_entry(&path, false, config.identity)?;
    std::fs::set_permissions(&path, Permissions::from_mode(APP_CONF_MODE))
        .map_err(|e| BootError::Storage(format!("Failed to chmod {}: {}", path.display(), e)))?;
    Ok(true)
}
