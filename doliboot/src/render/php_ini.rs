//! php.ini directive rewrite.

use doliboot_shared::constants::server;
use doliboot_shared::errors::{BootError, BootResult};
use doliboot_shared::layout::BootLayout;
use std::path::{Path, PathBuf};

pub const TIMEZONE_KEY: &str = "date.timezone";
pub const SENDMAIL_KEY: &str = "sendmail_path";

/// Whether `line` sets `key`, commented out or not.
///
/// Matches `key = ...`, `key=...` and `;key = ...`, but not `key_other = ...`.
pub fn is_directive(line: &str, key: &str) -> bool {
    let stripped = line.trim_start().trim_start_matches(';').trim_start();
    stripped
        .strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Replace every line setting one of `directives` with `key = value`.
///
/// Unmatched lines and all line endings are kept verbatim.
pub fn rewrite_directives(content: &str, directives: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix("\r\n") {
            Some(body) => (body, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            },
        };

        match directives.iter().find(|(key, _)| is_directive(body, key)) {
            Some((key, value)) => {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push_str(ending);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Rewrite the live php.ini, seeding it from the production template.
///
/// `timezone` is only applied when set; `sendmail_path` is always pinned.
pub fn render_php_ini(layout: &BootLayout, timezone: Option<&str>) -> BootResult<PathBuf> {
    let live = layout.php_ini();
    let source = if live.is_file() {
        live.clone()
    } else {
        layout.php_ini_production()
    };
    tracing::info!(source = %source.display(), target = %live.display(), "Updating php.ini");

    let content = read(&source)?;
    let mut directives = vec![(SENDMAIL_KEY, server::SENDMAIL_PATH)];
    match timezone {
        Some(tz) => directives.push((TIMEZONE_KEY, tz)),
        None => tracing::debug!("No timezone configured, keeping {}", TIMEZONE_KEY),
    }

    let rendered = rewrite_directives(&content, &directives);
    std::fs::write(&live, rendered)
        .map_err(|e| BootError::Storage(format!("Failed to write {}: {}", live.display(), e)))?;
    Ok(live)
}

fn read(path: &Path) -> BootResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| BootError::Storage(format!("Failed to read {}: {}", path.display(), e)))
}
