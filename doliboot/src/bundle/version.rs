//! Per-subtree version markers.

use doliboot_shared::errors::{BootError, BootResult};
use std::path::Path;

/// Installation state of a subtree relative to the desired version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtreeState {
    /// No marker: never installed.
    Absent,
    /// Marker holds a different version.
    Stale { installed: String },
    /// Marker matches the desired version.
    Current,
}

impl SubtreeState {
    pub fn needs_install(&self) -> bool {
        !matches!(self, Self::Current)
    }
}

/// Read the marker at `marker`, `None` if it does not exist.
pub fn read_marker(marker: &Path) -> BootResult<Option<String>> {
    match std::fs::read_to_string(marker) {
        Ok(content) => Ok(Some(content.trim_end().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BootError::Storage(format!(
            "Failed to read version marker {}: {}",
            marker.display(),
            e
        ))),
    }
}

/// Compare the marker at `marker` with `desired`.
pub fn check(marker: &Path, desired: &str) -> BootResult<SubtreeState> {
    let state = match read_marker(marker)? {
        None => SubtreeState::Absent,
        Some(installed) if installed == desired => SubtreeState::Current,
        Some(installed) => SubtreeState::Stale { installed },
    };
    tracing::debug!(marker = %marker.display(), desired, ?state, "Version check");
    Ok(state)
}

/// Record `version` as installed.
pub fn write_marker(marker: &Path, version: &str) -> BootResult<()> {
    std::fs::write(marker, version).map_err(|e| {
        BootError::Storage(format!(
            "Failed to write version marker {}: {}",
            marker.display(),
            e
        ))
    })
}
