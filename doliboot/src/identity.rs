//! Identity reconciliation for /etc/passwd and /etc/group.
//!
//! Maps the service account onto operator-supplied numeric IDs. The table is
//! rewritten in memory first and persisted only when the account's ID actually
//! changed; an ID owned by another account aborts before anything is written.

use doliboot_shared::errors::{BootError, BootResult};
use doliboot_shared::layout::BootLayout;
use std::path::Path;

/// Field index of the numeric ID (uid in passwd, gid in group).
const ID_FIELD: usize = 2;

/// Field index of the primary group in passwd.
const PRIMARY_GID_FIELD: usize = 3;

/// Outcome of a reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassignment {
    /// The account has no record in the table.
    NotFound,
    /// The account already had the requested ID.
    Unchanged,
    /// The ID was rewritten from `previous`.
    Changed { previous: String },
}

impl Reassignment {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Result of rewriting a table in memory.
#[derive(Debug)]
pub struct Rewrite {
    pub content: String,
    pub outcome: Reassignment,
}

/// Rewrite the ID field of `account` to `new_id`.
///
/// `table` names the table in conflict errors. Blank lines and `#` comments
/// pass through untouched, as do all fields other than the ID.
pub fn rewrite_ids(table: &str, content: &str, account: &str, new_id: u32) -> BootResult<Rewrite> {
    let wanted = new_id.to_string();
    let mut outcome = Reassignment::NotFound;
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_ending(line);
        if is_passthrough(body) {
            out.push_str(line);
            continue;
        }

        let mut fields: Vec<&str> = body.split(':').collect();
        if fields.len() <= ID_FIELD {
            return Err(BootError::Identity(format!(
                "{table}: malformed record '{body}'"
            )));
        }

        if fields[0] == account {
            if fields[ID_FIELD] == wanted {
                outcome = Reassignment::Unchanged;
            } else {
                outcome = Reassignment::Changed {
                    previous: fields[ID_FIELD].to_string(),
                };
                fields[ID_FIELD] = &wanted;
            }
        } else if fields[ID_FIELD] == wanted {
            return Err(BootError::IdentityConflict {
                table: table.to_string(),
                id: new_id,
                owner: fields[0].to_string(),
            });
        }

        out.push_str(&fields.join(":"));
        out.push_str(ending);
    }

    Ok(Rewrite {
        content: out,
        outcome,
    })
}

/// Point every passwd record whose primary group is `old_gid` at `new_gid`.
///
/// Returns `None` when no record referenced the old group.
pub fn propagate_primary_gid(content: &str, old_gid: &str, new_gid: u32) -> Option<String> {
    let wanted = new_gid.to_string();
    let mut touched = false;
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_ending(line);
        let mut fields: Vec<&str> = body.split(':').collect();
        if is_passthrough(body)
            || fields.len() <= PRIMARY_GID_FIELD
            || fields[PRIMARY_GID_FIELD] != old_gid
        {
            out.push_str(line);
            continue;
        }

        fields[PRIMARY_GID_FIELD] = &wanted;
        touched = true;
        out.push_str(&fields.join(":"));
        out.push_str(ending);
    }

    touched.then_some(out)
}

/// Reassign the numeric ID of `account` in the table at `path`.
///
/// The file is written back only when the ID changed.
pub fn reassign(path: &Path, account: &str, new_id: u32) -> BootResult<Reassignment> {
    let table = path.display().to_string();
    let content = read_table(path)?;
    let rewrite = rewrite_ids(&table, &content, account, new_id)?;

    match &rewrite.outcome {
        Reassignment::Changed { previous } => {
            tracing::info!(table = %table, account, previous = %previous, new_id, "Reassigning id");
            write_table(path, &rewrite.content)?;
        }
        Reassignment::Unchanged => {
            tracing::debug!(table = %table, account, new_id, "Id already matches");
        }
        Reassignment::NotFound => {
            tracing::warn!(table = %table, account, "Account not present, skipping");
        }
    }

    Ok(rewrite.outcome)
}

/// Reassign the service account's UID in passwd.
pub fn reassign_uid(layout: &BootLayout, account: &str, uid: u32) -> BootResult<Reassignment> {
    tracing::info!("Changing uid of {} to {}", account, uid);
    reassign(&layout.passwd_file(), account, uid)
}

/// Reassign the service group's GID in group, then follow it in passwd.
///
/// Both tables are rewritten in memory before either is written, and passwd
/// goes first: a failed passwd write leaves group at the old GID so the next
/// start retries the whole change. When group already holds `gid`, the
/// account's own primary GID is still brought in line.
pub fn reassign_gid(layout: &BootLayout, group: &str, gid: u32) -> BootResult<Reassignment> {
    tracing::info!("Changing gid of {} to {}", group, gid);
    let group_file = layout.group_file();
    let group_table = group_file.display().to_string();
    let rewrite = rewrite_ids(&group_table, &read_table(&group_file)?, group, gid)?;

    let passwd = layout.passwd_file();
    let passwd_update = match &rewrite.outcome {
        Reassignment::Changed { previous } => {
            let content = read_table(&passwd)?;
            match propagate_primary_gid(&content, previous, gid) {
                Some(propagated) => align_primary_gid(&propagated, group, gid).or(Some(propagated)),
                None => align_primary_gid(&content, group, gid),
            }
        }
        Reassignment::Unchanged => align_primary_gid(&read_table(&passwd)?, group, gid),
        Reassignment::NotFound => None,
    };

    if let Some(updated) = passwd_update {
        tracing::info!(table = %passwd.display(), gid, "Updating primary group references");
        write_table(&passwd, &updated)?;
    }

    match &rewrite.outcome {
        Reassignment::Changed { previous } => {
            tracing::info!(
                table = %group_table,
                group,
                previous = %previous,
                gid,
                "Reassigning id"
            );
            write_table(&group_file, &rewrite.content)?;
        }
        Reassignment::Unchanged => {
            tracing::debug!(table = %group_table, group, gid, "Id already matches");
        }
        Reassignment::NotFound => {
            tracing::warn!(table = %group_table, group, "Account not present, skipping");
        }
    }

    Ok(rewrite.outcome)
}

/// Set the primary GID of `account` in passwd to `gid`.
///
/// Returns `None` when the account is absent or already points at `gid`.
pub fn align_primary_gid(content: &str, account: &str, gid: u32) -> Option<String> {
    let wanted = gid.to_string();
    let mut touched = false;
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_ending(line);
        let mut fields: Vec<&str> = body.split(':').collect();
        if is_passthrough(body)
            || fields.len() <= PRIMARY_GID_FIELD
            || fields[0] != account
            || fields[PRIMARY_GID_FIELD] == wanted
        {
            out.push_str(line);
            continue;
        }

        fields[PRIMARY_GID_FIELD] = &wanted;
        touched = true;
        out.push_str(&fields.join(":"));
        out.push_str(ending);
    }

    touched.then_some(out)
}

fn split_ending(line: &str) -> (&str, &str) {
    match line.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (line, ""),
    }
}

fn is_passthrough(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn read_table(path: &Path) -> BootResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| BootError::Identity(format!("Failed to read {}: {}", path.display(), e)))
}

fn write_table(path: &Path, content: &str) -> BootResult<()> {
    std::fs::write(path, content)
        .map_err(|e| BootError::Identity(format!("Failed to write {}: {}", path.display(), e)))
}
