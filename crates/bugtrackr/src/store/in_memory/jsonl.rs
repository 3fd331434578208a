//! JSONL persistence for the in-memory store.
//!
//! The data directory holds one file per collection:
//!
//! - `bugs.jsonl`: one bug per line
//! - `users.jsonl`: one roster entry per line
//! - `preferences.jsonl`: one preferences document per line, with its `uid`
//!
//! Loading is resilient: malformed lines and unusable records are skipped
//! and reported as [`LoadWarning`]s, and legacy bug records are migrated.
//! Saving writes each file to a temporary sibling and renames it into place.

use super::inner::InMemoryStoreInner;
use super::wrap;
use crate::domain::{BugId, Migration, Preferences, RosterEntry, StoredBug, UserId};
use crate::error::Result;
use crate::store::DocumentStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// File holding the `bugs` collection
pub const BUGS_FILE: &str = "bugs.jsonl";

/// File holding the roster
pub const USERS_FILE: &str = "users.jsonl";

/// File holding the `userPreferences` collection
pub const PREFERENCES_FILE: &str = "preferences.jsonl";

/// Non-fatal problems found while loading.
///
/// Loading continues past every one of these; the affected line is skipped
/// (or, for [`Migrated`](Self::Migrated), rewritten in memory and written
/// back in canonical form on the next save).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that isn't valid JSON for its collection
    MalformedJson {
        /// File the line came from
        file: &'static str,
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Bug record that parsed but can't be used
    InvalidBug {
        /// ID of the rejected record
        bug_id: BugId,
        /// 1-based line number
        line_number: usize,
        /// Why it was rejected
        error: String,
    },

    /// Bug record normalized from an older shape
    Migrated {
        /// ID of the migrated record
        bug_id: BugId,
        /// 1-based line number
        line_number: usize,
        /// What was rewritten
        migration: Migration,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson {
                file,
                line_number,
                error,
            } => write!(f, "{file}:{line_number}: skipped malformed line: {error}"),
            Self::InvalidBug {
                bug_id,
                line_number,
                error,
            } => write!(
                f,
                "{BUGS_FILE}:{line_number}: skipped bug {bug_id}: {error}"
            ),
            Self::Migrated {
                bug_id,
                line_number,
                migration,
            } => match migration {
                Migration::Status { from, to } => write!(
                    f,
                    "{BUGS_FILE}:{line_number}: bug {bug_id} status {from:?} migrated to {to}"
                ),
                Migration::AssigneeDefaulted => write!(
                    f,
                    "{BUGS_FILE}:{line_number}: bug {bug_id} had no assignee, assigned to filer"
                ),
                Migration::CreatedAtBackfilled => write!(
                    f,
                    "{BUGS_FILE}:{line_number}: bug {bug_id} had no createdAt, backfilled"
                ),
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PreferencesRecord {
    uid: UserId,
    #[serde(flatten)]
    preferences: Preferences,
}

/// Load a store from a data directory.
///
/// Missing files are treated as empty collections, so a fresh directory
/// yields an empty store.
///
/// # Errors
///
/// Returns an error only for I/O failures; bad content becomes warnings.
pub async fn load_from_jsonl(
    dir: &Path,
    prefix: impl Into<String>,
) -> Result<(Arc<dyn DocumentStore>, Vec<LoadWarning>)> {
    let prefix = prefix.into();
    let (inner, warnings) = load_inner(dir, &prefix).await?;
    Ok((Arc::new(wrap(inner)), warnings))
}

pub(crate) async fn load_inner(
    dir: &Path,
    prefix: &str,
) -> Result<(InMemoryStoreInner, Vec<LoadWarning>)> {
    let mut inner = InMemoryStoreInner::new(prefix);
    let mut warnings = Vec::new();
    let loaded_at = Utc::now();

    for (line_number, stored) in
        read_records::<StoredBug>(&dir.join(BUGS_FILE), BUGS_FILE, &mut warnings).await?
    {
        let bug_id = stored.id().clone();
        match stored.into_bug(loaded_at) {
            Ok((bug, migrations)) => {
                if bug.title.trim().is_empty() {
                    warnings.push(LoadWarning::InvalidBug {
                        bug_id,
                        line_number,
                        error: "title is empty".to_string(),
                    });
                    continue;
                }
                warnings.extend(migrations.into_iter().map(|migration| {
                    LoadWarning::Migrated {
                        bug_id: bug_id.clone(),
                        line_number,
                        migration,
                    }
                }));
                inner.insert_bug(bug);
            }
            Err(error) => warnings.push(LoadWarning::InvalidBug {
                bug_id,
                line_number,
                error,
            }),
        }
    }

    for (_, entry) in
        read_records::<RosterEntry>(&dir.join(USERS_FILE), USERS_FILE, &mut warnings).await?
    {
        inner.users.insert(entry.uid.clone(), entry);
    }

    for (_, record) in read_records::<PreferencesRecord>(
        &dir.join(PREFERENCES_FILE),
        PREFERENCES_FILE,
        &mut warnings,
    )
    .await?
    {
        inner.preferences.insert(record.uid, record.preferences);
    }

    Ok((inner, warnings))
}

async fn read_records<T: DeserializeOwned>(
    path: &Path,
    file: &'static str,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<(usize, T)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path).await?);
    let mut lines = reader.lines();
    let mut records = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push((line_number, record)),
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                file,
                line_number,
                error: e.to_string(),
            }),
        }
    }

    Ok(records)
}

/// Save every collection of `store` to `dir`, creating it if needed.
///
/// Each file is written to a `.tmp` sibling first and renamed into place, so
/// a crash mid-write leaves the previous file intact.
///
/// # Errors
///
/// Returns an error on I/O or serialization failure.
pub async fn save_to_jsonl(store: &dyn DocumentStore, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await?;

    let bugs = store.export_bugs().await?;
    write_records(&dir.join(BUGS_FILE), &bugs).await?;

    let roster = store.list_roster().await?;
    write_records(&dir.join(USERS_FILE), &roster).await?;

    let preferences: Vec<PreferencesRecord> = store
        .export_preferences()
        .await?
        .into_iter()
        .map(|(uid, preferences)| PreferencesRecord { uid, preferences })
        .collect();
    write_records(&dir.join(PREFERENCES_FILE), &preferences).await?;

    Ok(())
}

async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let temp_path = path.with_extension("jsonl.tmp");
    let mut writer = BufWriter::new(File::create(&temp_path).await?);

    for record in records {
        let json = serde_json::to_string(record)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    drop(writer);

    fs::rename(&temp_path, path).await?;
    Ok(())
}
