//! Append-only ledger of organize actions.
//!
//! Every organize run that moves at least one file is stored as its own JSON
//! record under the directory's hidden storage area:
//!
//! ```text
//! <dir>/.tidyfold/
//!     action-000001.reversed.json
//!     action-000002.json
//!     organizer.log
//! ```
//!
//! Records are written once and never edited. Undoing an action renames its
//! record with a `.reversed.json` suffix, which hides it from `latest` lookups
//! while keeping it in the listing.

use crate::error::{OrganizeError, OrganizeResult};
use crate::mover::MoveRecord;
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the hidden storage folder inside an organized directory.
pub const STORAGE_DIR_NAME: &str = ".tidyfold";

const LOG_FILE_NAME: &str = "organizer.log";
const RECORD_PREFIX: &str = "action-";
const ACTIVE_SUFFIX: &str = ".json";
const REVERSED_SUFFIX: &str = ".reversed.json";

/// Identifier of an organize action. Ids start at 1 and only grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(u64);

impl ActionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Which action to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSelector {
    /// The newest action that has not been undone.
    Latest,
    /// A specific action.
    Id(ActionId),
}

impl From<Option<ActionId>> for ActionSelector {
    fn from(id: Option<ActionId>) -> Self {
        id.map_or(Self::Latest, Self::Id)
    }
}

impl std::fmt::Display for ActionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}

/// The moves performed by one organize run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionHistory {
    pub id: ActionId,
    pub created_at: DateTime<Utc>,
    /// The organized directory.
    pub directory: PathBuf,
    /// Moves in the order they were performed.
    pub moves: Vec<MoveRecord>,
    /// Category folders that did not exist before this run.
    #[serde(default)]
    pub created_dirs: Vec<PathBuf>,
    /// Set for dry runs, which are never stored.
    #[serde(skip)]
    pub simulated: bool,
    /// Set when loaded from a record that has been undone.
    #[serde(skip)]
    pub reversed: bool,
}

/// Summary of a stored action, as produced by [`HistoryStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHeader {
    pub id: ActionId,
    pub created_at: DateTime<Utc>,
    pub move_count: usize,
    pub reversed: bool,
}

// Reads a record without materializing its move list.
#[derive(Deserialize)]
struct RecordHeader {
    id: ActionId,
    created_at: DateTime<Utc>,
    moves: Vec<IgnoredAny>,
}

#[derive(Debug, Clone)]
struct RecordFile {
    id: ActionId,
    path: PathBuf,
    reversed: bool,
}

/// File-backed history of organize actions for one directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    /// The store belonging to `directory`. Nothing is created until the
    /// first append.
    pub fn for_directory(directory: &Path) -> Self {
        Self {
            root: directory.join(STORAGE_DIR_NAME),
        }
    }

    /// The hidden storage folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The append-only run log kept next to the records.
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    /// The id the next appended action should use.
    pub fn next_id(&self) -> OrganizeResult<ActionId> {
        let Some(newest) = self.scan()?.into_iter().next() else {
            return Ok(ActionId::new(1));
        };
        newest.id.next().ok_or_else(|| OrganizeError::InvalidHistory {
            path: newest.path,
            reason: "no action ids left after this one".to_string(),
        })
    }

    /// Persists a new action. Fails if a record with the same id exists.
    pub fn append(&self, action: &ActionHistory) -> OrganizeResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| OrganizeError::io(&self.root, e))?;

        let reversed_path = self.record_path(action.id, true);
        if reversed_path.exists() {
            return Err(OrganizeError::io(
                reversed_path,
                std::io::Error::new(ErrorKind::AlreadyExists, "action id already used"),
            ));
        }

        let path = self.record_path(action.id, false);
        let json = serde_json::to_string_pretty(action).map_err(|e| {
            OrganizeError::io(&path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| OrganizeError::io(&path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(|e| OrganizeError::io(&path, e))
    }

    /// Lists stored actions, most recent first.
    ///
    /// Record files are only parsed as the iterator reaches them. Calling
    /// `list` again starts over from the newest record.
    pub fn list(&self) -> OrganizeResult<HistoryEntries> {
        Ok(HistoryEntries {
            files: self.scan()?.into_iter(),
        })
    }

    /// Loads an action by id, or the newest one that has not been undone.
    pub fn load(&self, selector: ActionSelector) -> OrganizeResult<ActionHistory> {
        let records = self.scan()?;
        let found = match selector {
            ActionSelector::Latest => records.into_iter().find(|r| !r.reversed),
            ActionSelector::Id(id) => records.into_iter().find(|r| r.id == id),
        };

        let record = found.ok_or(OrganizeError::ActionNotFound(selector))?;
        let mut action: ActionHistory = read_record(&record.path)?;
        action.reversed = record.reversed;
        Ok(action)
    }

    /// Marks an action as undone. Marking it twice is a no-op.
    pub fn mark_reversed(&self, id: ActionId) -> OrganizeResult<()> {
        let record = self
            .scan()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(OrganizeError::ActionNotFound(ActionSelector::Id(id)))?;
        if record.reversed {
            return Ok(());
        }

        let reversed_path = self.record_path(id, true);
        fs::rename(&record.path, &reversed_path).map_err(|e| OrganizeError::io(&record.path, e))
    }

    fn record_path(&self, id: ActionId, reversed: bool) -> PathBuf {
        let suffix = if reversed { REVERSED_SUFFIX } else { ACTIVE_SUFFIX };
        self.root
            .join(format!("{}{:06}{}", RECORD_PREFIX, id.get(), suffix))
    }

    // Record files sorted newest first.
    fn scan(&self) -> OrganizeResult<Vec<RecordFile>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OrganizeError::io(&self.root, e)),
        };

        let mut records: Vec<RecordFile> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                parse_record_name(&name).map(|(id, reversed)| RecordFile {
                    id,
                    path: entry.path(),
                    reversed,
                })
            })
            .collect();

        records.sort_by(|a, b| b.id.cmp(&a.id).then(b.reversed.cmp(&a.reversed)));
        records.dedup_by_key(|r| r.id);
        Ok(records)
    }
}

/// Lazy iterator over stored action headers, newest first.
#[derive(Debug)]
pub struct HistoryEntries {
    files: std::vec::IntoIter<RecordFile>,
}

impl Iterator for HistoryEntries {
    type Item = OrganizeResult<ActionHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.files.next()?;
        Some(read_record::<RecordHeader>(&record.path).map(|header| ActionHeader {
            id: header.id,
            created_at: header.created_at,
            move_count: header.moves.len(),
            reversed: record.reversed,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

fn parse_record_name(name: &str) -> Option<(ActionId, bool)> {
    let rest = name.strip_prefix(RECORD_PREFIX)?;
    let (digits, reversed) = match rest.strip_suffix(REVERSED_SUFFIX) {
        Some(digits) => (digits, true),
        None => (rest.strip_suffix(ACTIVE_SUFFIX)?, false),
    };
    digits.parse().ok().map(|id| (ActionId::new(id), reversed))
}

fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> OrganizeResult<T> {
    let content = fs::read_to_string(path).map_err(|e| OrganizeError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| OrganizeError::InvalidHistory {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
