//! Error types shared by the organizer, the history store and the undo engine.

use crate::config::ConfigError;
use crate::history::{ActionId, ActionSelector};
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`OrganizeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file or directory could not be read, written or moved.
    Io,
    /// The path a file should be restored to is occupied by another file.
    Conflict,
    /// A directory, file or history record does not exist.
    NotFound,
    /// A history record exists but cannot be parsed.
    InvalidHistory,
    /// The configuration could not be loaded or compiled.
    Config,
}

/// Errors that can occur while organizing, recording or undoing.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is occupied by another file", path.display())]
    Conflict { path: PathBuf },

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{}", describe_missing_action(.0))]
    ActionNotFound(ActionSelector),

    #[error("Action {0} has already been undone")]
    AlreadyReversed(ActionId),

    #[error("Invalid history record {}: {reason}", path.display())]
    InvalidHistory { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrganizeError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps this error onto the Io / Conflict / NotFound taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::DirectoryNotFound(_)
            | Self::FileNotFound(_)
            | Self::ActionNotFound(_)
            | Self::AlreadyReversed(_) => ErrorKind::NotFound,
            Self::InvalidHistory { .. } => ErrorKind::InvalidHistory,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

fn describe_missing_action(selector: &ActionSelector) -> String {
    match selector {
        ActionSelector::Latest => "No organize action left to undo".to_string(),
        ActionSelector::Id(id) => format!("Action {} not found", id),
    }
}

/// Result type for organize, history and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
