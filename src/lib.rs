//! tidyfold - sort a directory's files into category folders, and take it back.
//!
//! Every organize run is recorded as an action in a small append-only ledger
//! inside the directory, so any run can be listed and reversed later, even
//! after the directory has changed in between.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod history;
pub mod logging;
pub mod mover;
pub mod organizer;
pub mod output;
pub mod undo;

pub use config::{CompiledFilters, Config, ConfigError};
pub use error::{ErrorKind, OrganizeError, OrganizeResult};
pub use file_category::{Category, Classifier};
pub use history::{ActionHeader, ActionHistory, ActionId, ActionSelector, HistoryStore};
pub use mover::{MoveRecord, Mover};
pub use organizer::{OrganizeReport, Organizer};
pub use undo::{UndoEngine, UndoReport};

pub use cli::{OrganizeCommand, RunStatus, run_cli, run_cli_with_config};
