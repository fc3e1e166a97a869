//! Reversal of recorded organize actions.
//!
//! Undo is best-effort: every move in the action is attempted, newest first,
//! and the outcome of each one is collected into an [`UndoReport`]. Nothing
//! that appeared at an original path after organizing is ever overwritten.

use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::Category;
use crate::history::{ActionId, ActionSelector, HistoryStore};
use crate::logging::RunLogger;
use crate::mover::{MoveRecord, Mover};
use crate::organizer::ensure_directory;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// The action that was undone.
    pub action_id: ActionId,
    /// Moves reversed successfully.
    pub restored: Vec<MoveRecord>,
    /// Moves whose original path is now taken by another file.
    pub conflicts: Vec<(MoveRecord, String)>,
    /// Moves whose file is no longer where it was put.
    pub missing: Vec<MoveRecord>,
    /// Moves that failed for any other reason.
    pub failed: Vec<(MoveRecord, String)>,
    /// Whether the action was marked as undone.
    pub marked_reversed: bool,
    /// Why marking the action as undone failed, after files were restored.
    pub mark_error: Option<String>,
}

impl UndoReport {
    fn new(action_id: ActionId) -> Self {
        Self {
            action_id,
            restored: Vec::new(),
            conflicts: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
            marked_reversed: false,
            mark_error: None,
        }
    }

    pub fn restored_files(&self) -> usize {
        self.restored.len()
    }

    /// Number of moves that could not be reversed.
    pub fn failure_count(&self) -> usize {
        self.conflicts.len() + self.missing.len() + self.failed.len()
    }

    /// True when every move in the action was reversed and the action is
    /// marked as undone.
    pub fn is_complete_success(&self) -> bool {
        self.failure_count() == 0 && self.mark_error.is_none()
    }
}

/// Reverses organize actions recorded in a directory's history.
pub struct UndoEngine;

impl UndoEngine {
    /// Undoes an action in `directory`: the newest one still active, or the
    /// one named by `selector`.
    ///
    /// The action is marked reversed once at least one file went back. If
    /// nothing could be restored it stays active so the undo can be retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidyfold::history::ActionSelector;
    /// use tidyfold::logging::RunLogger;
    /// use tidyfold::undo::UndoEngine;
    /// use std::path::Path;
    ///
    /// let mut log = RunLogger::console();
    /// let report = UndoEngine::undo(Path::new("/home/me/Downloads"), ActionSelector::Latest, &mut log)?;
    /// println!("Restored {} files", report.restored_files());
    /// # Ok::<(), tidyfold::OrganizeError>(())
    /// ```
    pub fn undo(
        directory: &Path,
        selector: ActionSelector,
        log: &mut RunLogger,
    ) -> OrganizeResult<UndoReport> {
        let directory = ensure_directory(directory)?;
        let store = HistoryStore::for_directory(&directory);

        let action = store.load(selector)?;
        if action.reversed {
            return Err(OrganizeError::AlreadyReversed(action.id));
        }

        log.info(format!(
            "Undoing action {} from {} ({} moves)",
            action.id,
            action.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            action.moves.len()
        ));

        let mut report = UndoReport::new(action.id);
        log.start_progress(action.moves.len());

        for record in action.moves.iter().rev() {
            match Mover::restore(record) {
                Ok(()) => {
                    log.success(format!(
                        "Restored {} -> {}",
                        record.destination_path.display(),
                        record.source_path.display()
                    ));
                    report.restored.push(record.clone());
                }
                Err(OrganizeError::FileNotFound(path)) => {
                    log.warn(format!("Missing {}, skipped", path.display()));
                    report.missing.push(record.clone());
                }
                Err(e @ OrganizeError::Conflict { .. }) => {
                    log.warn(format!("Conflict: {}", e));
                    report.conflicts.push((record.clone(), e.to_string()));
                }
                Err(e) => {
                    log.error(format!(
                        "Failed to restore {}: {}",
                        record.destination_path.display(),
                        e
                    ));
                    report.failed.push((record.clone(), e.to_string()));
                }
            }
            log.advance();
        }
        log.finish_progress();

        remove_emptied_dirs(&directory, &action.created_dirs);

        if report.restored.is_empty() {
            log.warn(format!(
                "Nothing restored; action {} is kept for another attempt",
                action.id
            ));
        } else {
            match store.mark_reversed(action.id) {
                Ok(()) => {
                    report.marked_reversed = true;
                    log.info(format!("Marked action {} as undone", action.id));
                }
                Err(e) => {
                    log.error(format!(
                        "Files restored, but action {} could not be marked as undone: {}",
                        action.id, e
                    ));
                    report.mark_error = Some(e.to_string());
                }
            }
        }

        Ok(report)
    }
}

// Only folders the action itself created, directly under `directory`, and
// only once they are empty.
fn remove_emptied_dirs(directory: &Path, created_dirs: &[PathBuf]) {
    let folders: BTreeSet<&Path> = created_dirs
        .iter()
        .map(PathBuf::as_path)
        .filter(|folder| folder.parent() == Some(directory))
        .filter(|folder| {
            folder
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(Category::from_dir_name)
                .is_some()
        })
        .collect();

    for folder in folders {
        // Fails harmlessly when the folder still has files in it.
        let _ = fs::remove_dir(folder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ActionHistory;
    use crate::organizer::Organizer;
    use tempfile::TempDir;

    fn organize(dir: &Path) -> ActionId {
        Organizer::default()
            .organize(dir, false, &mut RunLogger::quiet())
            .expect("organize failed")
            .action
            .id
    }

    fn undo(dir: &Path, selector: ActionSelector) -> OrganizeResult<UndoReport> {
        UndoEngine::undo(dir, selector, &mut RunLogger::quiet())
    }

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = undo(temp_dir.path(), ActionSelector::Latest);
        assert!(matches!(result, Err(OrganizeError::ActionNotFound(_))));
    }

    #[test]
    fn test_undo_restores_files_and_removes_empty_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("image.png"), "image data").unwrap();
        fs::write(dir.join("document.pdf"), "pdf data").unwrap();
        organize(dir);

        let report = undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert_eq!(report.restored_files(), 2);
        assert!(report.is_complete_success());
        assert!(report.marked_reversed);
        assert!(dir.join("image.png").exists());
        assert!(dir.join("document.pdf").exists());
        assert!(!dir.join("Images").exists());
        assert!(!dir.join("Documents").exists());
    }

    #[test]
    fn test_undo_keeps_folder_with_other_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), "a").unwrap();
        organize(dir);
        fs::write(dir.join("Documents").join("added-later.txt"), "b").unwrap();

        undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert!(dir.join("a.txt").exists());
        assert!(dir.join("Documents").join("added-later.txt").exists());
    }

    #[test]
    fn test_undo_keeps_folder_that_existed_before() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::create_dir(dir.join("Images")).unwrap();
        fs::write(dir.join("photo.png"), "png").unwrap();
        fs::write(dir.join("notes.txt"), "txt").unwrap();
        organize(dir);

        undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert!(dir.join("photo.png").exists());
        assert!(dir.join("Images").is_dir());
        assert!(!dir.join("Documents").exists());
    }

    #[test]
    fn test_undo_other_io_error_goes_to_failed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = ensure_directory(temp_dir.path()).unwrap();
        fs::create_dir(dir.join("Documents")).unwrap();
        fs::write(dir.join("Documents").join("x.txt"), "x").unwrap();
        // A plain file where the original parent folder should be.
        fs::write(dir.join("blocker"), "not a folder").unwrap();

        let store = HistoryStore::for_directory(&dir);
        store
            .append(&ActionHistory {
                id: ActionId::new(1),
                created_at: chrono::Utc::now(),
                directory: dir.clone(),
                moves: vec![MoveRecord::new(
                    dir.join("blocker").join("x.txt"),
                    dir.join("Documents").join("x.txt"),
                )],
                created_dirs: Vec::new(),
                simulated: false,
                reversed: false,
            })
            .unwrap();

        let report = undo(&dir, ActionSelector::Latest).expect("Undo failed");

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.restored_files(), 0);
        assert!(!report.marked_reversed);
        assert!(dir.join("Documents").join("x.txt").exists());
    }

    #[test]
    fn test_mark_failure_keeps_report() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), "a").unwrap();
        let id = organize(dir);
        // A folder squatting on the reversed record name makes the rename fail.
        let store = HistoryStore::for_directory(&ensure_directory(dir).unwrap());
        fs::create_dir(store.root().join(format!("action-{:06}.reversed.json", id.get()))).unwrap();

        let report = undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert_eq!(report.restored_files(), 1);
        assert!(!report.marked_reversed);
        assert!(report.mark_error.is_some());
        assert!(!report.is_complete_success());
        assert!(dir.join("a.txt").exists());
    }

    #[test]
    fn test_undo_with_conflict_keeps_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("test.txt"), "original content").unwrap();
        organize(dir);
        fs::write(dir.join("test.txt"), "new content").unwrap();

        let report = undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert_eq!(report.restored_files(), 0);
        assert_eq!(report.conflicts.len(), 1);
        assert!(!report.marked_reversed);
        assert_eq!(fs::read_to_string(dir.join("test.txt")).unwrap(), "new content");
        assert_eq!(
            fs::read_to_string(dir.join("Documents").join("test.txt")).unwrap(),
            "original content"
        );

        // Still the latest active action, so the user can retry.
        let store = HistoryStore::for_directory(&ensure_directory(dir).unwrap());
        assert!(!store.load(ActionSelector::Latest).unwrap().reversed);
    }

    #[test]
    fn test_partial_failure_marks_reversed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.join(name), name).unwrap();
        }
        organize(dir);
        fs::remove_file(dir.join("Documents").join("b.txt")).unwrap();

        let report = undo(dir, ActionSelector::Latest).expect("Undo failed");

        assert_eq!(report.restored_files(), 2);
        assert_eq!(report.missing.len(), 1);
        assert!(report.missing[0].destination_path.ends_with("b.txt"));
        assert!(report.marked_reversed);
        assert!(!report.is_complete_success());
        assert!(matches!(
            undo(dir, ActionSelector::Latest),
            Err(OrganizeError::ActionNotFound(_))
        ));
    }

    #[test]
    fn test_undo_specific_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("first.txt"), "1").unwrap();
        let first = organize(dir);
        fs::write(dir.join("second.png"), "2").unwrap();
        let second = organize(dir);

        let report = undo(dir, ActionSelector::Id(first)).expect("Undo failed");

        assert_eq!(report.action_id, first);
        assert!(dir.join("first.txt").exists());
        assert!(dir.join("Images").join("second.png").exists());

        let latest = undo(dir, ActionSelector::Latest).expect("Undo failed");
        assert_eq!(latest.action_id, second);
        assert!(dir.join("second.png").exists());
    }

    #[test]
    fn test_undo_already_reversed_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), "a").unwrap();
        let id = organize(dir);
        undo(dir, ActionSelector::Latest).expect("Undo failed");

        let again = undo(dir, ActionSelector::Id(id));
        assert!(matches!(again, Err(OrganizeError::AlreadyReversed(_))));
    }

    #[test]
    fn test_undo_invalid_base_path() {
        let result = undo(Path::new("/non/existent/path"), ActionSelector::Latest);
        assert!(matches!(result, Err(OrganizeError::DirectoryNotFound(_))));
    }
}
