//! Command handling for the `tidyfold` binary.
//!
//! Each command validates the target directory, builds its own [`RunLogger`]
//! and prints a final summary line. Directory-level problems come back as
//! errors; per-file problems are reported and turn into [`RunStatus::Failed`].

use crate::config::Config;
use crate::error::OrganizeResult;
use crate::history::{ActionSelector, HistoryStore};
use crate::logging::RunLogger;
use crate::organizer::{Organizer, ensure_directory};
use crate::output::{OutputFormatter, plural};
use crate::undo::UndoEngine;
use std::path::Path;
use std::process::ExitCode;

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Organize files in a directory.
    Organize {
        /// If true, simulate the operation without making changes.
        dry_run: bool,
    },
    /// Undo the latest or a specific organize action.
    Undo { action: ActionSelector },
    /// List recorded organize actions.
    History,
}

/// Whether every file-level operation of a command succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// At least one file could not be moved or restored.
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::from(1),
        }
    }
}

/// Runs a command against `dir_path` using the default configuration lookup.
///
/// ```no_run
/// use tidyfold::cli::{OrganizeCommand, run_cli};
/// use std::path::Path;
///
/// match run_cli(OrganizeCommand::Organize { dry_run: true }, Path::new("/path/to/directory")) {
///     Ok(status) => println!("finished: {:?}", status),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> OrganizeResult<RunStatus> {
    run_cli_with_config(command, dir_path, None)
}

/// Runs a command with an optional configuration file.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> OrganizeResult<RunStatus> {
    match command {
        OrganizeCommand::Organize { dry_run } => {
            let config = Config::load(config_path)?;
            organize_directory(dir_path, dry_run, &config)
        }
        OrganizeCommand::Undo { action } => undo_organization(dir_path, action),
        OrganizeCommand::History => show_history(dir_path),
    }
}

fn organize_directory(base_path: &Path, dry_run: bool, config: &Config) -> OrganizeResult<RunStatus> {
    let organizer = Organizer::from_config(config)?;
    let directory = ensure_directory(base_path)?;

    let mut log = if dry_run {
        RunLogger::console()
    } else {
        RunLogger::with_file(&HistoryStore::for_directory(&directory).log_path())?
    };

    let report = organizer.organize(&directory, dry_run, &mut log)?;

    if report.moved() == 0 && report.failures.is_empty() {
        OutputFormatter::info("No files found to organize.");
        return Ok(RunStatus::Success);
    }

    if report.moved() > 0 {
        OutputFormatter::summary_table(&report.category_counts(), report.moved());
    }

    for failure in &report.failures {
        log.error(format!("{}: {}", failure.path.display(), failure.error));
    }

    let summary = format!(
        "{} {} {}, {} failed",
        report.moved(),
        plural(report.moved(), "file", "files"),
        if dry_run { "would be moved" } else { "moved" },
        report.failures.len()
    );

    if dry_run {
        OutputFormatter::dry_run_notice(&summary);
        OutputFormatter::plain(&format!(
            "Run 'tidyfold organize {}' to apply.",
            base_path.display()
        ));
    } else if report.is_success() {
        log.success(&summary);
        OutputFormatter::plain(&format!(
            "Use 'tidyfold undo {}' to revert (action {}).",
            base_path.display(),
            report.action.id
        ));
    } else {
        log.warn(&summary);
    }

    Ok(if report.is_success() {
        RunStatus::Success
    } else {
        RunStatus::Failed
    })
}

fn undo_organization(base_path: &Path, action: ActionSelector) -> OrganizeResult<RunStatus> {
    let directory = ensure_directory(base_path)?;
    let mut log = RunLogger::with_file(&HistoryStore::for_directory(&directory).log_path())?;

    let report = UndoEngine::undo(&directory, action, &mut log)?;

    for (record, reason) in &report.conflicts {
        OutputFormatter::plain(&format!(
            "    - {} left in place: {}",
            record.destination_path.display(),
            reason
        ));
    }
    for (record, reason) in &report.failed {
        OutputFormatter::plain(&format!(
            "    - {}: {}",
            record.destination_path.display(),
            reason
        ));
    }

    if let Some(reason) = &report.mark_error {
        OutputFormatter::plain(&format!(
            "    - action {} is still listed as active: {}",
            report.action_id, reason
        ));
    }

    let summary = format!(
        "{} restored, {} conflicts, {} missing, {} failed",
        report.restored_files(),
        report.conflicts.len(),
        report.missing.len(),
        report.failed.len()
    );

    if report.is_complete_success() {
        log.success(&summary);
        Ok(RunStatus::Success)
    } else {
        log.warn(&summary);
        Ok(RunStatus::Failed)
    }
}

fn show_history(base_path: &Path) -> OrganizeResult<RunStatus> {
    let directory = ensure_directory(base_path)?;
    let store = HistoryStore::for_directory(&directory);

    let mut shown = 0;
    let mut unreadable = 0;
    for entry in store.list()? {
        if shown == 0 && unreadable == 0 {
            OutputFormatter::header(&format!("History for {}", directory.display()));
        }
        match entry {
            Ok(header) => {
                OutputFormatter::history_line(&header);
                shown += 1;
            }
            Err(e) => {
                OutputFormatter::warning(&e.to_string());
                unreadable += 1;
            }
        }
    }

    if shown == 0 && unreadable == 0 {
        OutputFormatter::info("No history found.");
    } else {
        OutputFormatter::plain(&format!(
            "{} {}, {} unreadable",
            shown,
            plural(shown, "action", "actions"),
            unreadable
        ));
    }

    Ok(if unreadable == 0 {
        RunStatus::Success
    } else {
        RunStatus::Failed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_history_on_fresh_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let status = run_cli(OrganizeCommand::History, temp_dir.path()).unwrap();

        assert_eq!(status, RunStatus::Success);
        assert!(!HistoryStore::for_directory(temp_dir.path()).root().exists());
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = temp_dir.path().join("config.toml");
        fs::write(&config, "[filters.exclude]\nregex = [\"(\"]\n").unwrap();

        let result = run_cli_with_config(
            OrganizeCommand::Organize { dry_run: false },
            temp_dir.path(),
            Some(&config),
        );
        assert!(result.is_err());
    }
}
