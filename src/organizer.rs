//! Directory scan, classification and move, producing one history record.

use crate::config::{CompiledFilters, Config, ConfigError};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::{Category, Classifier};
use crate::history::{ActionHistory, HistoryStore, STORAGE_DIR_NAME};
use crate::logging::RunLogger;
use crate::mover::{MoveRecord, Mover};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A top-level file picked up by the scan.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
    pub category: Category,
    /// Extension detected from the file's content, when it had none.
    pub sniffed_extension: Option<&'static str>,
}

/// A file that could not be moved.
#[derive(Debug)]
pub struct MoveFailure {
    pub path: PathBuf,
    pub error: OrganizeError,
}

/// Outcome of one organize run.
#[derive(Debug)]
pub struct OrganizeReport {
    /// The moves performed, or that would be performed on a dry run.
    pub action: ActionHistory,
    pub failures: Vec<MoveFailure>,
    /// Whether the action was written to the history store.
    pub recorded: bool,
}

impl OrganizeReport {
    pub fn moved(&self) -> usize {
        self.action.moves.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of moves per category folder.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.action.moves {
            let folder = record
                .destination_path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            *counts.entry(folder).or_insert(0) += 1;
        }
        counts
    }
}

/// Resolves `directory` to an absolute path, failing if it is not a directory.
pub fn ensure_directory(directory: &Path) -> OrganizeResult<PathBuf> {
    let canonical = fs::canonicalize(directory).map_err(|e| match e.kind() {
        ErrorKind::NotFound => OrganizeError::DirectoryNotFound(directory.to_path_buf()),
        _ => OrganizeError::io(directory, e),
    })?;

    if !canonical.is_dir() {
        return Err(OrganizeError::DirectoryNotFound(directory.to_path_buf()));
    }
    Ok(canonical)
}

/// Sorts the top level of a directory into category folders.
#[derive(Debug, Clone, Default)]
pub struct Organizer {
    classifier: Classifier,
    filters: CompiledFilters,
}

impl Organizer {
    pub fn new(classifier: Classifier, filters: CompiledFilters) -> Self {
        Self {
            classifier,
            filters,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.classifier.build(),
            config.compile_filters()?,
        ))
    }

    /// Organizes `directory`.
    ///
    /// Only regular files directly inside `directory` are considered, so files
    /// already sitting in category folders are never moved again. A dry run
    /// computes the same destinations without writing anything and returns a
    /// simulated, unrecorded action.
    pub fn organize(
        &self,
        directory: &Path,
        dry_run: bool,
        log: &mut RunLogger,
    ) -> OrganizeResult<OrganizeReport> {
        let directory = ensure_directory(directory)?;
        let store = HistoryStore::for_directory(&directory);
        let candidates = self.scan(&directory, &store)?;
        let id = store.next_id()?;

        if dry_run {
            log.info(format!("Analyzing {}", directory.display()));
        } else {
            log.info(format!(
                "Organizing {} ({} files, action {})",
                directory.display(),
                candidates.len(),
                id
            ));
        }

        let mut moves = Vec::with_capacity(candidates.len());
        let mut created_dirs: Vec<PathBuf> = Vec::new();
        let mut planned = HashSet::new();
        let mut failures = Vec::new();
        log.start_progress(candidates.len());

        for candidate in &candidates {
            let destination_dir = directory.join(candidate.category.dir_name());
            let is_new_dir = !created_dirs.contains(&destination_dir)
                && fs::symlink_metadata(&destination_dir).is_err();
            let detected = candidate
                .sniffed_extension
                .map(|ext| format!(" [detected {}]", ext))
                .unwrap_or_default();

            if dry_run {
                match Mover::destination_for(&candidate.path, &destination_dir, &planned) {
                    Ok(destination) => {
                        log.info(format!(
                            "Would move {}{} -> {}",
                            candidate.name,
                            detected,
                            relative(&directory, &destination).display()
                        ));
                        if is_new_dir {
                            created_dirs.push(destination_dir);
                        }
                        planned.insert(destination.clone());
                        moves.push(MoveRecord::new(candidate.path.clone(), destination));
                    }
                    Err(error) => failures.push(MoveFailure {
                        path: candidate.path.clone(),
                        error,
                    }),
                }
                log.advance();
                continue;
            }

            match Mover::move_into(&candidate.path, &destination_dir) {
                Ok(record) => {
                    log.success(format!(
                        "Moved {}{} -> {}",
                        candidate.name,
                        detected,
                        relative(&directory, &record.destination_path).display()
                    ));
                    if is_new_dir {
                        created_dirs.push(destination_dir);
                    }
                    moves.push(record);
                }
                Err(error) => {
                    log.error(format!("Failed to move {}: {}", candidate.name, error));
                    failures.push(MoveFailure {
                        path: candidate.path.clone(),
                        error,
                    });
                }
            }
            log.advance();
        }
        log.finish_progress();

        let action = ActionHistory {
            id,
            created_at: Utc::now(),
            directory: directory.clone(),
            moves,
            created_dirs,
            simulated: dry_run,
            reversed: false,
        };

        let recorded = !dry_run && !action.moves.is_empty();
        if recorded {
            store.append(&action)?;
            log.info(format!(
                "Recorded action {} with {} moves",
                action.id,
                action.moves.len()
            ));
        }

        Ok(OrganizeReport {
            action,
            failures,
            recorded,
        })
    }

    /// Lists the files an organize run would pick up, in name order.
    pub fn scan(&self, directory: &Path, store: &HistoryStore) -> OrganizeResult<Vec<Candidate>> {
        let entries = fs::read_dir(directory).map_err(|e| OrganizeError::io(directory, e))?;

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.starts_with(store.root()) || entry.file_name() == STORAGE_DIR_NAME {
                continue;
            }

            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.filters.should_include(Path::new(&name)) {
                continue;
            }

            let (category, sniffed_extension) = self.classify(&name, &path);
            candidates.push(Candidate {
                name,
                path,
                category,
                sniffed_extension,
            });
        }

        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(candidates)
    }

    // Extension first; content sniffing only for files without an extension.
    fn classify(&self, name: &str, path: &Path) -> (Category, Option<&'static str>) {
        if Path::new(name).extension().is_some() {
            return (self.classifier.classify(name), None);
        }

        match infer::get_from_path(path) {
            Ok(Some(kind)) => (
                self.classifier.classify(kind.extension()),
                Some(kind.extension()),
            ),
            _ => (self.classifier.classify(name), None),
        }
    }
}

fn relative<'a>(base: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}
