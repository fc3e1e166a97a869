//! Single-file relocation with a rename-on-collision policy, and its reverse.
//!
//! Moving into a folder never overwrites: a taken name gets the lowest free
//! ` (n)` suffix. Restoring a file to where it came from does the opposite and
//! refuses to touch an occupied path.

use crate::error::{OrganizeError, OrganizeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One file's relocation within an organize action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before the move.
    pub source_path: PathBuf,
    /// Where the file was moved to.
    pub destination_path: PathBuf,
    /// When the move happened.
    pub timestamp: DateTime<Utc>,
}

impl MoveRecord {
    pub fn new(source_path: PathBuf, destination_path: PathBuf) -> Self {
        Self {
            source_path,
            destination_path,
            timestamp: Utc::now(),
        }
    }
}

/// Performs the filesystem side of organizing and undoing.
pub struct Mover;

impl Mover {
    /// Computes where `source` would land inside `destination_dir`, without
    /// touching the filesystem.
    ///
    /// Paths in `planned` count as taken, so a dry run can reserve the names
    /// earlier files would have claimed.
    pub fn destination_for(
        source: &Path,
        destination_dir: &Path,
        planned: &HashSet<PathBuf>,
    ) -> OrganizeResult<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            OrganizeError::io(
                source,
                std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

        Ok(unique_path_with(&destination_dir.join(file_name), |path| {
            planned.contains(path) || exists_no_follow(path)
        }))
    }

    /// Moves `source` into `destination_dir`, creating the folder if needed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidyfold::mover::Mover;
    /// use std::path::Path;
    ///
    /// let record = Mover::move_into(
    ///     Path::new("/home/me/Downloads/a.txt"),
    ///     Path::new("/home/me/Downloads/Documents"),
    /// )?;
    /// println!("now at {}", record.destination_path.display());
    /// # Ok::<(), tidyfold::OrganizeError>(())
    /// ```
    pub fn move_into(source: &Path, destination_dir: &Path) -> OrganizeResult<MoveRecord> {
        let metadata = fs::metadata(source).map_err(|e| OrganizeError::io(source, e))?;
        if !metadata.is_file() {
            return Err(OrganizeError::io(
                source,
                std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        fs::create_dir_all(destination_dir).map_err(|e| OrganizeError::io(destination_dir, e))?;

        let destination = Self::destination_for(source, destination_dir, &HashSet::new())?;
        fs::rename(source, &destination).map_err(|e| OrganizeError::io(source, e))?;

        Ok(MoveRecord::new(source.to_path_buf(), destination))
    }

    /// Moves a file back from `destination_path` to `source_path`.
    ///
    /// Fails with [`OrganizeError::FileNotFound`] when the moved file is gone,
    /// and with [`OrganizeError::Conflict`] when something now sits at the
    /// original path.
    pub fn restore(record: &MoveRecord) -> OrganizeResult<()> {
        if !path_is_taken(&record.destination_path)? {
            return Err(OrganizeError::FileNotFound(record.destination_path.clone()));
        }

        if path_is_taken(&record.source_path)? {
            return Err(OrganizeError::Conflict {
                path: record.source_path.clone(),
            });
        }

        if let Some(parent) = record.source_path.parent() {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::io(parent, e))?;
        }

        fs::rename(&record.destination_path, &record.source_path)
            .map_err(|e| OrganizeError::io(&record.destination_path, e))
    }
}

/// Returns `candidate` if it is free, otherwise the first free
/// `stem (n).ext` next to it, counting from 1.
///
/// ```
/// use tidyfold::mover::unique_path;
/// use std::path::Path;
///
/// let free = Path::new("/definitely/not/here/a.txt");
/// assert_eq!(unique_path(free), free);
/// ```
pub fn unique_path(candidate: &Path) -> PathBuf {
    unique_path_with(candidate, exists_no_follow)
}

/// Like [`unique_path`], with `is_taken` deciding which names are in use.
pub fn unique_path_with(candidate: &Path, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    if !is_taken(candidate) {
        return candidate.to_path_buf();
    }

    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    (1u64..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            parent.join(name)
        })
        .find(|path| !is_taken(path))
        .unwrap_or_else(|| candidate.to_path_buf())
}

// Broken symlinks count as taken.
fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn path_is_taken(path: &Path) -> OrganizeResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(OrganizeError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as Kind;
    use tempfile::TempDir;

    #[test]
    fn test_move_into_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let record = Mover::move_into(&file_path, &base_path.join("Documents"))
            .expect("Failed to move file");

        assert!(!file_path.exists());
        assert_eq!(record.source_path, file_path);
        assert_eq!(record.destination_path, base_path.join("Documents").join("test.txt"));
        assert_eq!(
            fs::read_to_string(&record.destination_path).unwrap(),
            "test content"
        );
    }

    #[test]
    fn test_collision_gets_lowest_free_suffix() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("Documents");
        fs::create_dir_all(base_path.join("one")).unwrap();
        fs::create_dir_all(base_path.join("two")).unwrap();
        fs::write(base_path.join("one").join("a.txt"), "first").unwrap();
        fs::write(base_path.join("two").join("a.txt"), "second").unwrap();

        let first = Mover::move_into(&base_path.join("one").join("a.txt"), &dest).unwrap();
        let second = Mover::move_into(&base_path.join("two").join("a.txt"), &dest).unwrap();

        assert_eq!(first.destination_path, dest.join("a.txt"));
        assert_eq!(second.destination_path, dest.join("a (1).txt"));
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "first");
        assert_eq!(fs::read_to_string(dest.join("a (1).txt")).unwrap(), "second");
    }

    #[test]
    fn test_unique_path_fills_gaps() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("README"), "").unwrap();
        fs::write(dir.join("README (2)"), "").unwrap();
        fs::write(dir.join("archive.tar.gz"), "").unwrap();

        assert_eq!(unique_path(&dir.join("README")), dir.join("README (1)"));
        assert_eq!(
            unique_path(&dir.join("archive.tar.gz")),
            dir.join("archive.tar (1).gz")
        );
        assert_eq!(unique_path(&dir.join("fresh.txt")), dir.join("fresh.txt"));
    }

    #[test]
    fn test_destination_for_does_not_write() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("song.mp3");
        fs::write(&file_path, "la").unwrap();

        let dest_dir = temp_dir.path().join("Audio");
        let dest = Mover::destination_for(&file_path, &dest_dir, &HashSet::new()).unwrap();

        assert_eq!(dest, dest_dir.join("song.mp3"));
        assert!(!dest_dir.exists());
        assert!(file_path.exists());
    }

    #[test]
    fn test_destination_for_skips_planned_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest_dir = temp_dir.path().join("Documents");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("a.txt"), "here").unwrap();
        let planned: HashSet<PathBuf> = [dest_dir.join("a (1).txt")].into_iter().collect();

        let dest = Mover::destination_for(Path::new("a.txt"), &dest_dir, &planned).unwrap();

        assert_eq!(dest, dest_dir.join("a (2).txt"));
    }

    #[test]
    fn test_move_missing_source_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = Mover::move_into(
            &temp_dir.path().join("ghost.txt"),
            &temp_dir.path().join("Documents"),
        );

        let err = result.unwrap_err();
        assert_eq!(err.kind(), Kind::Io);
        assert!(!temp_dir.path().join("Documents").exists());
    }

    #[test]
    fn test_restore_moves_file_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("photo.png");
        fs::write(&file_path, "png").unwrap();
        let record = Mover::move_into(&file_path, &temp_dir.path().join("Images")).unwrap();

        Mover::restore(&record).expect("restore failed");

        assert!(file_path.exists());
        assert!(!record.destination_path.exists());
    }

    #[test]
    fn test_restore_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("notes.txt");
        fs::write(&file_path, "organized").unwrap();
        let record = Mover::move_into(&file_path, &temp_dir.path().join("Documents")).unwrap();
        fs::write(&file_path, "newer").unwrap();

        let err = Mover::restore(&record).unwrap_err();

        assert_eq!(err.kind(), Kind::Conflict);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "newer");
        assert_eq!(
            fs::read_to_string(&record.destination_path).unwrap(),
            "organized"
        );
    }

    #[test]
    fn test_restore_reports_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let record = MoveRecord::new(
            temp_dir.path().join("gone.txt"),
            temp_dir.path().join("Documents").join("gone.txt"),
        );

        let err = Mover::restore(&record).unwrap_err();
        assert!(matches!(err, OrganizeError::FileNotFound(_)));
    }
}
