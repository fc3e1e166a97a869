//! Per-invocation run log.
//!
//! A [`RunLogger`] is created by the command being run and handed down to the
//! organizer and undo engine. It echoes messages to the terminal and, for runs
//! that change the directory, appends them to `.tidyfold/organizer.log`.

use crate::error::{OrganizeError, OrganizeResult};
use crate::output::OutputFormatter;
use chrono::Local;
use indicatif::ProgressBar;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Log sink scoped to a single command invocation.
pub struct RunLogger {
    file: Option<File>,
    echo: bool,
    progress: Option<ProgressBar>,
}

impl RunLogger {
    /// Terminal output only.
    pub fn console() -> Self {
        Self {
            file: None,
            echo: true,
            progress: None,
        }
    }

    /// No output at all. Useful when driving the library from tests.
    pub fn quiet() -> Self {
        Self {
            file: None,
            echo: false,
            progress: None,
        }
    }

    /// Terminal output plus an append-only log file at `path`.
    pub fn with_file(path: &Path) -> OrganizeResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OrganizeError::io(path, e))?;

        Ok(Self {
            file: Some(file),
            echo: true,
            progress: None,
        })
    }

    /// Writes to the log file only, without echoing.
    pub fn silence(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.write(Level::Info, message);
        self.echo(|| OutputFormatter::plain(message));
    }

    /// Logged as INFO, shown with a checkmark.
    pub fn success(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.write(Level::Info, message);
        self.echo(|| OutputFormatter::success(message));
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.write(Level::Warn, message);
        self.echo(|| OutputFormatter::warning(message));
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.write(Level::Error, message);
        self.echo(|| OutputFormatter::error(message));
    }

    /// Starts a progress bar for `total` steps. Hidden when not echoing.
    pub fn start_progress(&mut self, total: usize) {
        let pb = if self.echo {
            OutputFormatter::create_progress_bar(total as u64)
        } else {
            ProgressBar::hidden()
        };
        self.progress = Some(pb);
    }

    pub fn advance(&mut self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    pub fn finish_progress(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }

    fn write(&mut self, level: Level, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let line = format!(
            "{} [{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level.as_str(),
            message
        );
        if let Err(e) = file.write_all(line.as_bytes()) {
            self.file = None;
            self.echo(|| {
                OutputFormatter::warning(&format!("Log file disabled after write error: {}", e))
            });
        }
    }

    // Keeps the progress bar from tearing when printing.
    fn echo(&self, print: impl FnOnce()) {
        if !self.echo {
            return;
        }
        match &self.progress {
            Some(pb) => pb.suspend(print),
            None => print(),
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.finish_progress();
    }
}
