// File: ./src/document.rs
//! The calendar file held in memory as ordered lines, and the only way to
//! change it.
//!
//! Every mutation is speculative: it is applied, the whole document is
//! re-projected through the oracle, and it is either committed or undone.
//! Callers never observe a half-applied edit.

use crate::projector::{Projection, ProjectionError, ViewMode, ViewProjector};
use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("line {0} does not exist")]
    NoSuchLine(usize),
    #[error("a date expression cannot contain a comma")]
    CommaInExpression,
    #[error(transparent)]
    Rejected(#[from] ProjectionError),
}

/// What a transaction does to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Replace(String),
    Delete,
    Append(String),
}

/// One speculative edit. Lives only for the duration of a single mutator
/// call.
#[derive(Debug)]
pub struct EditTransaction {
    index: usize,
    old: Option<String>,
    candidate: Candidate,
}

impl EditTransaction {
    fn begin(lines: &[String], index: usize, candidate: Candidate) -> Result<Self, EditError> {
        let old = match candidate {
            Candidate::Append(_) => None,
            _ => Some(lines.get(index).ok_or(EditError::NoSuchLine(index))?.clone()),
        };
        Ok(Self {
            index,
            old,
            candidate,
        })
    }

    fn apply(&self, lines: &mut Vec<String>) {
        match &self.candidate {
            Candidate::Replace(text) => lines[self.index] = text.clone(),
            Candidate::Delete => {
                lines.remove(self.index);
            }
            Candidate::Append(text) => lines.push(text.clone()),
        }
    }

    fn rollback(mut self, lines: &mut Vec<String>) {
        match (&self.candidate, self.old.take()) {
            (Candidate::Replace(_), Some(old)) => lines[self.index] = old,
            (Candidate::Delete, Some(old)) => lines.insert(self.index, old),
            (Candidate::Append(_), _) => {
                lines.pop();
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was modified, the file was left alone.
    Unchanged,
    Saved { backup: PathBuf },
    /// The file changed on disk since it was loaded.
    Conflict,
}

#[derive(Debug)]
pub struct CalendarDocument {
    path: PathBuf,
    lines: Vec<String>,
    modified: bool,
    generation: u64,
    loaded_mtime: Option<SystemTime>,
}

impl CalendarDocument {
    pub fn new(path: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        Self {
            path: path.into(),
            lines,
            modified: false,
            generation: 0,
            loaded_mtime: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read calendar '{}'", path.display()))?;
        let mut doc = Self::new(path, contents.lines().map(str::to_string).collect());
        doc.loaded_mtime = modified_time(path);
        log::info!("Loaded {} lines from {}", doc.lines.len(), path.display());
        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn project(
        &self,
        projector: &ViewProjector,
        view: &ViewMode,
    ) -> Result<Projection, ProjectionError> {
        projector.project(&self.lines, view, self.generation)
    }

    /// Replaces line `index`. Blank text deletes the line instead.
    pub fn update_line(
        &mut self,
        index: usize,
        text: &str,
        projector: &ViewProjector,
        view: &ViewMode,
    ) -> Result<Projection, EditError> {
        if text.trim().is_empty() {
            return self.delete_line(index, projector, view);
        }
        self.run(index, Candidate::Replace(text.to_string()), projector, view)
    }

    pub fn delete_line(
        &mut self,
        index: usize,
        projector: &ViewProjector,
        view: &ViewMode,
    ) -> Result<Projection, EditError> {
        self.run(index, Candidate::Delete, projector, view)
    }

    pub fn append_line(
        &mut self,
        text: &str,
        projector: &ViewProjector,
        view: &ViewMode,
    ) -> Result<Projection, EditError> {
        let index = self.lines.len();
        self.run(index, Candidate::Append(text.to_string()), projector, view)
    }

    fn run(
        &mut self,
        index: usize,
        candidate: Candidate,
        projector: &ViewProjector,
        view: &ViewMode,
    ) -> Result<Projection, EditError> {
        let tx = EditTransaction::begin(&self.lines, index, candidate)?;
        tx.apply(&mut self.lines);

        match projector.project(&self.lines, view, self.generation + 1) {
            Ok(projection) => {
                self.modified = true;
                self.generation += 1;
                log::info!(
                    "Committed {:?} at line {} (generation {})",
                    tx.candidate,
                    index,
                    self.generation
                );
                Ok(projection)
            }
            Err(e) => {
                log::warn!("Rolling back {:?} at line {}: {}", tx.candidate, index, e);
                tx.rollback(&mut self.lines);
                Err(EditError::Rejected(e))
            }
        }
    }

    /// True when the file on disk is not the one that was loaded.
    pub fn externally_modified(&self) -> bool {
        modified_time(&self.path) != self.loaded_mtime
    }

    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        with_suffix(&self.path, suffix)
    }

    /// Writes the document back if it was modified. Without `force`, an
    /// external change to the file is reported as a conflict and nothing is
    /// written.
    pub fn save(&mut self, backup_suffix: &str, force: bool) -> Result<SaveOutcome> {
        if backup_suffix.is_empty() {
            bail!("The backup suffix is empty: the backup would overwrite the calendar");
        }
        if !self.modified {
            return Ok(SaveOutcome::Unchanged);
        }
        if !force && self.externally_modified() {
            log::warn!("{} changed on disk since it was loaded", self.path.display());
            return Ok(SaveOutcome::Conflict);
        }

        let backup = self.backup_path(backup_suffix);
        if self.path.exists() {
            fs::copy(&self.path, &backup).with_context(|| {
                format!("Failed to back up calendar to '{}'", backup.display())
            })?;
        }

        let mut contents = String::new();
        for line in &self.lines {
            contents.push_str(line);
            contents.push('\n');
        }
        with_lock(&self.path, || atomic_write(&self.path, &contents))
            .with_context(|| format!("Failed to write calendar '{}'", self.path.display()))?;

        self.modified = false;
        self.loaded_mtime = modified_time(&self.path);
        log::info!(
            "Saved {} lines to {} (backup {})",
            self.lines.len(),
            self.path.display(),
            backup.display()
        );
        Ok(SaveOutcome::Saved { backup })
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Runs `f` while holding an exclusive lock on a sibling `.lock` file.
fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let lock_path = with_suffix(file_path, ".lock");
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    file.lock_exclusive()?;
    let result = f();
    file.unlock()?;
    result
}

/// Atomic write: Write to .tmp file then rename
fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = with_suffix(path, ".tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
