//! Shared data models: the declaration model and per-run results.

pub mod declaration;

use crate::errors::{DiffError, TargetError};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug)]
/// Result of processing one target file.
pub struct FileOutcome {
    pub file: PathBuf,
    pub removed: usize,
    pub wrote: bool,
    /// Listed as a src file too; left untouched.
    pub skipped: bool,
    pub error: Option<TargetError>,
}

impl FileOutcome {
    pub fn pruned(file: PathBuf, removed: usize, wrote: bool) -> Self {
        FileOutcome {
            file,
            removed,
            wrote,
            skipped: false,
            error: None,
        }
    }

    pub fn skipped(file: PathBuf) -> Self {
        FileOutcome {
            file,
            removed: 0,
            wrote: false,
            skipped: true,
            error: None,
        }
    }

    pub fn failed(file: PathBuf, error: TargetError) -> Self {
        FileOutcome {
            file,
            removed: 0,
            wrote: false,
            skipped: false,
            error: Some(error),
        }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
/// Aggregated counts used by printers.
pub struct Summary {
    pub removed: usize,
    pub files: usize,
    pub wrote: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
/// Per-file outcomes of the pruning phase, in target-list order.
pub struct Report {
    pub outcomes: Vec<FileOutcome>,
}

impl Report {
    pub fn total_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed).sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    pub fn last_error(&self) -> Option<&TargetError> {
        self.outcomes.iter().rev().find_map(|o| o.error.as_ref())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            removed: self.total_removed(),
            files: self.outcomes.len(),
            wrote: self.outcomes.iter().filter(|o| o.wrote).count(),
            failed: self.failed(),
        }
    }

    /// Fold the outcomes into the total removed count, or an error carrying
    /// the number of failed files and the last failure.
    pub fn into_result(self) -> Result<usize, DiffError> {
        let total = self.total_removed();
        let failed = self.failed();
        match self.outcomes.into_iter().rev().find_map(|o| o.error) {
            Some(last) => Err(DiffError::TargetFiles { failed, last }),
            None => Ok(total),
        }
    }
}
