//! Error types for file checks, the Go front-end, and the diff-sub run.
//!
//! Per-file failures (`TargetError`) are collected by the orchestrator and do
//! not stop a run. `DiffError` is what a run returns when it cannot go on or
//! when at least one target file failed.

use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating an input path.
#[derive(Debug, Error)]
pub enum FileCheckError {
    #[error("could not find file: {}", .0.display())]
    NotFound(PathBuf),
    #[error("file error: {0}")]
    Stat(std::io::Error),
    #[error("is a directory: {}", .0.display())]
    IsDirectory(PathBuf),
    #[error("is not a Go file: {}", .0.display())]
    WrongExtension(PathBuf),
    #[error("could not open file: {0}")]
    OpenFailed(std::io::Error),
}

/// A Go source file could not be turned into a declaration model.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read file \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}:{column}: syntax error near `{near}`", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        near: String,
    },
    #[error("failed to load Go grammar for \"{}\": {message}", path.display())]
    Grammar { path: PathBuf, message: String },
}

impl ParseError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ParseError::Read { path, .. }
            | ParseError::Syntax { path, .. }
            | ParseError::Grammar { path, .. } => path,
        }
    }
}

/// Rendering hit an internal invariant violation. Always a bug in pruning,
/// never a problem with the input.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("overlapping edits in \"{}\" at byte {at}", path.display())]
    OverlappingEdits { path: PathBuf, at: usize },
    #[error("value spec without names retained in \"{}\"", path.display())]
    EmptyValueSpec { path: PathBuf },
    #[error("rendered source for \"{}\" does not parse: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },
}

/// Failure on a single target file. Recorded; the run continues.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("writing changed file \"{}\" failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level outcome of a diff-sub operation.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("not enough src files")]
    NotEnoughSourceFiles,
    #[error("not enough from files")]
    NotEnoughTargetFiles,
    #[error("could not read all files")]
    UnreadableFiles,
    #[error("could not index src file: {0}")]
    Index(#[source] ParseError),
    #[error("internal render error: {0}")]
    Render(#[from] RenderError),
    #[error("{failed} from file(s) could not be processed: {last}")]
    TargetFiles {
        failed: usize,
        #[source]
        last: TargetError,
    },
}
