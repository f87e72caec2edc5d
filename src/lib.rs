//! diffsub core library.
//!
//! Removes from a set of Go source files every top-level declaration whose
//! name is also declared in a set of reference files.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `diff`: Orchestration of validation, indexing and pruning.
//! - `errors`: Error types for every stage.
//! - `file_check`: Input file validation.
//! - `frontend`: Go parsing into declaration models and rendering back.
//! - `index`: Symbol set built from the reference files.
//! - `logging`: Diagnostic logging setup.
//! - `models`: Declaration model and run results.
//! - `output`: Human/JSON printers for the run report.
//! - `prune`: Removal of indexed names from a model.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod diff;
pub mod errors;
pub mod file_check;
pub mod frontend;
pub mod index;
pub mod logging;
pub mod models;
pub mod output;
pub mod prune;
pub mod utils;
