//! Input file validation run before any parsing.

use crate::errors::FileCheckError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Check that `path` is an existing, readable regular file ending in `.go`.
pub fn check_file(path: &Path) -> Result<(), FileCheckError> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FileCheckError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(FileCheckError::Stat(e)),
    };
    if meta.is_dir() {
        return Err(FileCheckError::IsDirectory(path.to_path_buf()));
    }
    let is_go = path
        .file_name()
        .map_or(false, |n| n.to_string_lossy().ends_with(".go"));
    if !is_go {
        return Err(FileCheckError::WrongExtension(path.to_path_buf()));
    }
    fs::File::open(path).map_err(FileCheckError::OpenFailed)?;
    Ok(())
}
