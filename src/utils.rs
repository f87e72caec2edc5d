//! Small helpers shared by the printers and the config layer.

use owo_colors::OwoColorize;
use std::path::Path;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".yellow().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Display `p` relative to the working directory when possible.
pub fn rel_to_wd(p: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|wd| pathdiff::diff_paths(p, wd))
        .unwrap_or_else(|| p.to_path_buf())
        .to_string_lossy()
        .to_string()
}
