//! Configuration discovery and effective settings resolution.
//!
//! diffsub reads `diffsub.toml|yaml|yml` from the repository root (or the
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `src`, `from`: empty (validation rejects empty lists)
//! - `verbose`: false
//! - `output`: `human`
//! - `check`: false
//!
//! Overrides precedence: CLI > config file > defaults. Non-empty CLI file
//! lists replace the configured patterns entirely.

use crate::utils;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `diffsub.toml|yaml`.
pub struct DiffSubConfig {
    /// Glob patterns for src files, relative to the repository root.
    #[serde(default)]
    pub src: Vec<String>,
    /// Glob patterns for from files, relative to the repository root.
    #[serde(default)]
    pub from: Vec<String>,
    pub verbose: Option<bool>,
    pub output: Option<String>,
    pub check: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the binary after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub src: Vec<PathBuf>,
    pub from: Vec<PathBuf>,
    pub verbose: bool,
    pub output: String,
    pub check: bool,
}

const CONFIG_NAMES: [&str; 3] = ["diffsub.toml", "diffsub.yaml", "diffsub.yml"];

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `diffsub.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `DiffSubConfig` from `diffsub.toml` or `diffsub.yaml|yml` if present.
///
/// An unreadable or invalid file is logged and treated as absent.
pub fn load_config(root: &Path) -> Option<DiffSubConfig> {
    let toml_path = root.join("diffsub.toml");
    if toml_path.exists() {
        let s = read_logged(&toml_path)?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(file = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in ["diffsub.yaml", "diffsub.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = read_logged(&p)?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(file = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

fn read_logged(p: &Path) -> Option<String> {
    match fs::read_to_string(p) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(file = %p.display(), error = %e, "could not read config");
            None
        }
    }
}

/// Expand glob patterns relative to `root`. Matches are sorted and
/// de-duplicated; a pattern without matches is kept as a literal path so
/// validation can report it.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for pat in patterns {
        let abs = root.join(pat);
        let pattern = abs.to_string_lossy().to_string();
        let mut matched: Vec<PathBuf> = match glob::glob(&pattern) {
            Ok(paths) => paths.flatten().collect(),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "bad glob pattern");
                Vec::new()
            }
        };
        if matched.is_empty() {
            matched.push(abs);
        }
        matched.sort();
        for p in matched {
            let shown = PathBuf::from(utils::rel_to_wd(&p));
            if seen.insert(shown.clone()) {
                out.push(shown);
            }
        }
    }
    out
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_src: &[String],
    cli_from: &[String],
    cli_verbose: bool,
    cli_output: Option<&str>,
    cli_check: bool,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let src = if cli_src.is_empty() {
        expand_patterns(&repo_root, &cfg.src)
    } else {
        cli_src.iter().map(PathBuf::from).collect()
    };
    let from = if cli_from.is_empty() {
        expand_patterns(&repo_root, &cfg.from)
    } else {
        cli_from.iter().map(PathBuf::from).collect()
    };

    let verbose = cli_verbose || cfg.verbose.unwrap_or(false);
    let check = cli_check || cfg.check.unwrap_or(false);
    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    Effective {
        repo_root,
        src,
        from,
        verbose,
        output,
        check,
    }
}
