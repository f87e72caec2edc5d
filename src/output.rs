//! Output rendering for the final report.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-file fields and a top-level summary; the human form only reports
//! problems, on stderr.

use crate::errors::DiffError;
use crate::models::Report;
use crate::utils;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Print the pruning report in the requested format.
pub fn print_report(report: &Report, output: &str, write: bool) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(report)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} could not encode report: {}", utils::error_prefix(), e),
        },
        _ => {
            for o in &report.outcomes {
                if let Some(e) = &o.error {
                    eprintln!("{} {}: {}", utils::error_prefix(), o.file.display(), e);
                }
            }
            let removed = report.total_removed();
            if !write && removed > 0 {
                eprintln!(
                    "{} {} duplicate symbols would be removed; run without --check to apply",
                    utils::note_prefix(),
                    removed
                );
            }
        }
    }
}

/// Line printed on stderr when a run fails.
pub fn fatal_line(err: &DiffError) -> String {
    format!("Error performing diff-sub operation: {}", err)
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    let items: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| {
            json!({
                "file": o.file.to_string_lossy(),
                "removed": o.removed,
                "wrote": o.wrote,
                "skipped": o.skipped,
                "error": o.error.as_ref().map(|e| e.to_string()),
            })
        })
        .collect();
    json!({"results": items, "summary": report.summary()})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ParseError, TargetError};
    use crate::models::FileOutcome;
    use std::path::PathBuf;

    #[test]
    fn test_fatal_line_is_unprefixed() {
        assert_eq!(
            fatal_line(&DiffError::NotEnoughSourceFiles),
            "Error performing diff-sub operation: not enough src files"
        );
    }

    #[test]
    fn test_compose_report_json_shape() {
        let report = Report {
            outcomes: vec![
                FileOutcome::pruned("a.go".into(), 2, true),
                FileOutcome::failed(
                    "b.go".into(),
                    TargetError::Parse(ParseError::Syntax {
                        path: PathBuf::from("b.go"),
                        line: 1,
                        column: 2,
                        near: "x".into(),
                    }),
                ),
            ],
        };
        let out = compose_report_json(&report);
        assert_eq!(out["summary"]["removed"], 2);
        assert_eq!(out["summary"]["failed"], 1);
        assert_eq!(out["summary"]["wrote"], 1);
        assert_eq!(out["results"][0]["file"], "a.go");
        assert!(out["results"][0]["error"].is_null());
        assert_eq!(out["results"][1]["error"], "b.go:1:2: syntax error near `x`");
    }
}
