//! Diff-sub orchestration: validate inputs, index the src files, then prune
//! each from file in list order.
//!
//! Phases: `Validating → Indexing → Pruning → Done`. Only validation can
//! abort before any file is parsed. A failing from file is recorded and the
//! next one is processed; a render failure is a bug and stops the run.
//!
//! When `verbose` is set, progress lines are written to the trace sink. The
//! lines and their order are stable so runs can be compared textually.

use crate::errors::{DiffError, ParseError, RenderError, TargetError};
use crate::file_check::check_file;
use crate::frontend;
use crate::index::{build_symbol_set, SymbolSet};
use crate::models::declaration::DeclarationModel;
use crate::models::{FileOutcome, Report};
use crate::prune::prune;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Indexing,
    Pruning,
    Done,
    Aborted,
}

struct Trace<W> {
    sink: W,
    enabled: bool,
}

impl<W: Write> Trace<W> {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        if let Err(e) = writeln!(self.sink, "{}", args) {
            warn!(error = %e, "failed to write trace line");
        }
    }
}

/// Arguments of one diff-sub run.
pub struct Arguments<W> {
    /// Files whose declarations are considered.
    pub src: Vec<PathBuf>,
    /// Files from which the considered declarations are removed.
    pub from: Vec<PathBuf>,
    /// Write pruned files back. When false nothing is written.
    pub write: bool,
    trace: Trace<W>,
    symbols: Option<SymbolSet>,
    phase: Phase,
}

enum FileFailure {
    Target(TargetError),
    Render(RenderError),
}

impl<W: Write> Arguments<W> {
    pub fn new(src: Vec<PathBuf>, from: Vec<PathBuf>, sink: W) -> Self {
        Arguments {
            src,
            from,
            write: true,
            trace: Trace {
                sink,
                enabled: false,
            },
            symbols: None,
            phase: Phase::Validating,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.trace.enabled = verbose;
        self
    }

    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The symbol set, once indexing has completed.
    pub fn symbols(&self) -> Option<&SymbolSet> {
        self.symbols.as_ref()
    }

    pub fn sink(&self) -> &W {
        &self.trace.sink
    }

    pub fn into_sink(self) -> W {
        self.trace.sink
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Run the whole operation.
    ///
    /// Returns the per-file report of the pruning phase; failed from files are
    /// inside the report (see `Report::into_result`). Configuration,
    /// validation, indexing and render failures are returned as errors.
    pub fn diff_sub(&mut self) -> Result<Report, DiffError> {
        self.enter(Phase::Validating);
        if self.src.is_empty() {
            self.enter(Phase::Aborted);
            return Err(DiffError::NotEnoughSourceFiles);
        }
        if self.from.is_empty() {
            self.enter(Phase::Aborted);
            return Err(DiffError::NotEnoughTargetFiles);
        }
        if !self.check_files() {
            self.enter(Phase::Aborted);
            return Err(DiffError::UnreadableFiles);
        }

        self.enter(Phase::Indexing);
        self.trace.line(format_args!("Parsing src files..."));
        let symbols = read_symbols(&self.src).map_err(|e| {
            warn!(file = %e.path().display(), error = %e, "could not index src file");
            DiffError::Index(e)
        })?;
        debug!(symbols = symbols.len(), "indexed src files");
        self.trace.line(format_args!("Found symbols:"));
        for name in symbols.sorted() {
            self.trace.line(format_args!("{}", name));
        }
        self.trace.line(format_args!("Removing duplicate symbols..."));
        self.symbols = Some(symbols);

        self.enter(Phase::Pruning);
        let report = self.remove_symbols()?;
        if self.from.len() > 1 {
            self.trace.line(format_args!(
                "Removed total number of duplicate symbols: {}",
                report.total_removed()
            ));
        }
        self.enter(Phase::Done);
        Ok(report)
    }

    /// Check every listed file, reporting each problem. Returns false when
    /// any file failed.
    fn check_files(&mut self) -> bool {
        let mut ok = true;
        for (label, files) in [("src", &self.src), ("from", &self.from)] {
            for file in files {
                self.trace
                    .line(format_args!("Considering {} file: {}", label, file.display()));
                if let Err(e) = check_file(file) {
                    ok = false;
                    debug!(file = %file.display(), error = %e, "file check failed");
                    self.trace.line(format_args!("{}", e));
                }
            }
        }
        ok
    }

    fn remove_symbols(&mut self) -> Result<Report, DiffError> {
        let symbols = match self.symbols.as_ref() {
            Some(s) => s,
            None => return Ok(Report::default()),
        };
        let src_keys: HashSet<PathBuf> = self.src.iter().map(|p| canonical(p)).collect();
        let mut report = Report::default();
        for from in &self.from {
            if src_keys.contains(&canonical(from)) {
                self.trace.line(format_args!(
                    "Skipping from file also listed as src: {}",
                    from.display()
                ));
                report.outcomes.push(FileOutcome::skipped(from.clone()));
                continue;
            }
            match remove_symbols_from_file(from, symbols, self.write) {
                Ok((removed, wrote)) => {
                    if self.write {
                        self.trace.line(format_args!(
                            "Removed {} duplicate symbols from {}",
                            removed,
                            from.display()
                        ));
                    } else {
                        self.trace.line(format_args!(
                            "Would remove {} duplicate symbols from {}",
                            removed,
                            from.display()
                        ));
                    }
                    report
                        .outcomes
                        .push(FileOutcome::pruned(from.clone(), removed, wrote));
                }
                Err(FileFailure::Target(e)) => {
                    warn!(file = %from.display(), error = %e, "could not prune file");
                    self.trace.line(format_args!(
                        "Error removing symbols from file \"{}\": {}",
                        from.display(),
                        e
                    ));
                    report.outcomes.push(FileOutcome::failed(from.clone(), e));
                }
                Err(FileFailure::Render(e)) => return Err(DiffError::Render(e)),
            }
        }
        Ok(report)
    }
}

/// Parse all src files in parallel; the first failure in list order wins.
fn read_symbols(src: &[PathBuf]) -> Result<SymbolSet, ParseError> {
    let parsed: Vec<Result<DeclarationModel, ParseError>> =
        src.par_iter().map(|p| frontend::parse(p)).collect();
    let mut models = Vec::with_capacity(parsed.len());
    for model in parsed {
        models.push(model?);
    }
    Ok(build_symbol_set(&models))
}

fn remove_symbols_from_file(
    path: &Path,
    symbols: &SymbolSet,
    write: bool,
) -> Result<(usize, bool), FileFailure> {
    let mut model =
        frontend::parse(path).map_err(|e| FileFailure::Target(TargetError::Parse(e)))?;
    let removed = prune(&mut model, symbols);
    debug!(file = %path.display(), removed, "pruned file");
    store_pruned(path, &model, removed, write)
}

/// Render a pruned model and write it back when anything was removed.
fn store_pruned(
    path: &Path,
    model: &DeclarationModel,
    removed: usize,
    write: bool,
) -> Result<(usize, bool), FileFailure> {
    if removed == 0 {
        return Ok((0, false));
    }
    let text = frontend::render(model).map_err(|e| {
        error!(file = %path.display(), error = %e, model = ?model, "render invariant violated");
        FileFailure::Render(e)
    })?;
    if !write {
        return Ok((removed, false));
    }
    fs::write(path, text).map_err(|source| {
        FileFailure::Target(TargetError::Write {
            path: path.to_path_buf(),
            source,
        })
    })?;
    Ok((removed, true))
}

fn canonical(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    fn trace_of(args: Arguments<Vec<u8>>) -> String {
        String::from_utf8(args.into_sink()).unwrap()
    }

    #[test]
    fn test_scenario_func_and_const() {
        let dir = tempdir().unwrap();
        let src = write(
            dir.path(),
            "a.go",
            "package p\n\nfunc Foo() {}\n\nconst Bar = 1\n",
        );
        let from = write(
            dir.path(),
            "b.go",
            "package p\n\nfunc Foo() {}\n\nconst Bar, Baz = 1, 2\n",
        );
        let mut args = Arguments::new(vec![src], vec![from.clone()], Vec::new());
        let report = args.diff_sub().unwrap();
        assert_eq!(report.total_removed(), 2);
        assert_eq!(args.phase(), Phase::Done);
        assert_eq!(
            fs::read_to_string(&from).unwrap(),
            "package p\n\nconst Baz = 2\n"
        );
    }

    #[test]
    fn test_verbose_trace_lines() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc Foo() {}\n\ntype A int\n");
        let f1 = write(dir.path(), "b.go", "package p\n\nfunc Foo() {}\n");
        let f2 = write(dir.path(), "c.go", "package p\n\nfunc Other() {}\n");
        let mut args =
            Arguments::new(vec![src.clone()], vec![f1.clone(), f2.clone()], Vec::new())
                .verbose(true);
        args.diff_sub().unwrap();
        let expected = format!(
            "Considering src file: {}\n\
             Considering from file: {}\n\
             Considering from file: {}\n\
             Parsing src files...\n\
             Found symbols:\n\
             A\n\
             Foo\n\
             Removing duplicate symbols...\n\
             Removed 1 duplicate symbols from {}\n\
             Removed 0 duplicate symbols from {}\n\
             Removed total number of duplicate symbols: 1\n",
            src.display(),
            f1.display(),
            f2.display(),
            f1.display(),
            f2.display()
        );
        assert_eq!(trace_of(args), expected);
    }

    #[test]
    fn test_empty_src_list_aborts_without_touching_targets() {
        let dir = tempdir().unwrap();
        let body = "package p\n\nfunc Foo() {}\n";
        let from = write(dir.path(), "b.go", body);
        let mut args = Arguments::new(Vec::new(), vec![from.clone()], Vec::new());
        assert!(matches!(
            args.diff_sub(),
            Err(DiffError::NotEnoughSourceFiles)
        ));
        assert_eq!(args.phase(), Phase::Aborted);
        assert_eq!(fs::read_to_string(&from).unwrap(), body);

        let mut args = Arguments::new(vec![from.clone()], Vec::new(), Vec::new());
        assert!(matches!(
            args.diff_sub(),
            Err(DiffError::NotEnoughTargetFiles)
        ));
    }

    #[test]
    fn test_validation_reports_every_bad_file() {
        let dir = tempdir().unwrap();
        let good = write(dir.path(), "a.go", "package p\n");
        let txt = write(dir.path(), "notes.txt", "x");
        let missing = dir.path().join("missing.go");
        let mut args =
            Arguments::new(vec![good, txt.clone()], vec![missing.clone()], Vec::new())
                .verbose(true);
        assert!(matches!(args.diff_sub(), Err(DiffError::UnreadableFiles)));
        assert_eq!(args.phase(), Phase::Aborted);
        let out = trace_of(args);
        assert!(out.contains(&format!("is not a Go file: {}", txt.display())));
        assert!(out.contains(&format!("could not find file: {}", missing.display())));
        assert!(!out.contains("Parsing src files..."));
    }

    #[test]
    fn test_invalid_src_file_is_fatal() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc {\n");
        let body = "package p\n\nfunc Foo() {}\n";
        let from = write(dir.path(), "b.go", body);
        let mut args = Arguments::new(vec![src], vec![from.clone()], Vec::new());
        assert!(matches!(args.diff_sub(), Err(DiffError::Index(_))));
        assert!(args.symbols().is_none());
        assert_eq!(fs::read_to_string(&from).unwrap(), body);
    }

    #[test]
    fn test_invalid_target_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc Foo() {}\n");
        let bad = write(dir.path(), "bad.go", "package p\n\nfunc Foo( {\n");
        let good = write(
            dir.path(),
            "good.go",
            "package p\n\nfunc Foo() {}\n\nfunc Keep() {}\n",
        );
        let mut args =
            Arguments::new(vec![src], vec![bad.clone(), good.clone()], Vec::new()).verbose(true);
        let report = args.diff_sub().unwrap();
        assert_eq!(report.total_removed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            fs::read_to_string(&good).unwrap(),
            "package p\n\nfunc Keep() {}\n"
        );
        let out = String::from_utf8(args.sink().clone()).unwrap();
        assert!(out.contains(&format!(
            "Error removing symbols from file \"{}\"",
            bad.display()
        )));
        match report.into_result() {
            Err(DiffError::TargetFiles { failed, last }) => {
                assert_eq!(failed, 1);
                assert!(matches!(last, TargetError::Parse(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_write_failure_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc Foo() {}\n");
        let body = "package p\n\nfunc Foo() {}\n";
        let locked = write(dir.path(), "locked.go", body);
        let good = write(dir.path(), "good.go", "package p\n\nfunc Foo() {}\n\nfunc Keep() {}\n");
        let mut perms = fs::metadata(&locked).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&locked, perms).unwrap();
        if fs::OpenOptions::new().write(true).open(&locked).is_ok() {
            // Privileged users ignore the read-only bit.
            return;
        }

        let mut args = Arguments::new(vec![src], vec![locked.clone(), good.clone()], Vec::new());
        let report = args.diff_sub().unwrap();
        assert_eq!(report.total_removed(), 1);
        assert_eq!(fs::read_to_string(&locked).unwrap(), body);
        assert_eq!(
            fs::read_to_string(&good).unwrap(),
            "package p\n\nfunc Keep() {}\n"
        );
        match report.into_result() {
            Err(DiffError::TargetFiles { failed, last }) => {
                assert_eq!(failed, 1);
                assert!(matches!(last, TargetError::Write { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_render_failure_is_reported_and_nothing_written() {
        let dir = tempdir().unwrap();
        let body = "package p\n\nvar a, b = 1, 2\n";
        let path = write(dir.path(), "b.go", body);
        let mut model = frontend::parse(&path).unwrap();
        model.rebuild(|mut d| {
            d.retain_names(|_| false);
            Some(d)
        });
        assert!(matches!(
            store_pruned(&path, &model, 2, true),
            Err(FileFailure::Render(RenderError::EmptyValueSpec { .. }))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), body);
    }

    #[test]
    fn test_zero_matches_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc Foo() {}\n");
        let body = "package p\n\n\n\nfunc  Bar() {}\n";
        let from = write(dir.path(), "b.go", body);
        let mut args = Arguments::new(vec![src], vec![from.clone()], Vec::new());
        let report = args.diff_sub().unwrap();
        assert_eq!(report.total_removed(), 0);
        assert!(!report.outcomes[0].wrote);
        assert_eq!(fs::read_to_string(&from).unwrap(), body);
    }

    #[test]
    fn test_rerun_is_idempotent_and_deterministic() {
        let dir = tempdir().unwrap();
        let src = write(
            dir.path(),
            "a.go",
            "package p\n\nvar (\n\tx = 1\n\ty = 2\n)\n\ntype T struct{}\n",
        );
        let body = "package p\n\nvar (\n\tx = 1\n\tz = 3\n)\n\n// T doc\ntype T struct{}\n\nfunc F() {}\n";
        let from = write(dir.path(), "b.go", body);

        let run = |from: &PathBuf| {
            let mut args = Arguments::new(vec![src.clone()], vec![from.clone()], Vec::new());
            args.diff_sub().unwrap().total_removed()
        };
        assert_eq!(run(&from), 2);
        let first = fs::read_to_string(&from).unwrap();
        assert_eq!(first, "package p\n\nvar (\n\tz = 3\n)\n\nfunc F() {}\n");

        assert_eq!(run(&from), 0);
        assert_eq!(fs::read_to_string(&from).unwrap(), first);

        fs::write(&from, body).unwrap();
        run(&from);
        assert_eq!(fs::read_to_string(&from).unwrap(), first);
    }

    #[test]
    fn test_same_path_in_both_lists_is_indexed_but_not_pruned() {
        let dir = tempdir().unwrap();
        let shared_body = "package p\n\nfunc Foo() {}\n";
        let shared = write(dir.path(), "shared.go", shared_body);
        let other = write(dir.path(), "other.go", "package p\n\nfunc Foo() {}\n\nfunc Bar() {}\n");
        let mut args = Arguments::new(
            vec![shared.clone()],
            vec![shared.clone(), other.clone()],
            Vec::new(),
        )
        .verbose(true);
        let report = args.diff_sub().unwrap();
        assert!(report.outcomes[0].skipped);
        assert_eq!(report.total_removed(), 1);
        assert_eq!(fs::read_to_string(&shared).unwrap(), shared_body);
        assert_eq!(
            fs::read_to_string(&other).unwrap(),
            "package p\n\nfunc Bar() {}\n"
        );
        let out = trace_of(args);
        assert!(out.contains(&format!(
            "Skipping from file also listed as src: {}",
            shared.display()
        )));
    }

    #[test]
    fn test_check_mode_does_not_write() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "a.go", "package p\n\nfunc Foo() {}\n");
        let body = "package p\n\nfunc Foo() {}\n";
        let from = write(dir.path(), "b.go", body);
        let mut args = Arguments::new(vec![src], vec![from.clone()], Vec::new())
            .write(false)
            .verbose(true);
        let report = args.diff_sub().unwrap();
        assert_eq!(report.total_removed(), 1);
        assert!(!report.outcomes[0].wrote);
        assert_eq!(fs::read_to_string(&from).unwrap(), body);
        assert!(trace_of(args).contains("Would remove 1 duplicate symbols from"));
    }
}
