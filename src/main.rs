//! diffsub CLI binary entry point.
//! Resolves configuration, runs the diff-sub operation and prints results.

use clap::Parser;
use diffsub::cli::{self, Cli};
use diffsub::diff::Arguments;
use diffsub::{config, logging, output};
use std::io::{self, Write};
use std::process;

fn main() {
    logging::init();
    let args = cli::normalize_args(std::env::args());
    let cli = match Cli::try_parse_from(args) {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }
    if cli.help {
        eprintln!("{}", cli::usage());
        process::exit(1);
    }

    let eff = config::resolve_effective(
        cli.repo_root.as_deref(),
        &cli.src,
        &cli.from,
        cli.verbose,
        cli.output.as_deref(),
        cli.check,
    );
    // Keep stdout clean for the JSON report.
    let sink: Box<dyn Write> = if eff.output == "json" {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let mut run = Arguments::new(eff.src, eff.from, sink)
        .verbose(eff.verbose)
        .write(!eff.check);
    let report = match run.diff_sub() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", output::fatal_line(&e));
            process::exit(1);
        }
    };
    output::print_report(&report, &eff.output, !eff.check);
    match report.into_result() {
        Ok(removed) if eff.check && removed > 0 => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{}", output::fatal_line(&e));
            process::exit(1);
        }
    }
}
