//! CLI argument parsing via `clap`.
//!
//! The tool keeps the single-dash flags `-src` and `-from`; they are
//! rewritten to their `--` forms before clap sees them.

use clap::{ArgAction, CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "diffsub",
    about = "Remove declarations duplicated from src files",
    long_about = "diffsub: remove from Go files every top-level function, type, constant and variable that is also declared in the src files.\n\nConfiguration precedence: CLI > diffsub.toml > defaults.",
    after_help = "Examples:\n  diffsub -src filea.go -from fileb.go\n  diffsub -src a.go -src b.go -from gen.go -V\n  diffsub --check --output json",
    disable_help_flag = true,
    disable_version_flag = true
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(long = "src", value_name = "FILE", action = ArgAction::Append, help = "Files whose functions, variables and constants should be considered (repeatable)")]
    pub src: Vec<String>,
    #[arg(long = "from", value_name = "FILE", action = ArgAction::Append, help = "Files from which declarations with the same name should be removed (repeatable)")]
    pub from: Vec<String>,
    #[arg(short = 'V', long = "verbose", action = ArgAction::SetTrue, help = "Print progress")]
    pub verbose: bool,
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue, help = "Print the version and exit")]
    pub version: bool,
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue, help = "Print help information")]
    pub help: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Do not write; exit non-zero if anything would be removed")]
    pub check: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Where to look for diffsub.toml (default: current dir)")]
    pub repo_root: Option<String>,
}

/// Rewrite `-src`/`-from` (and their `=value` forms) to long flags.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            for flag in ["src", "from"] {
                let short = format!("-{}", flag);
                if arg == short || arg.starts_with(&format!("{}=", short)) {
                    return format!("-{}", arg);
                }
            }
            arg
        })
        .collect()
}

/// Usage text printed for `-h`.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
