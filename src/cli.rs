//! Command-line interface for pycensus.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::analysis::ProjectAnalyzer;
use crate::config::{Config, ParseErrorPolicy, UnhandledCallPolicy};
use crate::report::{self, CALLS_OUTPUT, DOCSTRINGS_OUTPUT};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Census of a Python project's call targets and docstrings.
///
/// pycensus parses every `.py` file below a directory and writes either a
/// call-frequency table or a qualified-path docstring table as JSON.
#[derive(Parser)]
#[command(name = "pycensus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count how often each function or method name is called
    Calls(CallsArgs),
    /// Extract docstrings keyed by qualified path
    Docstrings(DocstringsArgs),
}

/// Options shared by both commands.
#[derive(Args)]
pub struct CommonArgs {
    /// Root directory of the Python project
    pub module_path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip files that fail to parse instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// Process files one at a time
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the calls command.
#[derive(Args)]
pub struct CallsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Fail on call expressions whose callee shape is not classified
    #[arg(long)]
    pub strict: bool,

    /// Print the N most called names
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Arguments for the docstrings command.
#[derive(Args)]
pub struct DocstringsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over
/// the verbosity flag.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second initialization (e.g. from tests) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Load the configuration: an explicit file, else one found in the current
/// directory, else the defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Config::discover_in(Path::new(".")),
    };

    match path {
        Some(path) => {
            debug!(config = %path.display(), "loading config");
            Config::parse_file(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Apply command-line overrides to a loaded configuration.
fn apply_overrides(mut config: Config, common: &CommonArgs) -> Config {
    if common.keep_going {
        config.on_parse_error = ParseErrorPolicy::Skip;
    }
    if common.sequential {
        config.parallel = false;
    }
    config
}

fn analyzer_for(common: &CommonArgs, strict: bool) -> anyhow::Result<ProjectAnalyzer> {
    let mut config = apply_overrides(load_config(common.config.as_deref())?, common);
    if strict {
        config.on_unhandled_call = UnhandledCallPolicy::Fail;
    }
    ProjectAnalyzer::new(&common.module_path, config).context("invalid configuration")
}

/// Run the calls command.
pub fn run_calls(args: &CallsArgs) -> anyhow::Result<i32> {
    let analyzer = analyzer_for(&args.common, args.strict)?;
    let report = analyzer
        .analyze_calls()
        .with_context(|| format!("analyzing {}", args.common.module_path.display()))?;

    let output = args
        .common
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(CALLS_OUTPUT));
    report::write_json(&output, &report.table)?;
    info!(files = report.files_analyzed, names = report.table.len(), "wrote call table");

    report::write_diagnostics(&report, report.table.unclassified());
    if let Some(limit) = args.top {
        report::write_top_calls(&report.table, limit);
    }

    println!("Calls summary extracted to {}", output.display());
    Ok(EXIT_SUCCESS)
}

/// Run the docstrings command.
pub fn run_docstrings(args: &DocstringsArgs) -> anyhow::Result<i32> {
    let analyzer = analyzer_for(&args.common, false)?;
    let report = analyzer
        .analyze_docstrings()
        .with_context(|| format!("analyzing {}", args.common.module_path.display()))?;

    let output = args
        .common
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DOCSTRINGS_OUTPUT));
    report::write_json(&output, &report.table)?;
    info!(files = report.files_analyzed, paths = report.table.len(), "wrote docstring table");

    report::write_diagnostics(&report, &[]);

    println!("Docstrings extracted to {}", output.display());
    Ok(EXIT_SUCCESS)
}
