//! pycensus CLI entry point.

use clap::Parser;
use pycensus::cli::{self, Cli, Commands, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    cli::init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Calls(args) => cli::run_calls(args),
        Commands::Docstrings(args) => cli::run_docstrings(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
