mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use commands::allocate::AllocateArgs;
use commands::run::RunArgs;
use config::RunConfig;

/// Covenant-constrained loan allocation
#[derive(Parser)]
#[command(
    name = "lalloc",
    version,
    about = "Assign streamed loans to lending facilities under covenants",
    long_about = "Loads banks, facilities and covenants, then offers each loan, in arrival \
                  order, to facilities from cheapest to most expensive. The first facility \
                  whose covenants and remaining capacity allow the loan takes it. Reports \
                  the assignments and the expected yield per facility."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "loan_allocation_core=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a CSV dataset and write assignments.csv and yields.csv
    Run(RunArgs),
    /// Allocate a JSON batch (file or stdin) and print the result
    Allocate(AllocateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => match RunConfig::load(path) {
            Ok(config) => config,
            Err(e) => fail(e),
        },
        None => RunConfig::default(),
    };

    logging::init(cli.log_level.as_deref().or(config.log_level.as_deref()));

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::run::run_dataset(args, &config),
        Commands::Allocate(args) => commands::allocate::run_allocate(args),
        Commands::Version => {
            println!("lalloc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}
