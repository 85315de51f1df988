mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use commands::analyze::AnalyzeArgs;
use commands::classify::ClassifyArgs;
use commands::models::ModelsArgs;
use commands::resolve::ResolveArgs;

/// Financial data normalization and Z-Score model selection
#[derive(Parser)]
#[command(
    name = "zscore",
    version,
    about = "Multi-source financial normalization and Z-Score distress analysis",
    long_about = "Resolves raw line items from several data providers into a canonical \
                  record, reconciles the sources, selects the Altman Z-Score variant that \
                  fits the company, and scores every period with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log resolution and selection decisions to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, reconcile and score every period for one company
    Analyze(AnalyzeArgs),
    /// Resolve one raw source into canonical fields with provenance
    Resolve(ResolveArgs),
    /// Classify a company and show which model it selects
    Classify(ClassifyArgs),
    /// List the model registry
    Models(ModelsArgs),
    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Analyze(_) => "analyze",
            Self::Resolve(_) => "resolve",
            Self::Classify(_) => "classify",
            Self::Models(_) => "models",
            Self::Version => "version",
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = cli.command.name(), output = ?cli.output, "dispatching");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Resolve(args) => commands::resolve::run_resolve(args),
        Commands::Classify(args) => commands::classify::run_classify(args),
        Commands::Models(args) => commands::models::run_models(args),
        Commands::Version => {
            println!("zscore {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_follow_subcommands() {
        let cli = Cli::try_parse_from(["zscore", "models", "--output", "table"]).unwrap();
        assert_eq!(cli.command.name(), "models");
        assert!(matches!(cli.output, OutputFormat::Table));

        let cli = Cli::try_parse_from(["zscore", "version", "-v"]).unwrap();
        assert_eq!(cli.command.name(), "version");
        assert!(cli.verbose);
    }
}
