//! `immigration-collector` binary.
//!
//! ## Commands
//!
//! - `run`: execute one collection run and print its summary
//! - `check`: explain how a single URL would be admitted and scored

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::run_cmd::StoreKind;
use immigration_collector::config::DEFAULT_CONFIG_PATH;
use immigration_collector::store::json_file::DEFAULT_DATA_PATH;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVES: &str = "immigration_collector=info,immigration_collector_cli=info";

#[derive(Parser)]
#[command(name = "immigration-collector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collect and score Canadian immigration law and policy URLs", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "COLLECTOR_CONFIG")]
    config: PathBuf,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection pass
    Run {
        /// Where results are written
        #[arg(long, value_enum, default_value_t = StoreKind::Json)]
        store: StoreKind,

        /// Data file for the json store
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Override crawl.max_pages_per_run
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print the final stats as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show canonical form, admission verdict and URL score for one URL
    Check {
        /// URL to diagnose
        url: String,

        /// Print the diagnosis as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = if verbose {
            DEFAULT_LOG_DIRECTIVES.replace("=info", "=debug")
        } else {
            DEFAULT_LOG_DIRECTIVES.to_string()
        };
        EnvFilter::new(directives)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs, cli.verbose);

    match cli.command {
        Commands::Run {
            store,
            data,
            max_pages,
            json,
        } => cli::run_cmd::run(&cli.config, store, &data, max_pages, json).await,
        Commands::Check { url, json } => cli::check_cmd::run(&cli.config, &url, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "immigration-collector",
            "run",
            "--store",
            "memory",
            "--max-pages",
            "10",
            "--config",
            "cfg.json",
        ]);
        assert_eq!(cli.config, PathBuf::from("cfg.json"));
        match cli.command {
            Commands::Run {
                store, max_pages, ..
            } => {
                assert_eq!(store, StoreKind::Memory);
                assert_eq!(max_pages, Some(10));
            }
            Commands::Check { .. } => panic!("expected run"),
        }
    }
}
