use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "whales-cli")]
#[command(about = "Fetch whale-percentage history for a list of crypto assets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional JSON fetch configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every identifier in the input list and write the report
    Fetch {
        #[arg(short, long, default_value = "cryptos.txt")]
        input: PathBuf,

        #[arg(short, long, default_value = "whales.json")]
        output: PathBuf,

        /// Remote errors are logged here, one line each
        #[arg(long, default_value = "invalid-cryptos.txt")]
        invalid: PathBuf,

        /// Also export the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Identifiers processed at once (default 5; higher values get rate limited)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-query timeout in milliseconds (default 5000)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print a previously written JSON report
    Show {
        /// Path to the JSON report
        file: PathBuf,
    },

    /// List the fixed lookback offsets and what they resolve to now
    Offsets,
}

pub fn show_banner() {
    println!("# ------------------------------------------------------------------------ #");
    println!("# Whales Percentage Fetcher");
    println!("# Executing date: {}", whales_cli::utils::current_human_timestamp());
    println!("# ------------------------------------------------------------------------ #");
    println!();
}
