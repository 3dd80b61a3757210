mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use whales_cli::app::{self, FetchJob};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            input,
            output,
            invalid,
            csv,
            concurrency,
            timeout_ms,
        } => {
            cli::show_banner();
            let config = app::resolve_config(cli.config.as_deref(), concurrency, timeout_ms)?;
            let job = FetchJob {
                input,
                output,
                invalid,
                csv,
                config,
            };
            app::run_fetch(job).await?;
        }
        Commands::Show { ref file } => {
            app::show_report(file)?;
        }
        Commands::Offsets => {
            app::print_offsets();
        }
    }

    Ok(())
}
