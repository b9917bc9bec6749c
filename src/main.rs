use crate::config::cli::Args;
use crate::config::Config;
use crate::error::Result;
use crate::processor::{Processor, RunSummary};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, Level};

mod calendar;
mod config;
mod error;
mod matcher;
mod processor;
mod renderer;
mod scrapers;

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<RunSummary> {
    let config = Config::new(args)?;
    let processor = Processor::new(config)?;
    processor.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level);

    match run(args).await {
        Ok(summary) => {
            info!("Scraping completed successfully!");
            println!(
                "Wrote {} with {} events.",
                summary.path.display(),
                summary.events
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
