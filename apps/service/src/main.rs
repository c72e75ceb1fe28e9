#![warn(clippy::all, clippy::pedantic)]

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod board;
mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level());

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(commands::execute(cli));

    // The stdin reader blocks a pool thread that cannot be cancelled
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}
