//! Edgeload CLI: load N-Quad files into an in-memory sharded posting-list store.

use anyhow::Result;
use clap::Parser;
use edgeload::engine::arg_parser::Cli;
use edgeload::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
