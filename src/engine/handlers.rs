//! CLI command handler: resolve settings, load every input into one store, print a summary.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::arg_parser::{Cli, RunSettings, apply_cli_to_settings};
use crate::engine::edge::UidEdgeBuilder;
use crate::engine::progress::ProgressSink;
use crate::engine::rdf::RdfParser;
use crate::engine::store::{MemStore, StoreStats};
use crate::engine::uid::UidAssigner;
use crate::pipeline::{Collaborators, LogSink, MetricsSink, load_edges_with_sink};
use crate::utils::{apply_file_to_settings, load_loader_toml, setup_logging};
use crate::{CounterSnapshot, Shard};

/// Counters of one loaded input.
#[derive(Debug, Serialize)]
pub struct InputSummary {
    pub path: String,
    pub counters: CounterSnapshot,
}

/// Everything printed at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub shard: Shard,
    pub processed: u64,
    pub ignored: u64,
    pub inputs: Vec<InputSummary>,
    pub store: StoreStats,
    pub uids: usize,
}

/// Defaults, then the config file (if any), then CLI flags.
///
/// Fails on a config file that does not parse, or on an explicit `--config` that cannot be read:
/// silently dropping it could load the wrong shard.
pub fn resolve_settings(cli: &Cli) -> Result<RunSettings> {
    let mut run = RunSettings::default();
    let path = cli.config_path();
    if let Some(file) = load_loader_toml(&path, cli.config.is_some())? {
        apply_file_to_settings(&file, &mut run);
    }
    apply_cli_to_settings(cli, &mut run);
    Ok(run)
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = File::open(path).with_context(|| format!("open input {}", path.display()))?;
    Ok(Box::new(file))
}

fn metrics_sink(progress: bool) -> Box<dyn MetricsSink> {
    if progress {
        Box::new(ProgressSink::new("Loading"))
    } else {
        Box::new(LogSink)
    }
}

/// Load `inputs` in order into the store behind `collab`. Stops at the first input that fails.
pub fn load_inputs(
    inputs: &[PathBuf],
    shard: Shard,
    collab: &Collaborators,
    run: &RunSettings,
) -> Result<Vec<InputSummary>> {
    let mut summaries = Vec::with_capacity(inputs.len());
    for path in inputs {
        info!("Loading {}", path.display());
        let reader = open_input(path)?;
        let outcome =
            load_edges_with_sink(reader, shard, collab, &run.opts, metrics_sink(run.progress));
        let c = outcome.counters;
        debug!(
            "{}: read={} parsed={} processed={} ignored={}",
            path.display(),
            c.read,
            c.parsed,
            c.processed,
            c.ignored
        );
        if let Some(err) = outcome.error {
            return Err(anyhow::Error::new(err)).with_context(|| {
                format!(
                    "loading {} (processed {} before the error)",
                    path.display(),
                    c.processed
                )
            });
        }
        summaries.push(InputSummary {
            path: path.display().to_string(),
            counters: c,
        });
    }
    Ok(summaries)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("serialize summary")?
        );
        return Ok(());
    }
    for input in &summary.inputs {
        let c = &input.counters;
        println!(
            "{} read {} parsed {} processed {} ignored {}",
            input.path.cyan(),
            c.read,
            c.parsed,
            c.processed.to_string().green(),
            c.ignored.to_string().yellow()
        );
    }
    println!(
        "{} {} processed, {} ignored (instance {} of {})",
        "Total:".bold(),
        summary.processed.to_string().green(),
        summary.ignored.to_string().yellow(),
        summary.shard.instance_idx(),
        summary.shard.num_instances()
    );
    println!(
        "{} {} posting lists, {} postings, {} index terms, {} uids",
        "Store:".bold(),
        summary.store.lists,
        summary.store.postings,
        summary.store.index_terms,
        summary.uids
    );
    Ok(())
}

/// Run the CLI: load every input into one in-memory store and print the summary.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let run = resolve_settings(cli)?;
    setup_logging(run.verbose);
    debug!("{} CONFIG: {:#?}", env!("CARGO_PKG_NAME").to_uppercase(), run);

    let shard = Shard::new(run.instance_idx, run.num_instances)?;
    let uids = Arc::new(UidAssigner::new());
    let store = Arc::new(MemStore::new());
    let collab = Collaborators {
        parser: Arc::new(RdfParser),
        edges: Arc::new(UidEdgeBuilder::new(Arc::clone(&uids))),
        store: store.clone(),
    };

    let inputs = load_inputs(&cli.inputs, shard, &collab, &run)?;
    let summary = RunSummary {
        shard,
        processed: inputs.iter().map(|i| i.counters.processed).sum(),
        ignored: inputs.iter().map(|i| i.counters.ignored).sum(),
        inputs,
        store: store.stats(),
        uids: uids.len(),
    };
    print_summary(&summary, run.json)
}
