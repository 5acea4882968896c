use log::debug;
use std::io::Read;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::pipeline::{self, Collaborators, LogSink, MetricsSink, PipelineState};
use crate::{LoadOpts, LoadOutcome, Shard};

/// Join a worker pool. A panicked worker is logged; its share of the input is lost, not retried.
fn join_workers(stage: &str, handles: Vec<JoinHandle<()>>) {
    for h in handles {
        if h.join().is_err() {
            log::error!("{} worker panicked", stage);
        }
    }
}

/// Main orchestrator: run the whole pipeline over `reader` and return when every triple has been
/// ignored, processed, or abandoned after the first error.
///
/// Reader → line queue → parse workers → triple queue → mutation workers → store.
///
/// The triple queue is closed only after every parse worker has exited, so nothing in flight is
/// cut off; the returned `processed` count is final.
pub fn load_edges_with_sink<R>(
    reader: R,
    shard: Shard,
    collab: &Collaborators,
    opts: &LoadOpts,
    sink: Box<dyn MetricsSink>,
) -> LoadOutcome
where
    R: Read + Send + 'static,
{
    let state = PipelineState::new(shard);
    let channels = pipeline::create_pipeline_channels(opts.channel_cap);

    let metrics = pipeline::spawn_metrics_loop(
        state.clone(),
        channels.nquad_rx.clone(),
        opts.metrics_interval.max(Duration::from_millis(1)),
        sink,
    );

    // Producer: start buffering input into the line queue.
    let reader_handle = pipeline::spawn_line_source(
        reader,
        channels.line_tx,
        state.clone(),
        opts.window_capacity,
    );

    let parse_handles = pipeline::spawn_parse_workers(
        &channels.line_rx,
        &channels.nquad_tx,
        &collab.parser,
        &state,
        opts.parser_threads(),
    );
    // Parsers hold the only receivers now; if they all stop, the reader sees the queue disconnect.
    drop(channels.line_rx);

    let mutation_handles = pipeline::spawn_mutation_workers(
        &channels.nquad_rx,
        collab,
        &state,
        opts.mutation_threads(),
        opts.retry_backoff,
    );
    drop(channels.nquad_rx);
    debug!(
        "pipeline started: {} parsers, {} mutation workers, shard {}/{}",
        parse_handles.len(),
        mutation_handles.len(),
        shard.instance_idx(),
        shard.num_instances()
    );

    // Block until every parser is done, then close the triple queue.
    join_workers("parse", parse_handles);
    drop(channels.nquad_tx);
    // Triple queue is closed; wait for the mutation workers to drain it.
    join_workers("mutation", mutation_handles);

    metrics.stop();

    if state.errors.is_set() {
        // The reader may still be blocked on the input stream; leave it behind.
        debug!("load stopped on error; not waiting for the line source");
    } else if reader_handle.join().is_err() {
        log::error!("line source panicked");
    }

    let counters = state.counters.snapshot(0);
    LoadOutcome {
        processed: counters.processed,
        counters,
        error: state.errors.get(),
    }
}

/// [`load_edges_with_sink`] reporting counters through the log.
pub fn load_edges<R>(reader: R, shard: Shard, collab: &Collaborators, opts: &LoadOpts) -> LoadOutcome
where
    R: Read + Send + 'static,
{
    load_edges_with_sink(reader, shard, collab, opts, Box::new(LogSink))
}
