//! Periodic counters reporting. Purely observational: nothing here feeds back into the pipeline.

use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::{CounterSnapshot, NQuad};

use super::context::PipelineState;

/// Receives counter snapshots from the reporting loop.
pub trait MetricsSink: Send {
    fn emit(&mut self, snapshot: &CounterSnapshot);
}

/// Default sink: one `info` log record per snapshot.
#[derive(Debug, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn emit(&mut self, s: &CounterSnapshot) {
        log::info!(
            "Counters read={} parsed={} processed={} ignored={} pending={} len_cnq={}",
            s.read,
            s.parsed,
            s.processed,
            s.ignored,
            s.pending,
            s.len_cnq
        );
    }
}

/// Running reporting loop. Call [`MetricsHandle::stop`] to end it.
pub struct MetricsHandle {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl MetricsHandle {
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            log::warn!("metrics thread panicked");
        }
    }
}

/// Emit a snapshot every `interval`, but only when `processed` moved since the last one
/// (an idle or stalled pipeline stays quiet).
pub fn spawn_metrics_loop(
    state: Arc<PipelineState>,
    nquad_queue: Receiver<NQuad>,
    interval: Duration,
    mut sink: Box<dyn MetricsSink>,
) -> MetricsHandle {
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let handle = thread::spawn(move || {
        let ticker = tick(interval);
        let mut prev = 0_u64;
        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    let snapshot = state.counters.snapshot(nquad_queue.len());
                    if snapshot.processed == prev {
                        continue;
                    }
                    prev = snapshot.processed;
                    sink.emit(&snapshot);
                }
            }
        }
    });
    MetricsHandle { stop_tx, handle }
}
