//! Progress counter for the CLI, fed by the metrics loop.

use kdam::{Animation, Bar, BarExt};

use crate::CounterSnapshot;
use crate::pipeline::MetricsSink;

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> Bar {
    kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " triples"
    )
}

/// [`MetricsSink`] that moves a kdam counter to the processed count and shows the rest as postfix.
pub struct ProgressSink {
    bar: Bar,
    shown: u64,
}

impl ProgressSink {
    pub fn new(desc: &'static str) -> Self {
        let mut bar = create_counter(desc);
        let _ = bar.refresh();
        Self { bar, shown: 0 }
    }
}

impl MetricsSink for ProgressSink {
    fn emit(&mut self, s: &CounterSnapshot) {
        self.bar.postfix = format!(
            "read={} parsed={} ignored={} pending={}",
            s.read, s.parsed, s.ignored, s.pending
        );
        let delta = s.processed.saturating_sub(self.shown);
        self.shown = s.processed;
        let _ = self.bar.update(delta as usize);
    }
}

impl Drop for ProgressSink {
    fn drop(&mut self) {
        let _ = self.bar.refresh();
        eprintln!();
    }
}
