//! Pipeline context: shared state, queues and collaborators passed into the stage threads.

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::edge::EdgeBuilder;
use crate::engine::rdf::LineParser;
use crate::engine::store::PostingStore;
use crate::{NQuad, Shard};

use super::counters::Counters;
use super::error_handler::ErrorRegister;

/// How often a producer blocked on a full queue re-checks the error register.
const STOP_POLL: Duration = Duration::from_millis(50);

/// External pieces the pipeline drives. Passed in explicitly; the pipeline keeps no global state.
#[derive(Clone)]
pub struct Collaborators {
    pub parser: Arc<dyn LineParser>,
    pub edges: Arc<dyn EdgeBuilder>,
    pub store: Arc<dyn PostingStore>,
}

/// State shared by every stage of one load run. Created per run, dropped when the run returns.
#[derive(Debug)]
pub struct PipelineState {
    pub shard: Shard,
    pub counters: Counters,
    pub errors: ErrorRegister,
}

impl PipelineState {
    pub fn new(shard: Shard) -> Arc<Self> {
        Arc::new(Self {
            shard,
            counters: Counters::default(),
            errors: ErrorRegister::new(),
        })
    }
}

/// The two bounded queues. Reader gets `line_tx`; parsers get `line_rx` + `nquad_tx`; mutators get `nquad_rx`.
pub struct PipelineChannels {
    pub line_tx: Sender<String>,
    pub line_rx: Receiver<String>,
    pub nquad_tx: Sender<NQuad>,
    pub nquad_rx: Receiver<NQuad>,
}

pub fn create_pipeline_channels(channel_cap: usize) -> PipelineChannels {
    let (line_tx, line_rx) = bounded::<String>(channel_cap.max(1));
    let (nquad_tx, nquad_rx) = bounded::<NQuad>(channel_cap.max(1));
    PipelineChannels {
        line_tx,
        line_rx,
        nquad_tx,
        nquad_rx,
    }
}

/// Send `item`, blocking while the queue is full. Returns false when the item was not delivered:
/// every receiver is gone, or an error was recorded while waiting for a slot.
pub fn send_unless_stopped<T>(tx: &Sender<T>, mut item: T, errors: &ErrorRegister) -> bool {
    loop {
        match tx.send_timeout(item, STOP_POLL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Disconnected(_)) => return false,
            Err(SendTimeoutError::Timeout(back)) => {
                if errors.is_set() {
                    return false;
                }
                item = back;
            }
        }
    }
}
