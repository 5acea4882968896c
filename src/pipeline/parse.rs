use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::NQuad;
use crate::engine::rdf::LineParser;

use super::context::{PipelineState, send_unless_stopped};

/// Single parse worker: read lines from `line_rx`, parse, send triples on `nquad_tx`.
/// Stops on the first parse error (recorded in the register) or once the register is set.
fn parse_worker_loop(
    line_rx: Receiver<String>,
    nquad_tx: Sender<NQuad>,
    parser: Arc<dyn LineParser>,
    state: Arc<PipelineState>,
) {
    while let Ok(line) = line_rx.recv() {
        if state.errors.is_set() {
            return;
        }
        let line = line.trim();
        if line.is_empty() {
            log::debug!("Empty line.");
            continue;
        }
        log::trace!("Got line: {:?}", line);
        match parser.parse(line) {
            Ok(nq) => {
                // Count before handing off so parsed never trails processed + ignored.
                state.counters.incr_parsed();
                if !send_unless_stopped(&nquad_tx, nq, &state.errors) {
                    return;
                }
            }
            Err(err) => {
                log::error!("{}", err);
                state.errors.set(err.into());
                return;
            }
        }
    }
}

/// Spawn parse workers. The caller keeps the original `nquad_tx` and drops it only after joining
/// every handle returned here; that drop is what closes the triple queue.
pub fn spawn_parse_workers(
    line_rx: &Receiver<String>,
    nquad_tx: &Sender<NQuad>,
    parser: &Arc<dyn LineParser>,
    state: &Arc<PipelineState>,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_threads)
        .map(|_| {
            let line_rx = line_rx.clone();
            let nquad_tx = nquad_tx.clone();
            let parser = Arc::clone(parser);
            let state = Arc::clone(state);
            thread::spawn(move || parse_worker_loop(line_rx, nquad_tx, parser, state))
        })
        .collect()
}
