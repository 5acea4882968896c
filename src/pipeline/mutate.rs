//! Mutation stage: shard filter, edge construction with retry, and posting-list apply.

use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{EdgeError, LoadError};
use crate::{DirectedEdge, MutationOp, NQuad};

use super::context::{Collaborators, PipelineState};

/// Build the edge for `nq`, retrying transient failures with `backoff` between attempts.
///
/// There is no attempt limit: a store that stays transiently unavailable keeps this worker here.
pub fn to_edge_with_retry(
    collab: &Collaborators,
    nq: &NQuad,
    backoff: Duration,
) -> Result<DirectedEdge, EdgeError> {
    loop {
        match collab.edges.to_edge(nq) {
            Err(err) if err.is_transient() => {
                log::trace!("retrying {} {}: {}", nq.subject, nq.predicate, err);
                thread::sleep(backoff);
            }
            other => return other,
        }
    }
}

/// Handle one owned triple end to end. Returns Err with the error to record on failure.
fn apply_nquad(
    collab: &Collaborators,
    nq: &NQuad,
    backoff: Duration,
) -> Result<(), LoadError> {
    let edge = to_edge_with_retry(collab, nq, backoff).map_err(|source| {
        log::error!("While converting to edge: {} (nq: {:?})", source, nq);
        LoadError::Edge {
            subject: nq.subject.clone(),
            predicate: nq.predicate.clone(),
            source,
        }
    })?;

    let key = edge.key();
    let lease = collab.store.get_or_create(&key);
    let applied = lease.list().add_mutation_with_index(&edge, MutationOp::Set);
    // Release right away; held leases keep the list from being evicted.
    lease.release();

    applied.map(|_| ()).map_err(|err| {
        log::error!("While applying edge to {}: {}", key, err);
        LoadError::from(err)
    })
}

/// Single mutation worker: read triples from `nquad_rx` until the queue closes or an error is recorded.
fn mutation_worker_loop(
    nquad_rx: Receiver<NQuad>,
    collab: Collaborators,
    state: Arc<PipelineState>,
    backoff: Duration,
) {
    while let Ok(nq) = nquad_rx.recv() {
        if state.errors.is_set() {
            return;
        }
        // Only handle this edge if the attribute satisfies the modulo rule.
        if !state.shard.owns(&nq.predicate) {
            state.counters.incr_ignored();
            continue;
        }
        if let Err(err) = apply_nquad(&collab, &nq, backoff) {
            state.errors.set(err);
            return;
        }
        state.counters.incr_processed();
    }
}

/// Spawn mutation workers. They exit once every sender of `nquad_rx` is dropped and the queue drains.
pub fn spawn_mutation_workers(
    nquad_rx: &Receiver<NQuad>,
    collab: &Collaborators,
    state: &Arc<PipelineState>,
    num_threads: usize,
    backoff: Duration,
) -> Vec<JoinHandle<()>> {
    (0..num_threads)
        .map(|_| {
            let nquad_rx = nquad_rx.clone();
            let collab = collab.clone();
            let state = Arc::clone(state);
            thread::spawn(move || mutation_worker_loop(nquad_rx, collab, state, backoff))
        })
        .collect()
}
