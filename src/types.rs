//! Public and internal types for the edgeload API and pipeline.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use crate::engine::sharding::fingerprint64;
use crate::error::LoadError;
use crate::utils::config::PipelineConsts;

/// One parsed statement: subject, predicate, object (an id or a literal) and optional graph label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NQuad {
    pub subject: String,
    pub predicate: String,
    /// Object when it names another node (IRI, blank node or bare word).
    pub object_id: Option<String>,
    /// Object when it is a literal value.
    pub object_value: Option<String>,
    pub lang: Option<String>,
    pub datatype: Option<String>,
    pub label: Option<String>,
}

/// Target of a directed edge.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EdgeValue {
    Uid(u64),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

/// Store-facing form of a triple. Keyed by `(entity, attribute)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectedEdge {
    pub entity: u64,
    pub attribute: String,
    pub value: EdgeValue,
    pub label: Option<String>,
}

impl DirectedEdge {
    pub fn key(&self) -> PostingKey {
        PostingKey {
            attribute: self.attribute.clone(),
            entity: self.entity,
        }
    }
}

/// Address of one posting list.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostingKey {
    pub attribute: String,
    pub entity: u64,
}

impl PostingKey {
    pub fn new(entity: u64, attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            entity,
        }
    }
}

impl fmt::Display for PostingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{:#x}", self.attribute, self.entity)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOp {
    Set,
    Del,
}

/// Static partition of the predicate space: this process is instance `instance_idx` of `num_instances`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Shard {
    instance_idx: u64,
    num_instances: u64,
}

impl Shard {
    pub fn new(instance_idx: u64, num_instances: u64) -> Result<Self, LoadError> {
        if num_instances == 0 || instance_idx >= num_instances {
            return Err(LoadError::InvalidShard {
                instance_idx,
                num_instances,
            });
        }
        Ok(Self {
            instance_idx,
            num_instances,
        })
    }

    /// A lone instance owning every predicate.
    pub fn single() -> Self {
        Self {
            instance_idx: 0,
            num_instances: 1,
        }
    }

    pub fn instance_idx(&self) -> u64 {
        self.instance_idx
    }

    pub fn num_instances(&self) -> u64 {
        self.num_instances
    }

    /// True when triples with this predicate belong to this instance.
    pub fn owns(&self, predicate: &str) -> bool {
        fingerprint64(predicate.as_bytes()) % self.num_instances == self.instance_idx
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::single()
    }
}

/// Point-in-time copy of the pipeline counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub read: u64,
    pub parsed: u64,
    pub processed: u64,
    pub ignored: u64,
    /// Parsed triples not yet ignored or processed.
    pub pending: u64,
    /// Triples sitting in the parsed-triple queue.
    pub len_cnq: usize,
}

/// Tuning for one [`load_edges`](crate::load_edges) run.
#[derive(Clone, Debug)]
pub struct LoadOpts {
    /// Mutation workers. The slow stage; posting-list application dominates.
    pub max_routines: usize,
    /// Parse workers. When None, uses the available parallelism.
    pub num_parsers: Option<usize>,
    /// Slots in the line randomization window (at least 1).
    pub window_capacity: usize,
    /// Capacity of both the raw-line and the parsed-triple queue.
    pub channel_cap: usize,
    /// Interval of the counters reporting loop.
    pub metrics_interval: Duration,
    /// Pause between attempts when edge construction fails transiently.
    pub retry_backoff: Duration,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            max_routines: PipelineConsts::DEFAULT_MAX_ROUTINES,
            num_parsers: None,
            window_capacity: PipelineConsts::WINDOW_CAPACITY,
            channel_cap: PipelineConsts::CHANNEL_CAP,
            metrics_interval: PipelineConsts::METRICS_INTERVAL,
            retry_backoff: PipelineConsts::RETRY_BACKOFF,
        }
    }
}

impl LoadOpts {
    /// Parse workers: `num_parsers`, or the machine's available parallelism.
    pub fn parser_threads(&self) -> usize {
        self.num_parsers
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get))
            .max(1)
    }

    pub fn mutation_threads(&self) -> usize {
        self.max_routines.max(1)
    }
}

/// Result of one load run: the final processed count, the final counters, and the first error if any.
///
/// Mutations applied before an error stay applied, so `processed` is meaningful even when `error` is set.
#[derive(Clone, Debug)]
pub struct LoadOutcome {
    pub processed: u64,
    pub counters: CounterSnapshot,
    pub error: Option<LoadError>,
}

impl LoadOutcome {
    pub fn into_result(self) -> Result<u64, LoadError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.processed),
        }
    }
}
