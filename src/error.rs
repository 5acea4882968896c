//! Error types for the load pipeline and its collaborators.

use thiserror::Error;

/// A line that could not be turned into a triple.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("parse error at column {column}: {reason} (line: {line:?})")]
pub struct ParseError {
    pub line: String,
    pub column: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: &str, column: usize, reason: impl Into<String>) -> Self {
        Self {
            line: line.to_string(),
            column,
            reason: reason.into(),
        }
    }
}

/// Failure while converting a triple into a directed edge.
///
/// `Transient` means the same call is expected to succeed if retried; the mutation
/// stage retries it without limit. `Permanent` stops the worker.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EdgeError {
    #[error("temporary error: {0}")]
    Transient(String),
    #[error("{0}")]
    Permanent(String),
}

impl EdgeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EdgeError::Transient(_))
    }
}

/// Failure reported by a posting-list store while applying a mutation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("store error on {key}: {reason}")]
pub struct StoreError {
    pub key: String,
    pub reason: String,
}

/// First error of a load run, as held by the error register and returned to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("while converting to edge (subject {subject:?}, predicate {predicate:?}): {source}")]
    Edge {
        subject: String,
        predicate: String,
        #[source]
        source: EdgeError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid shard: instance {instance_idx} of {num_instances}")]
    InvalidShard {
        instance_idx: u64,
        num_instances: u64,
    },
}
