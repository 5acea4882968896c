//! Edgeload: bulk loader turning triple statements into sharded posting-list mutations.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{EdgeError, LoadError, ParseError, StoreError};
pub use pipeline::{Collaborators, LogSink, MetricsSink};
pub use types::*;

use std::io::Read;

/// Result alias used by the CLI-facing API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: load every statement of `reader` into `collab.store`, applying only the
/// predicates `shard` owns.
///
/// Blocks until the input is exhausted (or the first error stops the pipeline) and every worker
/// has exited. The returned [`LoadOutcome`] carries the final processed count and the first error;
/// mutations applied before an error are not rolled back.
///
/// ```ignore
/// let store = Arc::new(MemStore::new());
/// let collab = Collaborators {
///     parser: Arc::new(RdfParser),
///     edges: Arc::new(UidEdgeBuilder::default()),
///     store: store.clone(),
/// };
/// let outcome = edgeload::load_edges(file, Shard::new(0, 2)?, &collab, &LoadOpts::default());
/// let processed = outcome.into_result()?;
/// ```
pub fn load_edges<R>(
    reader: R,
    shard: Shard,
    collab: &Collaborators,
    opts: &LoadOpts,
) -> LoadOutcome
where
    R: Read + Send + 'static,
{
    log::debug!(
        "{} CONFIG: {:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::load_edges(reader, shard, collab, opts)
}
