//! Engine module: collaborators the pipeline drives, and the CLI around it.

pub mod arg_parser;
pub mod edge;
pub mod handlers;
pub mod progress;
pub mod rdf;
pub mod sharding;
pub mod store;
pub mod uid;

// Re-export commonly used items
pub use arg_parser::{Cli, RunSettings};
pub use edge::{EdgeBuilder, UidEdgeBuilder};
pub use handlers::handle_run;
pub use progress::ProgressSink;
pub use rdf::{LineParser, RdfParser, parse_nquad};
pub use sharding::{fingerprint64, owner_of};
pub use store::{Lease, MemStore, PostingList, PostingStore, StoreStats, tokenize};
pub use uid::UidAssigner;
