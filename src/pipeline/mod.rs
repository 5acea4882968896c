//! Pipeline components: shared state, line source, parse and mutation stages, metrics, orchestration.

pub mod context;
pub mod counters;
pub mod error_handler;
pub mod metrics;
pub mod mutate;
pub mod orchestrator;
pub mod parse;
pub mod reader;

pub use context::{
    Collaborators, PipelineChannels, PipelineState, create_pipeline_channels, send_unless_stopped,
};
pub use counters::Counters;
pub use error_handler::ErrorRegister;
pub use metrics::{LogSink, MetricsHandle, MetricsSink, spawn_metrics_loop};
pub use mutate::{spawn_mutation_workers, to_edge_with_retry};
pub use orchestrator::{load_edges, load_edges_with_sink};
pub use parse::spawn_parse_workers;
pub use reader::{read_lines, spawn_line_source};
