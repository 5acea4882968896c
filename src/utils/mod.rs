pub mod config;
pub mod loader_toml;
pub mod logger;

pub use config::*;
pub use loader_toml::{LoaderToml, apply_file_to_settings, load_loader_toml, parse_loader_toml};
pub use logger::setup_logging;
