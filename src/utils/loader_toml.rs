//! Load `.edgeload.toml` (CLI only). The library takes its settings through [`LoadOpts`](crate::LoadOpts).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::engine::arg_parser::RunSettings;

#[derive(Debug, Default, Deserialize)]
pub struct LoaderToml {
    #[serde(default)]
    settings: LoadSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoadSection {
    instance_idx: Option<u64>,
    num_instances: Option<u64>,
    max_routines: Option<usize>,
    num_parsers: Option<usize>,
    window_capacity: Option<usize>,
    channel_cap: Option<usize>,
    metrics_interval_ms: Option<u64>,
    retry_backoff_us: Option<u64>,
    verbose: Option<bool>,
    progress: Option<bool>,
}

/// Parse config text. Errors name the offending key.
pub fn parse_loader_toml(text: &str) -> Result<LoaderToml, toml::de::Error> {
    toml::from_str(text)
}

/// Load the config file at `path`. A missing file is `Ok(None)` unless `required` (an explicit
/// `--config`). A file that exists but does not parse is an error, never skipped.
pub fn load_loader_toml(path: &Path, required: bool) -> Result<Option<LoaderToml>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("read config file {}", path.display()));
        }
    };
    let file = parse_loader_toml(&text)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $run:expr, $sec_field:ident => $($run_field:ident).+) => {
        if let Some(v) = $sec.$sec_field {
            $run.$($run_field).+ = v;
        }
    };
}

/// Apply file config to run settings (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_settings(file: &LoaderToml, run: &mut RunSettings) {
    let sec = &file.settings;
    apply_file_opt!(sec, run, instance_idx => instance_idx);
    apply_file_opt!(sec, run, num_instances => num_instances);
    apply_file_opt!(sec, run, max_routines => opts.max_routines);
    if let Some(n) = sec.num_parsers {
        run.opts.num_parsers = Some(n);
    }
    apply_file_opt!(sec, run, window_capacity => opts.window_capacity);
    apply_file_opt!(sec, run, channel_cap => opts.channel_cap);
    if let Some(ms) = sec.metrics_interval_ms {
        run.opts.metrics_interval = Duration::from_millis(ms);
    }
    if let Some(us) = sec.retry_backoff_us {
        run.opts.retry_backoff = Duration::from_micros(us);
    }
    apply_file_opt!(sec, run, verbose => verbose);
    apply_file_opt!(sec, run, progress => progress);
}
