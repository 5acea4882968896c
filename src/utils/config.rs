//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the working directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Pipeline ----

/// Defaults for the load pipeline.
pub struct PipelineConsts;

impl PipelineConsts {
    /// Lines held back by the reader to break up runs of the same subject.
    pub const WINDOW_CAPACITY: usize = 1000;
    /// Capacity of the raw-line and parsed-triple queues. Bounds memory regardless of input size.
    pub const CHANNEL_CAP: usize = 10_000;
    /// Mutation workers. Applying to posting lists is the slow part.
    pub const DEFAULT_MAX_ROUTINES: usize = 3000;
    /// Counters reporting interval.
    pub const METRICS_INTERVAL: Duration = Duration::from_secs(1);
    /// Sleep between edge construction attempts after a transient failure.
    pub const RETRY_BACKOFF: Duration = Duration::from_micros(1);
    /// Exit code when the input stream cannot be read.
    pub const FATAL_READ_EXIT_CODE: i32 = 1;
}

// ---- Store ----

/// First uid handed out by the uid assigner. 0 is never a valid uid.
pub const FIRST_UID: u64 = 1;

/// Prefix of subjects/objects that carry a literal uid, e.g. `_uid_:0x1f`.
pub const UID_PREFIX: &str = "_uid_:";
