use clap::Parser;
use std::path::PathBuf;

use crate::LoadOpts;
use crate::utils::config::PackagePaths;

/// Bulk-load triple statements into posting lists.
#[derive(Clone, Parser)]
#[command(name = "edgeload")]
#[command(about = "Load N-Quad files into sharded posting lists. Use - to read stdin.")]
pub struct Cli {
    /// Input files, loaded in order. `-` reads stdin.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Index of this instance in a partitioned load (0-based).
    #[arg(long, short = 'i')]
    pub instance_idx: Option<u64>,

    /// Total number of instances in a partitioned load.
    #[arg(long, short = 'n')]
    pub num_instances: Option<u64>,

    /// Maximum number of concurrent mutation workers.
    #[arg(long)]
    pub max_routines: Option<usize>,

    /// Parse workers. Default: available parallelism.
    #[arg(long, short = 'p')]
    pub parsers: Option<usize>,

    /// Lines held in the randomization window.
    #[arg(long, short = 'w')]
    pub window: Option<usize>,

    /// Config file. Default: `.edgeload.toml` in the current directory, if present.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Show a live progress counter instead of periodic counter log lines.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Print the final summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Config file path, defaulting to the package config filename in the working directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()))
    }
}

/// Effective settings for one CLI run: defaults, then config file, then flags.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub instance_idx: u64,
    pub num_instances: u64,
    pub opts: LoadOpts,
    pub verbose: bool,
    pub progress: bool,
    pub json: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            instance_idx: 0,
            num_instances: 1,
            opts: LoadOpts::default(),
            verbose: false,
            progress: false,
            json: false,
        }
    }
}

/// Overwrite settings field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $run:expr, $cli_field:ident => $($run_field:ident).+) => {
        if let Some(v) = $cli.$cli_field {
            $run.$($run_field).+ = v;
        }
    };
}

/// Apply CLI flags on top of `run` (flags win over the config file).
pub fn apply_cli_to_settings(cli: &Cli, run: &mut RunSettings) {
    apply_cli_opt!(cli, run, instance_idx => instance_idx);
    apply_cli_opt!(cli, run, num_instances => num_instances);
    apply_cli_opt!(cli, run, max_routines => opts.max_routines);
    if let Some(n) = cli.parsers {
        run.opts.num_parsers = Some(n);
    }
    apply_cli_opt!(cli, run, window => opts.window_capacity);
    apply_cli_opt!(cli, run, verbose => verbose);
    apply_cli_opt!(cli, run, progress => progress);
    run.json = cli.json;
}
