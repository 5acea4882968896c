use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Colored level tag, padded so messages line up.
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => "WARN ".yellow(),
        Level::Info => "INFO ".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".dimmed(),
    }
}

/// `edgeload::pipeline::metrics` → `pipeline::metrics`; the crate root becomes `main`.
pub fn short_target(target: &str) -> &str {
    let name = env!("CARGO_PKG_NAME");
    match target.strip_prefix(name) {
        Some("") => "main",
        Some(rest) => rest.strip_prefix("::").unwrap_or(target),
        None => target,
    }
}

/// Initialize env_logger: this crate at info (debug with `verbose`), dependencies at warn.
/// `RUST_LOG` still applies on top. Safe to call more than once.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let target = short_target(record.target());
            match record.level() {
                Level::Error | Level::Warn => writeln!(
                    buf,
                    "{} {} {}: {}",
                    env!("CARGO_PKG_NAME").cyan(),
                    level_tag(record.level()),
                    target.white(),
                    record.args()
                ),
                level => {
                    let ts = buf.timestamp_millis();
                    writeln!(
                        buf,
                        "{} {} {} {}",
                        ts,
                        level_tag(level),
                        format!("[{target}]").dimmed(),
                        record.args()
                    )
                }
            }
        })
        .try_init();
}
