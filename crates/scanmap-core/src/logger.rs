//! Console logging for the calibration bench tool.
//!
//! Records from the `scanmap*` crates print at the level chosen on the
//! command line. Everything else is capped at `Warn` unless trace output
//! was requested, so a `-vv` run shows mapping steps without dependency
//! chatter. Lines look like `[  0.012s  INFO roi::mapping] message`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const CRATE_PREFIX: &str = "scanmap";

/// Default directives when `RUST_LOG` is unset.
#[cfg(feature = "tracing")]
const DEFAULT_DIRECTIVES: &str =
    "warn,scanmap=info,scanmap_core=info,scanmap_optics=info,scanmap_roi=info";

struct BenchConsole {
    level: LevelFilter,
    foreign: LevelFilter,
    started: Instant,
}

impl BenchConsole {
    fn new(level: LevelFilter) -> Self {
        let foreign = if level == LevelFilter::Trace {
            LevelFilter::Trace
        } else {
            level.min(LevelFilter::Warn)
        };
        Self {
            level,
            foreign,
            started: Instant::now(),
        }
    }

    fn limit_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(CRATE_PREFIX) {
            self.level
        } else {
            self.foreign
        }
    }
}

/// `scanmap_roi::mapping` -> `roi::mapping`; foreign targets are kept whole.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix("scanmap_")
        .or_else(|| target.strip_prefix(CRATE_PREFIX))
        .map(|rest| rest.trim_start_matches("::"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(target)
}

impl Log for BenchConsole {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static CONSOLE: OnceLock<BenchConsole> = OnceLock::new();

/// Install the bench console with `level` for the scanmap crates.
///
/// The first call wins; the tool may call this again after re-reading its
/// arguments without failing.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if CONSOLE.get().is_none() {
        let console = CONSOLE.get_or_init(|| BenchConsole::new(level));
        log::set_logger(console)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Map a `-v` repetition count onto a level filter (0 = warn).
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install a `tracing` subscriber; `RUST_LOG` overrides the scanmap defaults.
///
/// Spans are reported when they close, which times each mapping request.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn enabled(console: &BenchConsole, target: &str, level: Level) -> bool {
        console.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn verbosity_maps_to_increasing_levels() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_from_verbosity(1), LevelFilter::Info);
        assert_eq!(level_from_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn dependency_records_are_capped_below_trace() {
        let console = BenchConsole::new(LevelFilter::Debug);
        assert!(enabled(&console, "scanmap_roi::mapping", Level::Debug));
        assert!(!enabled(&console, "serde_json::de", Level::Debug));
        assert!(enabled(&console, "serde_json::de", Level::Warn));

        let quiet = BenchConsole::new(LevelFilter::Error);
        assert!(!enabled(&quiet, "other", Level::Warn));

        let trace = BenchConsole::new(LevelFilter::Trace);
        assert!(enabled(&trace, "serde_json::de", Level::Trace));
    }

    #[test]
    fn targets_drop_the_workspace_prefix() {
        assert_eq!(short_target("scanmap_roi::mapping"), "roi::mapping");
        assert_eq!(short_target("scanmap::cli"), "cli");
        assert_eq!(short_target("scanmap"), "scanmap");
        assert_eq!(short_target("clap_builder"), "clap_builder");
    }

    #[test]
    fn repeated_init_is_a_no_op() {
        init_with_level(LevelFilter::Info).expect("first init");
        init_with_level(LevelFilter::Debug).expect("second init");
        log::info!("console installed");
    }
}
