//! Diagnostic logging via the `log` facade and `env_logger`.
//!
//! Progress lines (walking, caching, thumbing, ...) are not logs: they go to
//! stdout through [`output`](crate::output). Logs go to stderr and carry
//! warnings (unreadable files, failed writes, key collisions) and debug detail.
//!
//! Level priority:
//!
//! 1. `RUST_LOG` (if set)
//! 2. `--quiet` → errors only, `-v` → debug, `-vv` → trace
//! 3. Default: info

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Install the global logger. Call once, before any scan work.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{style}{level:<5}{style:#} [{}] {}",
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        }
    });

    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
    log::debug!("Logging initialized at level: {:?}", log::max_level());
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
