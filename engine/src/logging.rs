//! Logger setup for the engine and the `qtemplate` binary
//!
//! Records go to stderr as `[LEVEL] target - message`. Levels in use:
//!
//! - `warn!` - records skipped by `--keep-going`
//! - `info!` - batch progress
//! - `debug!` - parse summaries, macro overrides, undefined variables
//! - `trace!` - loop iterations and output sizes
//!
//! `RUST_LOG` takes precedence over the level picked with `-v`:
//!
//! ```bash
//! RUST_LOG=engine::macro_system=trace qtemplate resolve insert.gql --data rows.json
//! ```

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Level for `-v` given `verbose` times
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger at `level` unless `RUST_LOG` is set.
///
/// Only the first call has an effect.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::from_env(Env::default().default_filter_or(level.to_string()))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Logger for test binaries; output is captured by the harness.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(7), LevelFilter::Trace);
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        log::debug!("not shown at warn level");
    }
}
