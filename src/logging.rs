//! Setting up logging for the command line tools.
//!
//! The library logs through the `log` facade. The tools install a tracing
//! subscriber that also picks up those records and writes them to stderr
//! tagged with the source file and line. Colours are only used if stderr
//! is a terminal.

use std::io;
use std::io::IsTerminal;
use std::sync::Once;
use tracing_subscriber::EnvFilter;


/// The log filter used if `RUST_LOG` isn’t set and we aren’t verbose.
const DEFAULT_FILTER: &str = "warn";

/// The log filter used in verbose mode.
const VERBOSE_FILTER: &str = "debug";

static INIT: Once = Once::new();

/// Initializes logging.
///
/// Only the first call has any effect. If `verbose` is `true`, debug
/// messages are shown. Otherwise the filter is taken from the `RUST_LOG`
/// environment variable, falling back to warnings and errors only.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = if verbose {
            EnvFilter::new(VERBOSE_FILTER)
        }
        else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(DEFAULT_FILTER)
            })
        };
        let res = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .try_init();
        if let Err(err) = res {
            eprintln!("Failed to initialize logging: {}", err);
        }
    })
}


//============ Tests =========================================================
