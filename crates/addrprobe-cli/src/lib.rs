//! Library side of the `addrprobe` command-line runner.

use env_logger as _;

/// JSON configuration file loading and rendering.
pub mod config_file;
/// CLI error type and exit codes.
pub mod errors;
/// Command-line options and the effective configuration.
pub mod options;
/// Trace console output and run reports.
pub mod report;

pub use errors::CliError;
pub use options::{Corruption, RunOptions};
pub use report::ConsoleSink;
