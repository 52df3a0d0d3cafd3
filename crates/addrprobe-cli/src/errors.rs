//! Error type and process exit codes for the `addrprobe` binary.
//!
//! Exit codes are stable so scripts can tell a data error from a bad
//! configuration:
//! ```text
//! 0   every checker passed
//! 1   data error (watchdog timeout)
//! 2   configuration error
//! 3   step limit reached without termination
//! 64  usage error
//! ```

use std::path::PathBuf;

use addrprobe_core::{ConfigError, RunError};
use thiserror::Error;

/// All checkers passed.
pub const EXIT_PASS: i32 = 0;
/// A checker latched a mismatch and the watchdog terminated the run.
pub const EXIT_DATA_ERROR: i32 = 1;
/// The configuration was rejected or could not be loaded.
pub const EXIT_CONFIG: i32 = 2;
/// The run hit its step limit.
pub const EXIT_STEP_LIMIT: i32 = 3;
/// The command line could not be parsed.
pub const EXIT_USAGE: i32 = 64;

/// Failure of a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed command line.
    #[error("{0}")]
    Usage(String),
    /// The effective configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The run did not terminate.
    #[error(transparent)]
    Run(#[from] RunError),
    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A configuration file is not valid JSON for [`addrprobe_core::EngineConfig`].
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A value could not be rendered as JSON.
    #[error("failed to render JSON: {0}")]
    Render(#[source] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Config(_) | Self::Read { .. } | Self::Parse { .. } | Self::Render(_) => {
                EXIT_CONFIG
            }
            Self::Run(_) => EXIT_STEP_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use addrprobe_core::{ConfigError, RunError};

    use super::{CliError, EXIT_CONFIG, EXIT_STEP_LIMIT, EXIT_USAGE};

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Usage("bad".to_string()).exit_code(), EXIT_USAGE);
        assert_eq!(
            CliError::from(ConfigError::AddressingModeUnset).exit_code(),
            EXIT_CONFIG
        );
        assert_eq!(
            CliError::from(RunError::StepLimit { limit: 10 }).exit_code(),
            EXIT_STEP_LIMIT
        );
    }

    #[test]
    fn read_error_names_the_file() {
        let error = CliError::Read {
            path: PathBuf::from("bench.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(error.to_string(), "failed to read bench.json: missing");
    }

    #[test]
    fn config_error_is_wrapped() {
        let error = CliError::from(ConfigError::UnalignedLength { length: 0x102 });
        assert_eq!(
            error.to_string(),
            "invalid configuration: session length 0x102 is not a multiple of 4 bytes"
        );
    }
}
