//! JSON configuration files.
//!
//! Every field is optional at any depth; missing fields take the
//! [`EngineConfig`] default, so a file only needs to name what it changes:
//! ```text
//! { "discipline": "unified-channel", "addressing": "word", "watchdog_window": 64 }
//! ```

use std::fs;
use std::path::Path;

use addrprobe_core::EngineConfig;
use serde_json::Value;

use crate::errors::CliError;

/// Loads a configuration file.
///
/// # Errors
///
/// Returns [`CliError::Read`] or [`CliError::Parse`] naming `path`.
pub fn load(path: &Path) -> Result<EngineConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let overrides: Value = serde_json::from_str(&text).map_err(parse_error)?;
    let mut merged = serde_json::to_value(EngineConfig::default()).map_err(CliError::Render)?;
    overlay(&mut merged, overrides);
    let config = serde_json::from_value(merged).map_err(parse_error)?;
    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

/// Replaces the leaves of `base` named in `overrides`, recursing into objects
/// so a partial region such as `{ "low": { "seed": 1 } }` keeps the other fields.
fn overlay(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// Renders `config` as pretty-printed JSON accepted by [`load`].
///
/// # Errors
///
/// Returns [`CliError::Render`] if serialization fails.
pub fn render(config: &EngineConfig) -> Result<String, CliError> {
    serde_json::to_string_pretty(config).map_err(CliError::Render)
}
