//! Command-line options shared by `run` and `config`, and the effective
//! configuration they produce.

use std::path::PathBuf;

use addrprobe_core::{
    timing_profile, AddressingMode, BusDiscipline, EngineConfig, HandshakeTiming,
    DEFAULT_STEP_LIMIT, TIMING_PROFILES,
};

use crate::config_file;
use crate::errors::CliError;

/// A word to overwrite between the write and check phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corruption {
    /// Byte address of the word.
    pub address: u64,
    /// Value written in place of the pattern.
    pub value: u32,
}

/// Options accepted by both commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// JSON configuration file used as the base configuration.
    pub config: Option<PathBuf>,
    /// Bus discipline override.
    pub bus: Option<BusDiscipline>,
    /// Addressing override.
    pub addressing: Option<AddressingMode>,
    /// Interconnect timing override.
    pub timing: Option<HandshakeTiming>,
    /// Interconnect decoded-address-bit override.
    pub address_bits: Option<u32>,
    /// Watchdog window override.
    pub watchdog: Option<u64>,
    /// Writer quiescence override.
    pub quiescent: Option<u32>,
    /// Words corrupted before the checkers run.
    pub corruptions: Vec<Corruption>,
    /// Steps allowed before the run is abandoned.
    pub step_limit: u64,
    /// Print every read sample.
    pub verbose: bool,
    /// Print the report as JSON.
    pub json: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: None,
            bus: None,
            addressing: None,
            timing: None,
            address_bits: None,
            watchdog: None,
            quiescent: None,
            corruptions: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
            verbose: false,
            json: false,
        }
    }
}

impl RunOptions {
    /// Applies one option and its value.
    ///
    /// Returns `Ok(false)` when `flag` is not a known option.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Usage`] for a missing or malformed value.
    pub fn apply(
        &mut self,
        flag: &str,
        value: &mut impl Iterator<Item = String>,
    ) -> Result<bool, CliError> {
        let mut next = || {
            value
                .next()
                .ok_or_else(|| CliError::Usage(format!("missing value for {flag}")))
        };

        match flag {
            "--verbose" | "-v" => self.verbose = true,
            "--json" => self.json = true,
            "--config" | "-c" => self.config = Some(PathBuf::from(next()?)),
            "--bus" => {
                let name = next()?;
                self.bus = Some(BusDiscipline::from_name(&name).ok_or_else(|| {
                    CliError::Usage(format!("unknown bus: {name} (expected split or unified)"))
                })?);
            }
            "--addressing" => {
                let name = next()?;
                self.addressing = Some(AddressingMode::from_name(&name).ok_or_else(|| {
                    CliError::Usage(format!("unknown addressing: {name} (expected byte or word)"))
                })?);
            }
            "--timing" => {
                let name = next()?;
                self.timing = Some(timing_profile(&name).ok_or_else(|| {
                    let known: Vec<&str> =
                        TIMING_PROFILES.iter().map(|(known, _)| *known).collect();
                    CliError::Usage(format!(
                        "unknown timing profile: {name} (expected one of {})",
                        known.join(", ")
                    ))
                })?);
            }
            "--address-bits" => self.address_bits = Some(parse_narrow(flag, &next()?)?),
            "--watchdog" => self.watchdog = Some(parse_number(flag, &next()?)?),
            "--quiescent" => self.quiescent = Some(parse_narrow(flag, &next()?)?),
            "--step-limit" => self.step_limit = parse_number(flag, &next()?)?,
            "--corrupt" => self.corruptions.push(parse_corruption(&next()?)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Builds and validates the configuration these options describe.
    ///
    /// The base is the configuration file when given, otherwise the default
    /// configuration for the selected bus. Command-line overrides win.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when the file cannot be loaded or the resulting
    /// configuration is invalid.
    pub fn effective_config(&self) -> Result<EngineConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => config_file::load(path)?,
            None => self
                .bus
                .map_or_else(EngineConfig::default, EngineConfig::for_discipline),
        };

        if let Some(bus) = self.bus {
            config.discipline = bus;
        }
        if let Some(mode) = self.addressing {
            config.addressing = Some(mode);
        }
        if let Some(timing) = self.timing {
            config.timing = timing;
        }
        if let Some(bits) = self.address_bits {
            config.interconnect_address_bits = bits;
        }
        if let Some(window) = self.watchdog {
            config.watchdog_window = window;
        }
        if let Some(cycles) = self.quiescent {
            config.quiescent_cycles = cycles;
        }
        config.verbose |= self.verbose;

        config.validate()?;
        Ok(config)
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal number; `_` separators are allowed.
///
/// # Errors
///
/// Returns [`CliError::Usage`] naming `flag` when `text` is not a number.
pub fn parse_number(flag: &str, text: &str) -> Result<u64, CliError> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|_| CliError::Usage(format!("invalid number for {flag}: {text}")))
}

fn parse_narrow<T: TryFrom<u64>>(flag: &str, text: &str) -> Result<T, CliError> {
    T::try_from(parse_number(flag, text)?)
        .map_err(|_| CliError::Usage(format!("value out of range for {flag}: {text}")))
}

/// Parses `<address>=<value>`.
///
/// # Errors
///
/// Returns [`CliError::Usage`] when either side is missing or malformed.
pub fn parse_corruption(text: &str) -> Result<Corruption, CliError> {
    let (address, value) = text
        .split_once('=')
        .ok_or_else(|| CliError::Usage(format!("expected <addr>=<value> for --corrupt: {text}")))?;
    Ok(Corruption {
        address: parse_number("--corrupt", address)?,
        value: parse_narrow("--corrupt", value)?,
    })
}
