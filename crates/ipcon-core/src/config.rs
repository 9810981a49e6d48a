//! Environment configuration
//!
//! Settings are read from environment variables, falling back to defaults
//! when a variable is unset. Command-line flags override these values.

use std::env;
use thiserror::Error;

/// Maximum number of input lines, `IPCON_MAX_INPUT_LINES`
pub const MAX_INPUT_LINES_VAR: &str = "IPCON_MAX_INPUT_LINES";

/// Download file name, `IPCON_DOWNLOAD_FILENAME`
pub const DOWNLOAD_FILENAME_VAR: &str = "IPCON_DOWNLOAD_FILENAME";

/// Log level for the CLI subscriber, `IPCON_LOG`
pub const LOG_VAR: &str = "IPCON_LOG";

const DEFAULT_MAX_INPUT_LINES: usize = 1_000_000;
const DEFAULT_DOWNLOAD_FILENAME: &str = "consolidated_ranges.txt";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Variable is set but its value cannot be used
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Runtime settings shared by the server and the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on lines accepted per request
    pub max_input_lines: usize,
    /// File name used when results are saved as a download
    pub download_filename: String,
    /// Log level name, if set
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_input_lines = match lookup(MAX_INPUT_LINES_VAR) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: MAX_INPUT_LINES_VAR,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_INPUT_LINES,
        };

        let download_filename = match lookup(DOWNLOAD_FILENAME_VAR) {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: DOWNLOAD_FILENAME_VAR,
                    value: name,
                })
            }
            Some(name) => name,
            None => DEFAULT_DOWNLOAD_FILENAME.to_string(),
        };

        let log_level = match lookup(LOG_VAR) {
            Some(level) => {
                let level = level.trim().to_ascii_lowercase();
                if !matches!(
                    level.as_str(),
                    "error" | "warn" | "info" | "debug" | "trace"
                ) {
                    return Err(ConfigError::InvalidValue {
                        key: LOG_VAR,
                        value: level,
                    });
                }
                Some(level)
            }
            None => None,
        };

        Ok(Self {
            max_input_lines,
            download_filename,
            log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_input_lines: DEFAULT_MAX_INPUT_LINES,
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
            log_level: None,
        }
    }
}
