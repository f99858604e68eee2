//! # Config - window store settings
//!
//! All settings have defaults and can be overridden from the environment:
//!
//! ```text
//! EDDY_WINDOW_SIZE_MS      window length in ms          (default: 60000)
//! EDDY_SEGMENT_INTERVAL_MS segment length in ms         (default: 3600000)
//! EDDY_KEY_SCHEMA          window | key-first | time-first (default: window)
//! EDDY_RETAIN_DUPLICATES   keep every put of a window   (default: false)
//! ```
//!
//! Unset variables fall back to the default. A variable that is set but does
//! not parse is an error rather than a silent fallback.

use std::str::FromStr;
use thiserror::Error;
use windowkey::KeySchema;

pub const ENV_WINDOW_SIZE: &str = "EDDY_WINDOW_SIZE_MS";
pub const ENV_SEGMENT_INTERVAL: &str = "EDDY_SEGMENT_INTERVAL_MS";
pub const ENV_KEY_SCHEMA: &str = "EDDY_KEY_SCHEMA";
pub const ENV_RETAIN_DUPLICATES: &str = "EDDY_RETAIN_DUPLICATES";

pub const DEFAULT_WINDOW_SIZE_MS: i64 = 60_000;
pub const DEFAULT_SEGMENT_INTERVAL_MS: i64 = 3_600_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Parse {
        var: String,
        value: String,
        reason: String,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },
}

/// Settings of a caching window store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Length of every window; decoding rebuilds `end = start + window_size`.
    pub window_size: i64,
    /// Width of one store segment, in ms of window start.
    pub segment_interval: i64,
    pub schema: KeySchema,
    /// Give every put its own sequence number instead of overwriting.
    pub retain_duplicates: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE_MS,
            segment_interval: DEFAULT_SEGMENT_INTERVAL_MS,
            schema: KeySchema::default(),
            retain_duplicates: false,
        }
    }
}

impl StoreConfig {
    /// Reads the `EDDY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup, then validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            window_size: parse_or(&lookup, ENV_WINDOW_SIZE, defaults.window_size)?,
            segment_interval: parse_or(&lookup, ENV_SEGMENT_INTERVAL, defaults.segment_interval)?,
            schema: parse_or(&lookup, ENV_KEY_SCHEMA, defaults.schema)?,
            retain_duplicates: parse_or(
                &lookup,
                ENV_RETAIN_DUPLICATES,
                defaults.retain_duplicates,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size <= 0 {
            return Err(ConfigError::NotPositive {
                field: "window_size",
                value: self.window_size,
            });
        }
        if self.segment_interval <= 0 {
            return Err(ConfigError::NotPositive {
                field: "segment_interval",
                value: self.segment_interval,
            });
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            var: var.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
