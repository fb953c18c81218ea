use std::error::Error;
use std::fmt;

use tally_runtime::{DEFAULT_SKIP_FRAMES, TagMatching};

pub const ENV_ENABLED: &str = "TALLY_ENABLED";
pub const ENV_CAPTURE: &str = "TALLY_CAPTURE";
pub const ENV_SKIP_FRAMES: &str = "TALLY_SKIP_FRAMES";
pub const ENV_TAG_MATCHING: &str = "TALLY_TAG_MATCHING";

/// Where the tracker gets the call stack for a tracked call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// `#[track_caller]` location of the public method's caller.
    #[default]
    Caller,
    /// Symbolized backtrace; the caller is found by skipping the tracker's
    /// own frames.
    Backtrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub enabled: bool,
    pub capture: CaptureMode,
    /// Frames skipped in [`CaptureMode::Backtrace`]. Ignored otherwise.
    pub backtrace_skip_frames: usize,
    pub tag_matching: TagMatching,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture: CaptureMode::Caller,
            backtrace_skip_frames: DEFAULT_SKIP_FRAMES,
            tag_matching: TagMatching::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { var, value, expected } => {
                write!(f, "invalid {var}={value:?}: expected {expected}")
            }
        }
    }
}

impl Error for ConfigError {}

impl TrackerConfig {
    /// Read `TALLY_*` variables from the process environment, falling back to
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let value = |var: &'static str| {
            lookup(var)
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
                .map(|raw| (var, raw))
        };

        let enabled = match value(ENV_ENABLED) {
            Some((var, raw)) => parse_bool(var, &raw)?,
            None => defaults.enabled,
        };
        let capture = match value(ENV_CAPTURE) {
            Some((var, raw)) => match raw.to_ascii_lowercase().as_str() {
                "caller" => CaptureMode::Caller,
                "backtrace" => CaptureMode::Backtrace,
                _ => return Err(invalid(var, raw, "`caller` or `backtrace`")),
            },
            None => defaults.capture,
        };
        let backtrace_skip_frames = match value(ENV_SKIP_FRAMES) {
            Some((var, raw)) => raw
                .parse::<usize>()
                .map_err(|_| invalid(var, raw, "a non-negative integer"))?,
            None => defaults.backtrace_skip_frames,
        };
        let tag_matching = match value(ENV_TAG_MATCHING) {
            Some((var, raw)) => match raw.to_ascii_lowercase().as_str() {
                "exact" => TagMatching::Exact,
                "prefix" => TagMatching::Prefix,
                _ => return Err(invalid(var, raw, "`exact` or `prefix`")),
            },
            None => defaults.tag_matching,
        };

        Ok(Self {
            enabled,
            capture,
            backtrace_skip_frames,
            tag_matching,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(invalid(var, raw.to_owned(), "a boolean (1/0, true/false, on/off, yes/no)")),
    }
}

fn invalid(var: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue { var, value, expected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let config = TrackerConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, TrackerConfig::default());
        assert!(config.enabled);
    }

    #[test]
    fn every_variable_is_honored() {
        let config = TrackerConfig::from_lookup(lookup(&[
            (ENV_ENABLED, "off"),
            (ENV_CAPTURE, "Backtrace"),
            (ENV_SKIP_FRAMES, "3"),
            (ENV_TAG_MATCHING, "prefix"),
        ]))
        .expect("valid config");
        assert_eq!(
            config,
            TrackerConfig {
                enabled: false,
                capture: CaptureMode::Backtrace,
                backtrace_skip_frames: 3,
                tag_matching: TagMatching::Prefix,
            }
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = TrackerConfig::from_lookup(lookup(&[(ENV_ENABLED, "  ")])).expect("defaults");
        assert!(config.enabled);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = TrackerConfig::from_lookup(lookup(&[(ENV_SKIP_FRAMES, "two")]))
            .expect_err("not a number");
        assert!(matches!(
            &err,
            ConfigError::InvalidValue { var, value, .. } if *var == ENV_SKIP_FRAMES && value == "two"
        ));
        assert!(err.to_string().contains(ENV_SKIP_FRAMES));

        let err = TrackerConfig::from_lookup(lookup(&[(ENV_ENABLED, "maybe")]))
            .expect_err("not a bool");
        assert!(matches!(err, ConfigError::InvalidValue { var: ENV_ENABLED, .. }));
    }
}
