//! Process-wide runtime settings.
//!
//! Two knobs are global by nature: the scale used by decimal division when the
//! quotient is inexact, and whether decimals serialize to JSON as bare numbers.
//! Both are meant to be set once at startup (see [`RuntimeConfig::apply`]); scripts
//! may still change them through the `decimal` namespace while running.

use std::env;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub const DEFAULT_DIVISION_PRECISION: i32 = 16;

static DIVISION_PRECISION: AtomicI32 = AtomicI32::new(DEFAULT_DIVISION_PRECISION);
static MARSHAL_JSON_WITHOUT_QUOTES: AtomicBool = AtomicBool::new(false);

/// Number of fractional digits `Decimal::div` keeps for inexact quotients.
pub fn division_precision() -> i32 {
    DIVISION_PRECISION.load(Ordering::Relaxed)
}

pub fn set_division_precision(precision: i32) {
    DIVISION_PRECISION.store(precision, Ordering::Relaxed);
}

/// When true, decimals are written to JSON as numbers instead of strings.
pub fn marshal_json_without_quotes() -> bool {
    MARSHAL_JSON_WITHOUT_QUOTES.load(Ordering::Relaxed)
}

pub fn set_marshal_json_without_quotes(value: bool) {
    MARSHAL_JSON_WITHOUT_QUOTES.store(value, Ordering::Relaxed);
}

/// Snapshot of the global settings, usually built from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub division_precision: i32,
    pub marshal_json_without_quotes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            division_precision: DEFAULT_DIVISION_PRECISION,
            marshal_json_without_quotes: false,
        }
    }
}

impl RuntimeConfig {
    pub const PRECISION_VAR: &'static str = "AEROSCRIPT_DIVISION_PRECISION";
    pub const JSON_UNQUOTED_VAR: &'static str = "AEROSCRIPT_JSON_DECIMAL_UNQUOTED";

    /// Read overrides from the environment. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(Self::PRECISION_VAR) {
            match raw.trim().parse::<i32>() {
                Ok(precision) => config.division_precision = precision,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid division precision"),
            }
        }
        if let Some(raw) = lookup(Self::JSON_UNQUOTED_VAR) {
            config.marshal_json_without_quotes =
                matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Install this configuration into the process-wide cells.
    pub fn apply(&self) {
        set_division_precision(self.division_precision);
        set_marshal_json_without_quotes(self.marshal_json_without_quotes);
    }

    /// Current global settings.
    pub fn current() -> Self {
        Self {
            division_precision: division_precision(),
            marshal_json_without_quotes: marshal_json_without_quotes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            RuntimeConfig::PRECISION_VAR => Some("8".to_string()),
            RuntimeConfig::JSON_UNQUOTED_VAR => Some("TRUE".to_string()),
            _ => None,
        });
        assert_eq!(config.division_precision, 8);
        assert!(config.marshal_json_without_quotes);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            RuntimeConfig::PRECISION_VAR => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config, RuntimeConfig::default());
    }
}
