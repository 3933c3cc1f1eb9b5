//! Collector configuration.

use std::env;
use std::str::FromStr;

use crate::error::{Result, TraceError};

/// Default number of records a fresh buffer is pre-sized for.
pub const DEFAULT_CAPACITY_HINT: usize = 5000;

/// Environment override for [`CollectorConfig::capacity_hint`].
pub const CAPACITY_HINT_ENV: &str = "SEQTRACE_CAPACITY_HINT";
/// Environment override for [`CollectorConfig::max_records`].
pub const MAX_RECORDS_ENV: &str = "SEQTRACE_MAX_RECORDS";

/// Trace collector configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Records to reserve up front.
    pub capacity_hint: usize,
    /// Hard cap on stored records. `None` keeps every record, so memory grows
    /// with the length of the session.
    pub max_records: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capacity_hint: DEFAULT_CAPACITY_HINT,
            max_records: None,
        }
    }
}

impl CollectorConfig {
    /// Set the initial buffer capacity.
    #[must_use]
    pub const fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    /// Cap the number of stored records. Signals past the cap are counted
    /// as dropped.
    #[must_use]
    pub const fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }

    /// Capacity actually reserved: the hint, clamped to the cap if one is set.
    #[must_use]
    pub fn initial_capacity(&self) -> usize {
        self.max_records
            .map_or(self.capacity_hint, |max| self.capacity_hint.min(max))
    }

    /// Check the configuration for values that can never work.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidConfig`] if `max_records` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_records == Some(0) {
            return Err(TraceError::InvalidConfig(
                "max_records must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `SEQTRACE_CAPACITY_HINT` and `SEQTRACE_MAX_RECORDS`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidConfig`] if a variable is set but does not
    /// parse, or if the result fails [`CollectorConfig::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(CAPACITY_HINT_ENV) {
            config.capacity_hint = parse_var(CAPACITY_HINT_ENV, &value)?;
        }
        if let Some(value) = lookup(MAX_RECORDS_ENV) {
            config.max_records = Some(parse_var(MAX_RECORDS_ENV, &value)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TraceError::InvalidConfig(format!("{key}={value:?} is not a valid count")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.capacity_hint, 5000);
        assert_eq!(config.max_records, None);
        assert_eq!(config.initial_capacity(), 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_capacity_clamped_to_cap() {
        let config = CollectorConfig::default().with_max_records(10);
        assert_eq!(config.initial_capacity(), 10);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let config = CollectorConfig::default().with_max_records(0);
        assert!(matches!(config.validate(), Err(TraceError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CollectorConfig::from_lookup(lookup(&[
            (CAPACITY_HINT_ENV, "128"),
            (MAX_RECORDS_ENV, " 256 "),
        ]))
        .unwrap();
        assert_eq!(config.capacity_hint, 128);
        assert_eq!(config.max_records, Some(256));
    }

    #[test]
    fn test_from_lookup_unset_is_default() {
        let config = CollectorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CollectorConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = CollectorConfig::from_lookup(lookup(&[(MAX_RECORDS_ENV, "lots")])).unwrap_err();
        assert!(matches!(err, TraceError::InvalidConfig(msg) if msg.contains(MAX_RECORDS_ENV)));
        let err = CollectorConfig::from_lookup(lookup(&[(MAX_RECORDS_ENV, "0")])).unwrap_err();
        assert!(matches!(err, TraceError::InvalidConfig(_)));
    }
}
