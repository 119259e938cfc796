//! Engine configuration.
//!
//! Tax rate and stock policy, loaded from environment variables with
//! fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use backoffice_core::validation::validate_tax_rate_bps;
use backoffice_core::{StockPolicy, TaxRate, DEFAULT_TAX_RATE_BPS};

/// Variable holding the default database file for binaries.
pub const DB_PATH_VAR: &str = "BACKOFFICE_DB_PATH";

/// Rules the engine applies on every operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Tax applied to the taxable base (default 2%).
    pub tax_rate: TaxRate,

    /// Headroom thresholds for the stock validation engine.
    pub stock_policy: StockPolicy,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | variable                              | default |
    /// |---------------------------------------|---------|
    /// | `BACKOFFICE_TAX_RATE_BPS`             | 200     |
    /// | `BACKOFFICE_CRITICAL_STOCK_THRESHOLD` | 3       |
    /// | `BACKOFFICE_MIN_STOCK_FOR_CREATION`   | 1       |
    /// | `BACKOFFICE_MIN_STOCK_FOR_UPDATE`     | 1       |
    /// | `BACKOFFICE_CRITICAL_HEADROOM`        | 1       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StockPolicy::default();

        let tax_rate_bps: u32 = parse_var(&lookup, "BACKOFFICE_TAX_RATE_BPS", DEFAULT_TAX_RATE_BPS)?;
        validate_tax_rate_bps(tax_rate_bps)
            .map_err(|_| ConfigError::InvalidValue("BACKOFFICE_TAX_RATE_BPS".to_string()))?;

        let stock_policy = StockPolicy {
            critical_threshold: parse_var(
                &lookup,
                "BACKOFFICE_CRITICAL_STOCK_THRESHOLD",
                defaults.critical_threshold,
            )?,
            min_stock_for_creation: parse_var(
                &lookup,
                "BACKOFFICE_MIN_STOCK_FOR_CREATION",
                defaults.min_stock_for_creation,
            )?,
            min_stock_for_update: parse_var(
                &lookup,
                "BACKOFFICE_MIN_STOCK_FOR_UPDATE",
                defaults.min_stock_for_update,
            )?,
            critical_headroom: parse_var(
                &lookup,
                "BACKOFFICE_CRITICAL_HEADROOM",
                defaults.critical_headroom,
            )?,
        };

        if stock_policy.critical_threshold < 0
            || stock_policy.min_stock_for_creation < 0
            || stock_policy.min_stock_for_update < 0
            || stock_policy.critical_headroom < 0
        {
            return Err(ConfigError::NegativeThreshold);
        }

        Ok(EngineConfig {
            tax_rate: TaxRate::from_bps(tax_rate_bps),
            stock_policy,
        })
    }

    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn with_stock_policy(mut self, stock_policy: StockPolicy) -> Self {
        self.stock_policy = stock_policy;
        self
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Stock thresholds must not be negative")]
    NegativeThreshold,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tax_rate.bps(), 200);
        assert_eq!(config.stock_policy.critical_threshold, 3);
        assert_eq!(config.stock_policy.min_stock_for_creation, 1);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BACKOFFICE_TAX_RATE_BPS", "825"),
            ("BACKOFFICE_CRITICAL_STOCK_THRESHOLD", " 10 "),
            ("BACKOFFICE_CRITICAL_HEADROOM", "2"),
        ]))
        .unwrap();
        assert_eq!(config.tax_rate.bps(), 825);
        assert_eq!(config.stock_policy.critical_threshold, 10);
        assert_eq!(config.stock_policy.critical_headroom, 2);
        assert_eq!(config.stock_policy.min_stock_for_update, 1);
    }

    #[test]
    fn test_invalid_values() {
        let err = EngineConfig::from_lookup(lookup(&[("BACKOFFICE_TAX_RATE_BPS", "two")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == "BACKOFFICE_TAX_RATE_BPS"));

        assert!(EngineConfig::from_lookup(lookup(&[("BACKOFFICE_TAX_RATE_BPS", "10001")])).is_err());
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[("BACKOFFICE_MIN_STOCK_FOR_CREATION", "-1")])),
            Err(ConfigError::NegativeThreshold)
        ));
    }
}
