use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::AssetKey;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub cache_enabled: bool,
    pub cache_ttl_ms: u64,
    pub asset_caps: BTreeMap<AssetKey, f64>,
    pub low_reserve_months: f64,
    pub low_reserve_cash_floor: f64,
    pub short_horizon_years: f64,
    pub short_horizon_dynamic_cap: f64,
    pub short_horizon_crypto_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_ms: 5_000,
            asset_caps: BTreeMap::new(),
            low_reserve_months: 3.0,
            low_reserve_cash_floor: 10.0,
            short_horizon_years: 7.0,
            short_horizon_dynamic_cap: 15.0,
            short_horizon_crypto_cap: 5.0,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, cap) in &self.asset_caps {
            if !cap.is_finite() || *cap < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "assetCaps.{key:?} must be a non-negative number"
                )));
            }
            if *cap > key.hard_cap() {
                return Err(ConfigError::Invalid(format!(
                    "assetCaps.{key:?} = {cap} exceeds the hard cap {}",
                    key.hard_cap()
                )));
            }
        }

        for (name, value) in [
            ("lowReserveMonths", self.low_reserve_months),
            ("shortHorizonYears", self.short_horizon_years),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        for (name, value) in [
            ("lowReserveCashFloor", self.low_reserve_cash_floor),
            ("shortHorizonDynamicCap", self.short_horizon_dynamic_cap),
            ("shortHorizonCryptoCap", self.short_horizon_crypto_cap),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and 100"
                )));
            }
        }

        Ok(())
    }

    pub fn cap(&self, key: AssetKey) -> f64 {
        self.asset_caps
            .get(&key)
            .map_or(key.hard_cap(), |cap| cap.min(key.hard_cap()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}
