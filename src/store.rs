use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::core::{Debt, Mix, PortfolioInputs, PortfolioOutput, VolumeBand};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("profile patch must be a JSON object")]
    InvalidPatch,

    #[error("profile patch does not produce a readable profile: {0}")]
    Decode(serde_json::Error),

    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait KeyValueStore {
    fn read(&self, key: &str) -> Option<Value>;

    fn write(&mut self, key: &str, patch: Value);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, patch: Value) {
        match self.entries.get_mut(key) {
            Some(existing) => merge_json(existing, patch),
            None => {
                self.entries.insert(key.to_string(), patch);
            }
        }
    }
}

pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(&key);
                } else if let Some(existing) = target.get_mut(&key).filter(|_| value.is_object()) {
                    merge_json(existing, value);
                } else {
                    target.insert(key, value);
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredProfile {
    pub schema_version: u32,
    pub inputs: PortfolioInputs,
    pub debts: Vec<Debt>,
}

impl Default for StoredProfile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            inputs: PortfolioInputs::default(),
            debts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ProfileRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn load(&self) -> StoredProfile {
        let Some(stored) = self.store.read(&self.key) else {
            return StoredProfile::default();
        };

        match decode_profile(stored) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding unreadable stored profile");
                StoredProfile::default()
            }
        }
    }

    // The patch only reaches the store once the merged result decodes.
    pub fn save_patch(&mut self, patch: Value) -> Result<StoredProfile, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::InvalidPatch);
        }

        let mut candidate = self
            .store
            .read(&self.key)
            .unwrap_or_else(|| Value::Object(Default::default()));
        merge_json(&mut candidate, patch.clone());
        let profile = decode_profile(candidate).map_err(StoreError::Decode)?;

        self.store.write(&self.key, patch);
        self.store.write(
            &self.key,
            serde_json::json!({ "schemaVersion": SCHEMA_VERSION }),
        );
        Ok(profile)
    }
}

fn decode_profile(stored: Value) -> Result<StoredProfile, serde_json::Error> {
    let mut merged = serde_json::to_value(StoredProfile::default())?;
    merge_json(&mut merged, stored);

    let mut profile = serde_json::from_value::<StoredProfile>(merged)?;
    profile.schema_version = SCHEMA_VERSION;
    profile.inputs = profile.inputs.sanitized();
    Ok(profile)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub mix: Mix,
    pub yield_pa: f64,
    pub risk_score: f64,
    pub future_value: f64,
    pub volume_band: VolumeBand,
    pub warnings: Vec<String>,
}

impl From<&PortfolioOutput> for PortfolioSummary {
    fn from(output: &PortfolioOutput) -> Self {
        Self {
            mix: output.mix.clone(),
            yield_pa: output.yield_pa,
            risk_score: output.risk_score,
            future_value: output.future_value,
            volume_band: output.volume_band,
            warnings: output.warnings.iter().map(|w| w.message.clone()).collect(),
        }
    }
}

pub trait ExportSink {
    fn deliver(&mut self, summary: &PortfolioSummary) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExportSink for JsonLinesSink<W> {
    fn deliver(&mut self, summary: &PortfolioSummary) -> Result<(), StoreError> {
        serde_json::to_writer(&mut self.writer, summary)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RiskPref, compute_portfolio_from_inputs};
    use serde_json::json;

    #[test]
    fn missing_profile_reads_as_defaults() {
        let repo = ProfileRepository::new(MemoryStore::default(), "planner");
        assert_eq!(repo.load(), StoredProfile::default());
    }

    #[test]
    fn patches_merge_over_previous_writes() {
        let mut repo = ProfileRepository::new(MemoryStore::default(), "planner");
        repo.save_patch(json!({"inputs": {"monthlyVklad": 300, "horizonYears": 30}}))
            .expect("saves");
        let profile = repo
            .save_patch(json!({"inputs": {"riskPref": "growth"}}))
            .expect("saves");

        assert_eq!(profile.inputs.monthly_contribution, 300.0);
        assert_eq!(profile.inputs.horizon_years, 30.0);
        assert_eq!(profile.inputs.risk_pref, RiskPref::Growth);
        assert_eq!(profile.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn unreadable_patch_is_rejected_and_keeps_earlier_fields() {
        let mut repo = ProfileRepository::new(MemoryStore::default(), "planner");
        repo.save_patch(json!({"inputs": {"monthlyVklad": 300, "horizonYears": 30}}))
            .expect("saves");

        let err = repo
            .save_patch(json!({"inputs": {"riskPref": "reckless"}}))
            .expect_err("unknown risk preference");
        assert!(matches!(err, StoreError::Decode(_)));

        let profile = repo.load();
        assert_eq!(profile.inputs.monthly_contribution, 300.0);
        assert_eq!(profile.inputs.horizon_years, 30.0);
        assert_eq!(profile.inputs.risk_pref, RiskPref::Balanced);
    }

    #[test]
    fn stored_values_are_sanitized_like_fresh_input() {
        let mut store = MemoryStore::default();
        store.write(
            "planner",
            json!({
                "schemaVersion": 0,
                "inputs": {
                    "lumpSumEur": -5000,
                    "reserveMonths": 4,
                    "baseMix": [{"key": "gold", "pct": 250}, {"key": "etf", "pct": -3}]
                }
            }),
        );
        let profile = ProfileRepository::new(store, "planner").load();
        assert_eq!(profile.schema_version, SCHEMA_VERSION);
        assert_eq!(profile.inputs.lump_sum_eur, 0.0);
        assert_eq!(profile.inputs.reserve_months, 4.0);
        let mix = profile.inputs.base_mix.expect("base mix kept");
        assert_eq!(mix.total(), 100.0);
    }

    #[test]
    fn unreadable_profile_falls_back_to_defaults() {
        let mut store = MemoryStore::default();
        store.write("planner", json!({"inputs": {"riskPref": "reckless"}}));
        let repo = ProfileRepository::new(store, "planner");
        assert_eq!(repo.load(), StoredProfile::default());
    }

    #[test]
    fn rejects_non_object_patch() {
        let mut repo = ProfileRepository::new(MemoryStore::default(), "planner");
        assert!(matches!(
            repo.save_patch(json!([1, 2, 3])),
            Err(StoreError::InvalidPatch)
        ));
    }

    #[test]
    fn null_in_patch_clears_field() {
        let mut value = json!({"a": 1, "b": {"c": 2}});
        merge_json(&mut value, json!({"a": null, "b": {"d": 3}}));
        assert_eq!(value, json!({"b": {"c": 2, "d": 3}}));
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_summary() {
        let output = compute_portfolio_from_inputs(&PortfolioInputs {
            monthly_contribution: 300.0,
            horizon_years: 30.0,
            ..PortfolioInputs::default()
        });
        let mut sink = JsonLinesSink::new(Vec::new());
        let summary = PortfolioSummary::from(&output);
        sink.deliver(&summary).expect("delivers");
        sink.deliver(&summary).expect("delivers");

        let written = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(parsed["volumeBand"], "PREMIUM");
        assert!(parsed["futureValue"].as_f64().is_some_and(|fv| fv > 0.0));
    }
}
