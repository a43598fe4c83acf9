use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKey {
    Gold,
    #[serde(alias = "dyn", alias = "dynamicManagement")]
    DynamicManagement,
    #[serde(alias = "etf", alias = "world-equity-ETF", alias = "worldEquityEtf")]
    WorldEquityEtf,
    #[serde(alias = "bonds", alias = "guaranteedBond")]
    GuaranteedBond,
    #[serde(alias = "bond3y9", alias = "shortBond")]
    ShortBond,
    Cash,
    Crypto,
    #[serde(alias = "real", alias = "realEstate")]
    RealEstate,
}

impl AssetKey {
    pub const COUNT: usize = 8;

    pub const ALL: [AssetKey; AssetKey::COUNT] = [
        AssetKey::Gold,
        AssetKey::DynamicManagement,
        AssetKey::WorldEquityEtf,
        AssetKey::GuaranteedBond,
        AssetKey::ShortBond,
        AssetKey::Cash,
        AssetKey::Crypto,
        AssetKey::RealEstate,
    ];

    pub fn index(self) -> usize {
        match self {
            AssetKey::Gold => 0,
            AssetKey::DynamicManagement => 1,
            AssetKey::WorldEquityEtf => 2,
            AssetKey::GuaranteedBond => 3,
            AssetKey::ShortBond => 4,
            AssetKey::Cash => 5,
            AssetKey::Crypto => 6,
            AssetKey::RealEstate => 7,
        }
    }

    pub fn hard_cap(self) -> f64 {
        match self {
            AssetKey::Gold => 40.0,
            AssetKey::DynamicManagement => 40.0,
            AssetKey::WorldEquityEtf => 50.0,
            AssetKey::GuaranteedBond => 45.0,
            AssetKey::ShortBond => 45.0,
            AssetKey::Cash => 50.0,
            AssetKey::Crypto => 10.0,
            AssetKey::RealEstate => 20.0,
        }
    }

    pub fn expected_yield_pa(self) -> f64 {
        match self {
            AssetKey::Gold => 0.095,
            AssetKey::DynamicManagement => 0.36,
            AssetKey::WorldEquityEtf => 0.14,
            AssetKey::GuaranteedBond => 0.075,
            AssetKey::ShortBond => 0.085,
            AssetKey::Cash => 0.01,
            AssetKey::Crypto => 0.20,
            AssetKey::RealEstate => 0.087,
        }
    }

    pub fn risk_weight(self) -> f64 {
        match self {
            AssetKey::Gold => 2.5,
            AssetKey::DynamicManagement => 8.0,
            AssetKey::WorldEquityEtf => 5.0,
            AssetKey::GuaranteedBond => 1.0,
            AssetKey::ShortBond => 1.5,
            AssetKey::Cash => 0.2,
            AssetKey::Crypto => 9.5,
            AssetKey::RealEstate => 3.5,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MixItem {
    pub key: AssetKey,
    pub pct: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Mix {
    items: Vec<MixItem>,
}

impl Mix {
    pub fn from_weights(weights: [f64; AssetKey::COUNT]) -> Self {
        let items = AssetKey::ALL
            .iter()
            .zip(weights)
            .map(|(&key, pct)| MixItem { key, pct })
            .collect();
        Self { items }
    }

    pub fn from_untrusted(items: &[MixItem]) -> Self {
        let mut weights = [0.0; AssetKey::COUNT];
        for item in items {
            let pct = if item.pct.is_finite() {
                item.pct.clamp(0.0, 100.0)
            } else {
                0.0
            };
            weights[item.key.index()] += pct;
        }
        Self::from_weights(weights)
    }

    pub fn weights(&self) -> [f64; AssetKey::COUNT] {
        let mut weights = [0.0; AssetKey::COUNT];
        for item in &self.items {
            weights[item.key.index()] = item.pct;
        }
        weights
    }

    pub fn items(&self) -> &[MixItem] {
        &self.items
    }

    pub fn pct(&self, key: AssetKey) -> f64 {
        self.weights()[key.index()]
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.pct).sum()
    }
}

impl<'de> Deserialize<'de> for Mix {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<MixItem>::deserialize(deserializer)?;
        Ok(Mix::from_untrusted(&items))
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPref {
    Conservative,
    #[default]
    Balanced,
    Growth,
}

impl RiskPref {
    pub fn safer(self) -> Self {
        match self {
            RiskPref::Growth => RiskPref::Balanced,
            RiskPref::Balanced | RiskPref::Conservative => RiskPref::Conservative,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolumeBand {
    Starter,
    Core,
    Premium,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioInputs {
    pub lump_sum_eur: f64,
    #[serde(rename = "monthlyVklad", alias = "monthlyContribution")]
    pub monthly_contribution: f64,
    pub horizon_years: f64,
    pub reserve_eur: f64,
    pub reserve_months: f64,
    pub risk_pref: RiskPref,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_mix: Option<Mix>,
}

impl PortfolioInputs {
    pub fn sanitized(&self) -> Self {
        fn amount(value: f64) -> f64 {
            if value.is_finite() { value.max(0.0) } else { 0.0 }
        }

        Self {
            lump_sum_eur: amount(self.lump_sum_eur),
            monthly_contribution: amount(self.monthly_contribution),
            horizon_years: amount(self.horizon_years),
            reserve_eur: amount(self.reserve_eur),
            reserve_months: amount(self.reserve_months),
            risk_pref: self.risk_pref,
            base_mix: self.base_mix.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WarningLevel {
    Info,
    Critical,
    Error,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningCode {
    RiskUndershootMajor,
    RiskUndershootMinor,
    RiskOvershootMajor,
    RiskOvershootMinor,
    FallbackApplied,
    EmergencySafeMix,
}

impl WarningCode {
    pub fn level(self) -> WarningLevel {
        match self {
            WarningCode::RiskUndershootMinor | WarningCode::RiskOvershootMinor => {
                WarningLevel::Info
            }
            WarningCode::RiskUndershootMajor
            | WarningCode::RiskOvershootMajor
            | WarningCode::FallbackApplied => WarningLevel::Critical,
            WarningCode::EmergencySafeMix => WarningLevel::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioWarning {
    pub level: WarningLevel,
    pub code: WarningCode,
    pub message: String,
}

impl PortfolioWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            level: code.level(),
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOutput {
    pub mix: Mix,
    pub yield_pa: f64,
    pub risk_score: f64,
    pub volume_band: VolumeBand,
    pub risk_ceiling: f64,
    pub future_value: f64,
    pub warnings: Vec<PortfolioWarning>,
}

impl PortfolioOutput {
    pub fn has_level(&self, level: WarningLevel) -> bool {
        self.warnings.iter().any(|w| w.level == level)
    }
}
