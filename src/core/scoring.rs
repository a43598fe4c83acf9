use super::types::{AssetKey, Mix};

pub const CONCENTRATION_WEIGHT: f64 = 1.0;
pub const SPECULATIVE_LIMIT_PCT: f64 = 45.0;
pub const SPECULATIVE_PENALTY: f64 = 1.0;
pub const SINGLE_ASSET_LIMIT_PCT: f64 = 35.0;
pub const SINGLE_ASSET_PENALTY: f64 = 0.5;

pub fn approx_yield_annual_from_mix(mix: &Mix) -> f64 {
    mix.items()
        .iter()
        .map(|item| item.pct / 100.0 * item.key.expected_yield_pa())
        .sum()
}

pub fn concentration_index(mix: &Mix) -> f64 {
    mix.items()
        .iter()
        .map(|item| {
            let w = item.pct / 100.0;
            w * w
        })
        .sum()
}

pub fn risk_score_0_to_10(mix: &Mix) -> f64 {
    let asset_risk: f64 = mix
        .items()
        .iter()
        .map(|item| item.pct / 100.0 * item.key.risk_weight())
        .sum();

    let mut penalty = CONCENTRATION_WEIGHT * concentration_index(mix);

    let speculative = mix.pct(AssetKey::DynamicManagement) + mix.pct(AssetKey::Crypto);
    if speculative > SPECULATIVE_LIMIT_PCT {
        penalty += SPECULATIVE_PENALTY;
    }

    if mix
        .items()
        .iter()
        .any(|item| item.pct > SINGLE_ASSET_LIMIT_PCT)
    {
        penalty += SINGLE_ASSET_PENALTY;
    }

    (asset_risk + penalty).clamp(0.0, 10.0)
}
