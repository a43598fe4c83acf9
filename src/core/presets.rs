use super::types::{Mix, RiskPref};

// Weights follow AssetKey::ALL: gold, dynamic-management, world-equity-ETF,
// guaranteed-bond, short-bond, cash, crypto, real-estate.
const CONSERVATIVE: [f64; 8] = [20.0, 5.0, 20.0, 25.0, 15.0, 15.0, 0.0, 0.0];
const BALANCED: [f64; 8] = [15.0, 15.0, 35.0, 15.0, 5.0, 10.0, 2.0, 3.0];
const GROWTH: [f64; 8] = [10.0, 25.0, 45.0, 5.0, 0.0, 5.0, 5.0, 5.0];

const EMERGENCY_SAFE: [f64; 8] = [20.0, 0.0, 0.0, 35.0, 25.0, 20.0, 0.0, 0.0];

pub fn preset_mix(pref: RiskPref) -> Mix {
    match pref {
        RiskPref::Conservative => Mix::from_weights(CONSERVATIVE),
        RiskPref::Balanced => Mix::from_weights(BALANCED),
        RiskPref::Growth => Mix::from_weights(GROWTH),
    }
}

pub fn emergency_safe_mix() -> Mix {
    Mix::from_weights(EMERGENCY_SAFE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetKey;

    #[test]
    fn presets_sum_to_one_hundred_within_hard_caps() {
        for mix in [
            preset_mix(RiskPref::Conservative),
            preset_mix(RiskPref::Balanced),
            preset_mix(RiskPref::Growth),
            emergency_safe_mix(),
        ] {
            assert!((mix.total() - 100.0).abs() < 1e-9);
            for item in mix.items() {
                assert!(item.pct >= 0.0 && item.pct <= item.key.hard_cap());
            }
        }
    }

    #[test]
    fn emergency_mix_holds_no_volatile_assets() {
        let mix = emergency_safe_mix();
        for key in [
            AssetKey::DynamicManagement,
            AssetKey::WorldEquityEtf,
            AssetKey::Crypto,
            AssetKey::RealEstate,
        ] {
            assert_eq!(mix.pct(key), 0.0);
        }
    }
}
