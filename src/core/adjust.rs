// A mix that already satisfies the bounds at 0.01 % granularity is projected
// onto itself, so `adjust(adjust(x)) == adjust(x)`. Bounds are snapped to the
// same grid for that reason.

use crate::config::EngineConfig;

use super::error::{EngineError, EngineResult};
use super::policy::{classify_volume, total_volume};
use super::presets::preset_mix;
use super::types::{AssetKey, Mix, PortfolioInputs, RiskPref, VolumeBand};

const N: usize = AssetKey::COUNT;
const TOTAL: f64 = 100.0;
const TOTAL_UNITS: i64 = 10_000;
const SUM_EPSILON: f64 = 1e-9;
const SNAP_EPSILON: f64 = 1e-6;
pub const SUM_TOLERANCE: f64 = 0.01;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MixProfile {
    pub risk_pref: RiskPref,
    pub volume_band: VolumeBand,
    pub horizon_years: f64,
    pub reserve_months: f64,
}

impl MixProfile {
    pub fn from_inputs(inputs: &PortfolioInputs) -> Self {
        let inputs = inputs.sanitized();
        Self {
            risk_pref: inputs.risk_pref,
            volume_band: classify_volume(total_volume(
                inputs.lump_sum_eur,
                inputs.monthly_contribution,
                inputs.horizon_years,
            )),
            horizon_years: inputs.horizon_years,
            reserve_months: inputs.reserve_months,
        }
    }

    pub fn starting_mix(&self, base: Option<&Mix>) -> Mix {
        match base {
            Some(mix) if mix.total() > 0.0 => Mix::from_untrusted(mix.items()),
            _ => preset_mix(self.risk_pref),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MixBounds {
    pub floor: [f64; N],
    pub cap: [f64; N],
    // Shares used to fill a shortfall when every open asset sits at zero.
    pub fill: [f64; N],
}

impl MixBounds {
    pub fn for_profile(profile: &MixProfile, config: &EngineConfig) -> EngineResult<Self> {
        let mut floor = [0.0; N];
        let mut cap = AssetKey::ALL.map(|key| config.cap(key));

        if profile.volume_band != VolumeBand::Premium {
            cap[AssetKey::RealEstate.index()] = 0.0;
        }

        if profile.horizon_years < config.short_horizon_years {
            let dynamic = AssetKey::DynamicManagement.index();
            let crypto = AssetKey::Crypto.index();
            cap[dynamic] = cap[dynamic].min(config.short_horizon_dynamic_cap);
            cap[crypto] = cap[crypto].min(config.short_horizon_crypto_cap);
        }

        if profile.reserve_months < config.low_reserve_months {
            floor[AssetKey::Cash.index()] = config.low_reserve_cash_floor;
        }

        // Bounds live on the same 0.01 grid as finalized mixes.
        let cap = cap.map(|c| (c * 100.0).floor() / 100.0);
        let mut floor = floor.map(|f| (f * 100.0).ceil() / 100.0);
        for i in 0..N {
            floor[i] = floor[i].min(cap[i]);
        }

        let cap_total: f64 = cap.iter().sum();
        let floor_total: f64 = floor.iter().sum();
        if cap_total < TOTAL - SUM_EPSILON || floor_total > TOTAL + SUM_EPSILON {
            return Err(EngineError::InfeasibleBounds {
                cap_total,
                floor_total,
            });
        }

        Ok(Self {
            floor,
            cap,
            fill: preset_mix(profile.risk_pref).weights(),
        })
    }

    pub fn contains(&self, key: AssetKey, pct: f64) -> bool {
        let i = key.index();
        pct >= self.floor[i] - SUM_EPSILON && pct <= self.cap[i] + SUM_EPSILON
    }
}

pub fn adjust(base: &Mix, bounds: &MixBounds) -> EngineResult<Mix> {
    let projected = project(base.weights(), bounds);
    let mix = Mix::from_weights(round_to_hundredths(projected));
    check_finalized(&mix, bounds)?;
    Ok(mix)
}

pub fn adjust_for_inputs(inputs: &PortfolioInputs, config: &EngineConfig) -> EngineResult<Mix> {
    let profile = MixProfile::from_inputs(inputs);
    let bounds = MixBounds::for_profile(&profile, config)?;
    adjust(&profile.starting_mix(inputs.base_mix.as_ref()), &bounds)
}

fn project(weights: [f64; N], bounds: &MixBounds) -> [f64; N] {
    let mut w = weights;
    for i in 0..N {
        w[i] = if w[i].is_finite() { w[i] } else { 0.0 };
        w[i] = w[i].clamp(bounds.floor[i], bounds.cap[i]);
    }

    // Every pass either closes the gap or pins at least one more asset to a bound.
    for _ in 0..=N {
        let gap = TOTAL - w.iter().sum::<f64>();
        if gap.abs() <= SUM_EPSILON {
            break;
        }

        if gap > 0.0 {
            let open: Vec<usize> = (0..N).filter(|&i| w[i] < bounds.cap[i]).collect();
            if open.is_empty() {
                break;
            }
            let basis: f64 = open.iter().map(|&i| w[i]).sum();
            let fill: f64 = open.iter().map(|&i| bounds.fill[i]).sum();
            for &i in &open {
                let share = if basis > 0.0 {
                    w[i] / basis
                } else if fill > 0.0 {
                    bounds.fill[i] / fill
                } else {
                    1.0 / open.len() as f64
                };
                w[i] = (w[i] + gap * share).min(bounds.cap[i]);
            }
        } else {
            let open: Vec<usize> = (0..N).filter(|&i| w[i] > bounds.floor[i]).collect();
            let basis: f64 = open.iter().map(|&i| w[i] - bounds.floor[i]).sum();
            if basis <= 0.0 {
                break;
            }
            for &i in &open {
                let share = (w[i] - bounds.floor[i]) / basis;
                w[i] = (w[i] + gap * share).max(bounds.floor[i]);
            }
        }
    }

    w
}

fn round_to_hundredths(weights: [f64; N]) -> [f64; N] {
    let mut units = [0_i64; N];
    let mut remainders = [0.0; N];
    for i in 0..N {
        let scaled = weights[i] * 100.0;
        let nearest = scaled.round();
        let scaled = if (scaled - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            scaled
        };
        units[i] = scaled.floor() as i64;
        remainders[i] = scaled - scaled.floor();
    }

    let missing = TOTAL_UNITS - units.iter().sum::<i64>();
    if missing > 0 {
        let mut order: Vec<usize> = (0..N).collect();
        order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]));
        for &i in order.iter().take(missing as usize) {
            units[i] += 1;
        }
    }

    units.map(|u| u as f64 / 100.0)
}

pub fn check_finalized(mix: &Mix, bounds: &MixBounds) -> EngineResult<()> {
    for item in mix.items() {
        if !item.pct.is_finite() || item.pct < 0.0 || !bounds.contains(item.key, item.pct) {
            return Err(EngineError::AssetOutOfBounds {
                asset: item.key,
                pct: item.pct,
                cap: bounds.cap[item.key.index()],
            });
        }
    }

    let total = mix.total();
    if (total - TOTAL).abs() > SUM_TOLERANCE {
        return Err(EngineError::InvariantViolation {
            reason: format!("allocation sums to {total:.4}%"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MixItem;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn profile(pref: RiskPref, band: VolumeBand, horizon: f64, reserve_months: f64) -> MixProfile {
        MixProfile {
            risk_pref: pref,
            volume_band: band,
            horizon_years: horizon,
            reserve_months,
        }
    }

    fn bounds_for(profile: &MixProfile) -> MixBounds {
        MixBounds::for_profile(profile, &EngineConfig::default()).expect("feasible bounds")
    }

    #[test]
    fn clamps_to_caps_and_redistributes_overflow_proportionally() {
        let p = profile(RiskPref::Balanced, VolumeBand::Premium, 20.0, 12.0);
        let base = Mix::from_weights([80.0, 0.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0]);
        let mix = adjust(&base, &bounds_for(&p)).expect("adjusts");

        assert_eq!(mix.pct(AssetKey::Gold), 40.0);
        assert_eq!(mix.pct(AssetKey::WorldEquityEtf), 30.0);
        assert_eq!(mix.pct(AssetKey::GuaranteedBond), 30.0);
        assert_eq!(mix.total(), 100.0);
    }

    #[test]
    fn real_estate_is_premium_only() {
        let base = preset_mix(RiskPref::Growth);
        let core = adjust(
            &base,
            &bounds_for(&profile(RiskPref::Growth, VolumeBand::Core, 30.0, 12.0)),
        )
        .expect("adjusts");
        assert_eq!(core.pct(AssetKey::RealEstate), 0.0);

        let premium = adjust(
            &base,
            &bounds_for(&profile(RiskPref::Growth, VolumeBand::Premium, 30.0, 12.0)),
        )
        .expect("adjusts");
        assert_eq!(premium.pct(AssetKey::RealEstate), 5.0);
    }

    #[test]
    fn low_reserve_raises_cash_floor() {
        let base = preset_mix(RiskPref::Growth);
        let mix = adjust(
            &base,
            &bounds_for(&profile(RiskPref::Growth, VolumeBand::Premium, 30.0, 0.0)),
        )
        .expect("adjusts");
        assert_eq!(mix.pct(AssetKey::Cash), 10.0);
        assert!((mix.total() - 100.0).abs() < 1e-9);
        assert!(mix.pct(AssetKey::WorldEquityEtf) < 45.0);
    }

    #[test]
    fn short_horizon_caps_dynamic_and_crypto() {
        let base = preset_mix(RiskPref::Growth);
        let mix = adjust(
            &base,
            &bounds_for(&profile(RiskPref::Growth, VolumeBand::Core, 3.0, 12.0)),
        )
        .expect("adjusts");
        assert!(mix.pct(AssetKey::DynamicManagement) <= 15.0);
        assert!(mix.pct(AssetKey::Crypto) <= 5.0);
    }

    #[test]
    fn empty_base_falls_back_to_preset() {
        let p = profile(RiskPref::Conservative, VolumeBand::Core, 10.0, 6.0);
        let empty = Mix::from_untrusted(&[MixItem {
            key: AssetKey::Gold,
            pct: f64::NAN,
        }]);
        assert_eq!(p.starting_mix(Some(&empty)), preset_mix(RiskPref::Conservative));
        assert_eq!(p.starting_mix(None), preset_mix(RiskPref::Conservative));
    }

    #[test]
    fn zero_weight_base_fills_like_the_profile_preset() {
        let p = profile(RiskPref::Balanced, VolumeBand::Premium, 20.0, 12.0);
        let mix = adjust(&Mix::from_weights([0.0; N]), &bounds_for(&p)).expect("adjusts");
        assert_eq!(mix, preset_mix(RiskPref::Balanced));
    }

    #[test]
    fn capped_single_asset_overflow_follows_profile_preset() {
        let p = profile(RiskPref::Conservative, VolumeBand::Core, 20.0, 12.0);
        let base = Mix::from_weights([100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mix = adjust(&base, &bounds_for(&p)).expect("adjusts");

        assert_eq!(
            mix.weights(),
            [40.0, 3.75, 15.0, 18.75, 11.25, 11.25, 0.0, 0.0]
        );
        assert_eq!(mix.pct(AssetKey::Crypto), 0.0);
    }

    #[test]
    fn zero_fill_shares_fall_back_to_even_split() {
        let p = profile(RiskPref::Conservative, VolumeBand::Premium, 20.0, 12.0);
        let mut bounds = bounds_for(&p);
        bounds.fill = [0.0; N];
        let mix = adjust(&Mix::from_weights([0.0; N]), &bounds).expect("adjusts");

        // Crypto pins at its 10 % cap; the rest share the remaining 90 evenly.
        assert_eq!(mix.pct(AssetKey::Crypto), 10.0);
        for item in mix.items().iter().filter(|i| i.key != AssetKey::Crypto) {
            assert!((item.pct - 90.0 / 7.0).abs() <= 0.01, "{item:?}");
        }
        assert!((mix.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rounding_keeps_exact_total() {
        let p = profile(RiskPref::Balanced, VolumeBand::Premium, 20.0, 12.0);
        let base = Mix::from_weights([1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mix = adjust(&base, &bounds_for(&p)).expect("adjusts");
        let units: i64 = mix.items().iter().map(|i| (i.pct * 100.0).round() as i64).sum();
        assert_eq!(units, 10_000);
    }

    #[test]
    fn infeasible_caps_are_reported() {
        let mut config = EngineConfig::default();
        for key in AssetKey::ALL {
            config.asset_caps.insert(key, 5.0);
        }
        let p = profile(RiskPref::Balanced, VolumeBand::Premium, 20.0, 12.0);
        let err = MixBounds::for_profile(&p, &config).expect_err("caps sum to 40");
        assert!(matches!(err, EngineError::InfeasibleBounds { .. }));
    }

    #[test]
    fn cash_floor_never_exceeds_configured_cash_cap() {
        let mut config = EngineConfig::default();
        config.asset_caps.insert(AssetKey::Cash, 4.0);
        let p = profile(RiskPref::Growth, VolumeBand::Premium, 20.0, 0.0);
        let bounds = MixBounds::for_profile(&p, &config).expect("feasible");
        assert_eq!(bounds.floor[AssetKey::Cash.index()], 4.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_adjust_is_idempotent_and_respects_bounds(
            raw in proptest::array::uniform8(0u32..10_000),
            pref_idx in 0usize..3,
            band_idx in 0usize..3,
            horizon in 0u32..40,
            reserve_months in 0u32..24
        ) {
            let pref = [RiskPref::Conservative, RiskPref::Balanced, RiskPref::Growth][pref_idx];
            let band = [VolumeBand::Starter, VolumeBand::Core, VolumeBand::Premium][band_idx];
            let p = profile(pref, band, horizon as f64, reserve_months as f64);
            let bounds = bounds_for(&p);

            let base = Mix::from_weights(raw.map(|v| v as f64 / 100.0));
            let once = adjust(&p.starting_mix(Some(&base)), &bounds).expect("first pass");
            let twice = adjust(&once, &bounds).expect("second pass");
            prop_assert_eq!(&once, &twice);

            let total = once.total();
            prop_assert!((99.99..=100.01).contains(&total), "total {}", total);
            for item in once.items() {
                prop_assert!(item.pct.is_finite());
                prop_assert!(item.pct >= 0.0);
                prop_assert!(item.pct <= item.key.hard_cap());
                prop_assert!(bounds.contains(item.key, item.pct));
            }
        }
    }
}
