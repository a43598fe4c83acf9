use super::types::{PortfolioInputs, RiskPref, VolumeBand};

pub const STARTER_VOLUME_LIMIT: f64 = 50_000.0;
pub const CORE_VOLUME_LIMIT: f64 = 100_000.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RiskBand {
    pub min: f64,
    pub max: f64,
}

pub fn total_volume(lump_sum: f64, monthly: f64, horizon_years: f64) -> f64 {
    lump_sum + monthly * 12.0 * horizon_years
}

pub fn classify_volume(total_volume: f64) -> VolumeBand {
    if total_volume < STARTER_VOLUME_LIMIT {
        VolumeBand::Starter
    } else if total_volume < CORE_VOLUME_LIMIT {
        VolumeBand::Core
    } else {
        VolumeBand::Premium
    }
}

pub fn volume_band(inputs: &PortfolioInputs) -> VolumeBand {
    let inputs = inputs.sanitized();
    classify_volume(total_volume(
        inputs.lump_sum_eur,
        inputs.monthly_contribution,
        inputs.horizon_years,
    ))
}

pub fn risk_band(pref: RiskPref) -> RiskBand {
    match pref {
        RiskPref::Conservative => RiskBand { min: 3.0, max: 5.0 },
        RiskPref::Balanced => RiskBand { min: 5.0, max: 7.0 },
        RiskPref::Growth => RiskBand { min: 7.0, max: 9.0 },
    }
}

pub fn effective_risk_max(band: VolumeBand, pref: RiskPref) -> f64 {
    match (pref, band) {
        (RiskPref::Growth, VolumeBand::Starter) => 8.5,
        (RiskPref::Growth, VolumeBand::Core) => 9.0,
        (RiskPref::Growth, VolumeBand::Premium) => 9.5,
        (pref, _) => risk_band(pref).max,
    }
}

pub fn overshoot_tolerance(pref: RiskPref) -> f64 {
    match pref {
        RiskPref::Growth => 1.0,
        RiskPref::Balanced | RiskPref::Conservative => 0.5,
    }
}

pub const UNDERSHOOT_TOLERANCE: f64 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_thresholds_are_half_open() {
        assert_eq!(classify_volume(0.0), VolumeBand::Starter);
        assert_eq!(classify_volume(49_999.99), VolumeBand::Starter);
        assert_eq!(classify_volume(50_000.0), VolumeBand::Core);
        assert_eq!(classify_volume(99_999.99), VolumeBand::Core);
        assert_eq!(classify_volume(100_000.0), VolumeBand::Premium);
    }

    #[test]
    fn volume_band_counts_monthly_contributions_over_horizon() {
        let inputs = PortfolioInputs {
            monthly_contribution: 300.0,
            horizon_years: 30.0,
            ..PortfolioInputs::default()
        };
        assert_eq!(volume_band(&inputs), VolumeBand::Premium);

        let inputs = PortfolioInputs {
            lump_sum_eur: 20_000.0,
            monthly_contribution: 250.0,
            horizon_years: 10.0,
            ..PortfolioInputs::default()
        };
        assert_eq!(volume_band(&inputs), VolumeBand::Core);
    }

    #[test]
    fn volume_band_ignores_garbage_amounts() {
        let inputs = PortfolioInputs {
            lump_sum_eur: f64::NAN,
            monthly_contribution: -500.0,
            horizon_years: f64::INFINITY,
            ..PortfolioInputs::default()
        };
        assert_eq!(volume_band(&inputs), VolumeBand::Starter);
    }

    #[test]
    fn headroom_only_widens_growth() {
        for band in [VolumeBand::Starter, VolumeBand::Core, VolumeBand::Premium] {
            assert_eq!(effective_risk_max(band, RiskPref::Conservative), 5.0);
            assert_eq!(effective_risk_max(band, RiskPref::Balanced), 7.0);
            assert!(effective_risk_max(band, RiskPref::Growth) >= 8.5);
        }
        assert_eq!(effective_risk_max(VolumeBand::Premium, RiskPref::Growth), 9.5);
    }
}
