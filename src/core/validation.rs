use super::policy::{
    RiskBand, UNDERSHOOT_TOLERANCE, effective_risk_max, overshoot_tolerance, risk_band,
};
use super::types::{PortfolioWarning, RiskPref, VolumeBand, WarningCode};

#[derive(Clone, Debug, PartialEq)]
pub struct RiskCheck {
    pub warnings: Vec<PortfolioWarning>,
    pub requires_fallback: bool,
}

pub fn check_risk(risk: f64, pref: RiskPref, band: VolumeBand) -> RiskCheck {
    let RiskBand { min, .. } = risk_band(pref);
    let ceiling = effective_risk_max(band, pref);
    let tolerance = overshoot_tolerance(pref);

    let mut warnings = Vec::new();
    let mut requires_fallback = false;

    if risk < min - UNDERSHOOT_TOLERANCE {
        warnings.push(PortfolioWarning::new(
            WarningCode::RiskUndershootMajor,
            format!("Risk {risk:.2} is well below the {pref:?} minimum of {min:.1}."),
        ));
    } else if risk < min {
        warnings.push(PortfolioWarning::new(
            WarningCode::RiskUndershootMinor,
            format!("Risk {risk:.2} is slightly below the {pref:?} minimum of {min:.1}."),
        ));
    }

    if risk > ceiling + tolerance {
        requires_fallback = true;
        warnings.push(PortfolioWarning::new(
            WarningCode::RiskOvershootMajor,
            format!(
                "Risk {risk:.2} exceeds the {pref:?} ceiling of {ceiling:.1} by more than {tolerance:.1}."
            ),
        ));
    } else if risk > ceiling {
        warnings.push(PortfolioWarning::new(
            WarningCode::RiskOvershootMinor,
            format!("Risk {risk:.2} is slightly above the {pref:?} ceiling of {ceiling:.1}."),
        ));
    }

    RiskCheck {
        warnings,
        requires_fallback,
    }
}
