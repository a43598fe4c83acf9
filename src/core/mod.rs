mod adjust;
mod cache;
mod debt;
mod engine;
mod error;
mod policy;
mod presets;
mod projection;
mod scoring;
mod types;
mod validation;

pub use adjust::{MixBounds, MixProfile, adjust, adjust_for_inputs, check_finalized};
pub use cache::ResultCache;
pub use debt::{
    AmortizationResult, CompareResult, Debt, DebtKind, InvestOutcome, MAX_AMORTIZATION_MONTHS,
    PAY_DOWN_MARGIN, PayDownOutcome, Verdict, amortize, compare_pay_down_vs_invest,
    crossover_month,
};
pub use engine::{PortfolioEngine, compute_portfolio_from_inputs};
pub use error::{EngineError, EngineResult};
pub use policy::{
    RiskBand, classify_volume, effective_risk_max, overshoot_tolerance, risk_band, total_volume,
    volume_band,
};
pub use presets::{emergency_safe_mix, preset_mix};
pub use projection::{annuity_future_value, future_value};
pub use scoring::{approx_yield_annual_from_mix, concentration_index, risk_score_0_to_10};
pub use types::{
    AssetKey, Mix, MixItem, PortfolioInputs, PortfolioOutput, PortfolioWarning, RiskPref,
    VolumeBand, WarningCode, WarningLevel,
};
pub use validation::{RiskCheck, check_risk};
