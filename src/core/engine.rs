use std::time::Instant;

use tracing::{debug, error, warn};

use crate::config::EngineConfig;

use super::adjust::{MixBounds, MixProfile, adjust};
use super::cache::ResultCache;
use super::error::{EngineError, EngineResult};
use super::policy::{classify_volume, effective_risk_max, total_volume};
use super::presets::{emergency_safe_mix, preset_mix};
use super::projection::future_value;
use super::scoring::{approx_yield_annual_from_mix, risk_score_0_to_10};
use super::types::{Mix, PortfolioInputs, PortfolioOutput, PortfolioWarning, WarningCode};
use super::validation::check_risk;

#[derive(Debug, Clone)]
pub struct PortfolioEngine {
    config: EngineConfig,
    cache: Option<ResultCache>,
}

impl Default for PortfolioEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PortfolioEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| ResultCache::new(config.cache_ttl()));
        Self { config, cache }
    }

    pub fn with_cache(config: EngineConfig, cache: Option<ResultCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    pub fn compute(&mut self, inputs: &PortfolioInputs) -> PortfolioOutput {
        self.compute_at(inputs, Instant::now())
    }

    pub fn compute_at(&mut self, inputs: &PortfolioInputs, now: Instant) -> PortfolioOutput {
        let inputs = inputs.sanitized();
        let key = ResultCache::key_for(&inputs);

        if let Some(cache) = self.cache.as_mut() {
            if let Some(hit) = cache.get(&key, now) {
                debug!(%key, "portfolio cache hit");
                return hit;
            }
        }

        match run_pipeline(&inputs, &self.config) {
            Ok(output) => {
                if let Some(cache) = self.cache.as_mut() {
                    debug!(%key, "portfolio cache store");
                    cache.insert(key, output.clone(), now);
                }
                output
            }
            Err(err) => {
                error!(error = %err, "portfolio pipeline failed; using emergency safe mix");
                emergency_output(&inputs, &err)
            }
        }
    }
}

pub fn compute_portfolio_from_inputs(inputs: &PortfolioInputs) -> PortfolioOutput {
    PortfolioEngine::with_cache(EngineConfig::default(), None).compute(inputs)
}

fn run_pipeline(inputs: &PortfolioInputs, config: &EngineConfig) -> EngineResult<PortfolioOutput> {
    let profile = MixProfile::from_inputs(inputs);
    let band = profile.volume_band;
    let risk_ceiling = effective_risk_max(band, profile.risk_pref);
    debug!(?band, pref = ?profile.risk_pref, risk_ceiling, "classified portfolio");

    let bounds = MixBounds::for_profile(&profile, config)?;
    let mut mix = adjust(&profile.starting_mix(inputs.base_mix.as_ref()), &bounds)?;
    let (mut yield_pa, mut risk_score) = score(&mix)?;

    let check = check_risk(risk_score, profile.risk_pref, band);
    let mut warnings = check.warnings;

    // At most one substitution per call; the safer preset is not re-validated.
    if check.requires_fallback {
        let safer = profile.risk_pref.safer();
        warn!(risk_score, ?safer, "risk overshoot; substituting safer preset");
        mix = adjust(&preset_mix(safer), &bounds)?;
        (yield_pa, risk_score) = score(&mix)?;
        warnings.push(PortfolioWarning::new(
            WarningCode::FallbackApplied,
            format!("Risk limit exceeded; the {safer:?} preset was applied instead."),
        ));
    }

    Ok(PortfolioOutput {
        future_value: projected_value(inputs, yield_pa),
        mix,
        yield_pa,
        risk_score,
        volume_band: band,
        risk_ceiling,
        warnings,
    })
}

fn score(mix: &Mix) -> EngineResult<(f64, f64)> {
    let yield_pa = approx_yield_annual_from_mix(mix);
    if !yield_pa.is_finite() {
        return Err(EngineError::NonFiniteScore { what: "yield" });
    }
    let risk_score = risk_score_0_to_10(mix);
    if !risk_score.is_finite() {
        return Err(EngineError::NonFiniteScore { what: "risk" });
    }
    Ok((yield_pa, risk_score))
}

fn projected_value(inputs: &PortfolioInputs, yield_pa: f64) -> f64 {
    future_value(
        inputs.lump_sum_eur,
        inputs.monthly_contribution,
        inputs.horizon_years,
        yield_pa,
    )
    .min(f64::MAX)
}

fn emergency_output(inputs: &PortfolioInputs, err: &EngineError) -> PortfolioOutput {
    let mix = emergency_safe_mix();
    let yield_pa = approx_yield_annual_from_mix(&mix);
    let band = classify_volume(total_volume(
        inputs.lump_sum_eur,
        inputs.monthly_contribution,
        inputs.horizon_years,
    ));

    PortfolioOutput {
        future_value: projected_value(inputs, yield_pa),
        risk_score: risk_score_0_to_10(&mix),
        mix,
        yield_pa,
        volume_band: band,
        risk_ceiling: effective_risk_max(band, inputs.risk_pref),
        warnings: vec![PortfolioWarning::new(
            WarningCode::EmergencySafeMix,
            format!("Portfolio could not be computed ({err}); a safe fallback allocation is shown."),
        )],
    }
}
