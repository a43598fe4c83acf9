use thiserror::Error;

use super::types::AssetKey;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("asset bounds are infeasible: caps sum to {cap_total:.2}%, floors to {floor_total:.2}%")]
    InfeasibleBounds { cap_total: f64, floor_total: f64 },

    #[error("finalized mix violates invariant: {reason}")]
    InvariantViolation { reason: String },

    #[error("{asset:?} allocation of {pct}% is outside [0, {cap}]")]
    AssetOutOfBounds { asset: AssetKey, pct: f64, cap: f64 },

    #[error("non-finite {what} score")]
    NonFiniteScore { what: &'static str },
}
