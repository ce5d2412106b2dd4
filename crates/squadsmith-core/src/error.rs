// Request-level error type returned by the engine.

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("only {available} eligible candidates, need at least {required}")]
    InsufficientCandidates { available: usize, required: usize },

    #[error("no feasible squad for any of {attempted} transfer targets: {}", .reasons.join("; "))]
    NoOptionsGenerated {
        attempted: usize,
        reasons: Vec<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
