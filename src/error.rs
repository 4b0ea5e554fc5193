use crate::stores::StoreError;

/// Structural validation failures. These indicate an integration bug in the
/// caller rather than bad user data, and are the only errors the engine
/// raises on its own behalf.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid age band: {0}")]
    InvalidAgeBand(String),
    #[error("negative binomial parameter r must be > 0 (got {r})")]
    NonPositiveDispersion { r: f64 },
    #[error("negative binomial parameter p must be in (0, 1) (got {p})")]
    SuccessProbabilityOutOfRange { p: f64 },
    #[error("negative binomial parameters must be finite (r={r}, p={p})")]
    NonFiniteParameters { r: f64, p: f64 },
}

/// Error surface of [`crate::engine::AdmissionEngine::calculate`].
///
/// Missing upstream data never appears here: an absent facility, snapshot, or
/// prebuilt block degrades to a documented heuristic instead. Cache failures
/// are logged and swallowed. What remains is invalid structured input and
/// transient document-store failures on the non-cache reads.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
