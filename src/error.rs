use thiserror::Error;

/// Failure modes of a dispatch call itself. Per-recipient faults never
/// surface here; they are absorbed into the report as `failure` outcomes.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed request, rejected before any recipient is touched.
    #[error("{0}")]
    Validation(String),

    /// Request-wide infrastructure fault, e.g. the recipient resolver being
    /// unreachable before any batch starts.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
