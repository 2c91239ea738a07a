#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or too slow. Callers may retry idempotent reads.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Internal(String),
}
