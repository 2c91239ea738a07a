use super::StoreError;
use crate::domain_model::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SwapOutcome {
    Swapped,
    Absent,
    Mismatch,
}

/// Single-slot refresh token storage keyed by identity.
///
/// Every operation touches one key, so the backend's native per-key
/// atomicity is all the locking there is.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Upsert and reset the TTL.
    async fn put(&self, identity: Identity, token: &str, ttl: Duration)
    -> Result<(), StoreError>;

    async fn get(&self, identity: Identity) -> Result<Option<String>, StoreError>;

    /// Plain equality against the stored value; says nothing about validity.
    async fn exists(&self, identity: Identity, token: &str) -> Result<bool, StoreError>;

    async fn remove(&self, identity: Identity) -> Result<(), StoreError>;

    /// Replace the stored value with `replacement` only if it currently
    /// equals `expected`. Atomic with respect to every other call on the
    /// same identity.
    async fn compare_and_swap(
        &self,
        identity: Identity,
        expected: &str,
        replacement: &str,
        ttl: Duration,
    ) -> Result<SwapOutcome, StoreError>;
}
