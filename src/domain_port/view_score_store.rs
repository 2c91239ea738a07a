use super::StoreError;
use crate::domain_model::*;

/// The live popularity ranking: one ordered set of item id -> view count.
#[async_trait::async_trait]
pub trait ViewScoreStore: Send + Sync {
    /// Atomically adds one view, creating the member at 1. Returns the new score.
    async fn increment(&self, item: ItemId) -> Result<u64, StoreError>;

    async fn score(&self, item: ItemId) -> Result<Option<u64>, StoreError>;

    /// Every member with its score, in one pass.
    async fn snapshot(&self) -> Result<Vec<(ItemId, u64)>, StoreError>;

    /// Members ranked `start..=stop` by descending score.
    async fn top_range(&self, start: u64, stop: u64) -> Result<Vec<(ItemId, u64)>, StoreError>;

    async fn remove(&self, item: ItemId) -> Result<(), StoreError>;
}
