use super::StoreError;
use crate::domain_model::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountUpdate {
    Applied,
    Missing,
}

/// Durable post storage, as narrow as the ranking code needs it.
#[async_trait::async_trait]
pub trait ItemRepo: Send + Sync {
    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>, StoreError>;

    /// Order of the result is unspecified; missing ids are left out.
    async fn find_all_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>, StoreError>;

    /// Newest first.
    async fn list_recent(&self, offset: u64, limit: usize) -> Result<Vec<ItemRecord>, StoreError>;

    /// Raise the persisted view count to `count`. Never lowers it.
    async fn update_view_count(&self, id: ItemId, count: u64) -> Result<CountUpdate, StoreError>;
}
