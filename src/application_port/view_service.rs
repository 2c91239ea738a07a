use crate::domain_model::*;
use crate::domain_port::StoreError;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    #[error("infrastructure unavailable: {0}")]
    InfrastructureUnavailable(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for ViewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => ViewError::InfrastructureUnavailable(e),
            StoreError::Internal(e) => ViewError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrder {
    #[default]
    Recent,
    MostViewed,
}

#[async_trait::async_trait]
pub trait ViewService: Send + Sync {
    /// Best effort: failures are logged and `None` is returned.
    async fn increment(&self, item: ItemId) -> Option<u64>;

    async fn current_score(&self, item: ItemId) -> Result<Option<u64>, ViewError>;

    /// Fetch a post, count the view and return it with its live count.
    async fn detail(&self, item: ItemId) -> Result<ItemView, ViewError>;

    async fn list(&self, order: ListingOrder, page: PageRequest)
    -> Result<Slice<ItemView>, ViewError>;

    /// Drop the live score of a deleted post. Called by the post deletion
    /// flow, which lives outside this service.
    async fn forget(&self, item: ItemId) -> Result<(), ViewError>;
}
