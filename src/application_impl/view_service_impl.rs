use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RealViewService {
    item_repo: Arc<dyn ItemRepo>,
    score_store: Arc<dyn ViewScoreStore>,
}

impl RealViewService {
    pub fn new(item_repo: Arc<dyn ItemRepo>, score_store: Arc<dyn ViewScoreStore>) -> Self {
        Self {
            item_repo,
            score_store,
        }
    }

    /// Live score for display; a cache failure degrades to the durable count.
    async fn live_score(&self, item: ItemId) -> Option<u64> {
        match self.score_store.score(item).await {
            Ok(score) => score,
            Err(e) => {
                warn!(%item, error = %e, "view score unavailable, using durable count");
                None
            }
        }
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Slice<ItemView>, ViewError> {
        let rows = self
            .item_repo
            .list_recent(page.offset(), page.limit() + 1)
            .await?;
        let slice = Slice::from_lookahead(rows, page);

        let scores = join_all(slice.content.iter().map(|row| self.live_score(row.id))).await;
        let mut scores = scores.into_iter();
        Ok(slice.map(|row| ItemView::merge(row, scores.next().flatten())))
    }

    async fn list_most_viewed(&self, page: PageRequest) -> Result<Slice<ItemView>, ViewError> {
        let start = page.offset();
        // One extra member tells whether a next page exists.
        let mut ranked = self
            .score_store
            .top_range(start, start + page.limit() as u64)
            .await?;
        if ranked.is_empty() {
            return Ok(Slice::empty(page));
        }

        let has_next = ranked.len() > page.limit();
        ranked.truncate(page.limit());

        let ids: Vec<ItemId> = ranked.iter().map(|(id, _)| *id).collect();
        let mut by_id: HashMap<ItemId, ItemRecord> = self
            .item_repo
            .find_all_by_ids(&ids)
            .await?
            .into_iter()
            .map(|row| (row.id, row))
            .collect();

        // The bulk fetch ignores request order; restore the ranking.
        let content = ranked
            .into_iter()
            .filter_map(|(id, score)| match by_id.remove(&id) {
                Some(row) => Some(ItemView::merge(row, Some(score))),
                None => {
                    debug!(item = %id, "ranked item missing from storage");
                    None
                }
            })
            .collect();

        Ok(Slice {
            content,
            page: page.page,
            size: page.size,
            has_next,
        })
    }
}

#[async_trait::async_trait]
impl ViewService for RealViewService {
    async fn increment(&self, item: ItemId) -> Option<u64> {
        match self.score_store.increment(item).await {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(%item, error = %e, "view not counted");
                None
            }
        }
    }

    async fn current_score(&self, item: ItemId) -> Result<Option<u64>, ViewError> {
        Ok(self.score_store.score(item).await?)
    }

    async fn detail(&self, item: ItemId) -> Result<ItemView, ViewError> {
        let record = self
            .item_repo
            .find_by_id(item)
            .await?
            .ok_or(ViewError::ItemNotFound(item))?;
        let score = self.increment(item).await;
        Ok(ItemView::merge(record, score))
    }

    async fn list(
        &self,
        order: ListingOrder,
        page: PageRequest,
    ) -> Result<Slice<ItemView>, ViewError> {
        match order {
            ListingOrder::Recent => self.list_recent(page).await,
            ListingOrder::MostViewed => self.list_most_viewed(page).await,
        }
    }

    async fn forget(&self, item: ItemId) -> Result<(), ViewError> {
        self.score_store.remove(item).await?;
        debug!(%item, "view score dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_fake::{FakeItemRepo, FakeViewScoreStore};
    use chrono::{Duration, TimeZone, Utc};

    const A: ItemId = ItemId(1);
    const B: ItemId = ItemId(2);
    const C: ItemId = ItemId(3);

    fn record(id: ItemId, minutes: i64, view_count: u64) -> ItemRecord {
        ItemRecord {
            id,
            title: format!("post {id}"),
            price: 1000,
            view_count,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    fn setup() -> (Arc<RealViewService>, Arc<FakeItemRepo>, Arc<FakeViewScoreStore>) {
        let items = Arc::new(FakeItemRepo::new());
        let scores = Arc::new(FakeViewScoreStore::new());
        let service = RealViewService::new(items.clone(), scores.clone());
        (Arc::new(service), items, scores)
    }

    fn ids(slice: &Slice<ItemView>) -> Vec<ItemId> {
        slice.content.iter().map(|view| view.id).collect()
    }

    struct BrokenScores;

    #[async_trait::async_trait]
    impl ViewScoreStore for BrokenScores {
        async fn increment(&self, _: ItemId) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn score(&self, _: ItemId) -> Result<Option<u64>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn snapshot(&self) -> Result<Vec<(ItemId, u64)>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn top_range(&self, _: u64, _: u64) -> Result<Vec<(ItemId, u64)>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn remove(&self, _: ItemId) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_all_counted() {
        let (service, _, scores) = setup();
        scores.seed(A, 5);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.increment(A).await })
            })
            .collect();
        for task in join_all(tasks).await {
            assert!(task.unwrap().is_some());
        }

        assert_eq!(service.current_score(A).await.unwrap(), Some(55));
    }

    #[tokio::test]
    async fn most_viewed_pages_follow_scores() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 0));
        items.insert(record(B, 1, 0));
        items.insert(record(C, 2, 0));
        scores.seed(A, 10);
        scores.seed(B, 7);
        scores.seed(C, 3);

        let first = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 2))
            .await
            .unwrap();
        assert_eq!(ids(&first), vec![A, B]);
        assert!(first.has_next);
        assert_eq!(first.content[0].view_count, 10);

        let second = service
            .list(ListingOrder::MostViewed, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec![C]);
        assert!(!second.has_next);
    }

    #[tokio::test]
    async fn ranking_survives_unordered_bulk_fetch() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 0));
        items.insert(record(B, 1, 0));
        items.insert(record(C, 2, 0));
        scores.seed(C, 30);
        scores.seed(A, 20);
        scores.seed(B, 10);

        let page = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![C, A, B]);
    }

    #[tokio::test]
    async fn ranked_ids_missing_from_storage_are_dropped() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 0));
        scores.seed(A, 4);
        scores.seed(B, 9);

        let page = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![A]);
    }

    #[tokio::test]
    async fn empty_ranking_is_an_empty_page() {
        let (service, items, _) = setup();
        items.insert(record(A, 0, 3));

        let page = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert!(page.content.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn most_viewed_counts_follow_ranking_after_cache_loss() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 500));
        items.insert(record(B, 1, 10));
        scores.seed(A, 1);
        scores.seed(B, 10);

        let page = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 10))
            .await
            .unwrap();
        let shown: Vec<(ItemId, u64)> = page
            .content
            .iter()
            .map(|view| (view.id, view.view_count))
            .collect();
        assert_eq!(shown, vec![(B, 10), (A, 1)]);

        assert_eq!(service.detail(A).await.unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn recent_listing_merges_live_scores() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 2));
        items.insert(record(B, 10, 6));
        items.insert(record(C, 20, 1));
        scores.seed(B, 8);

        let page = service
            .list(ListingOrder::Recent, PageRequest::new(0, 2))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![C, B]);
        assert!(page.has_next);
        assert_eq!(page.content[0].view_count, 1);
        assert_eq!(page.content[1].view_count, 8);
    }

    #[tokio::test]
    async fn detail_counts_the_view() {
        let (service, items, _) = setup();
        items.insert(record(A, 0, 0));

        assert_eq!(service.detail(A).await.unwrap().view_count, 1);
        assert_eq!(service.detail(A).await.unwrap().view_count, 2);
        assert_eq!(service.current_score(A).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn detail_of_unknown_item_creates_no_score() {
        let (service, _, _) = setup();
        assert!(matches!(
            service.detail(A).await,
            Err(ViewError::ItemNotFound(A))
        ));
        assert_eq!(service.current_score(A).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_durable_count() {
        let items = Arc::new(FakeItemRepo::new());
        items.insert(record(A, 0, 17));
        let service = RealViewService::new(items, Arc::new(BrokenScores));

        assert_eq!(service.increment(A).await, None);
        assert_eq!(service.detail(A).await.unwrap().view_count, 17);

        let recent = service
            .list(ListingOrder::Recent, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(recent.content[0].view_count, 17);

        assert!(matches!(
            service
                .list(ListingOrder::MostViewed, PageRequest::default())
                .await,
            Err(ViewError::InfrastructureUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn forget_removes_the_score() {
        let (service, items, scores) = setup();
        items.insert(record(A, 0, 0));
        items.insert(record(B, 1, 0));
        scores.seed(A, 3);
        scores.seed(B, 2);

        // Post deletion removes the row, then the score.
        items.delete(A);
        service.forget(A).await.unwrap();
        assert_eq!(service.current_score(A).await.unwrap(), None);

        let page = service
            .list(ListingOrder::MostViewed, PageRequest::new(0, 1))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![B]);
        assert!(!page.has_next);
    }
}
