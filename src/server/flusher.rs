use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct FlushReport {
    pub synced: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Copies live view scores into the durable post table on a fixed period.
///
/// The sorted set is left untouched: it stays the read source, and anything
/// that failed to persist is simply picked up again on the next pass.
pub struct CounterFlusher {
    score_store: Arc<dyn ViewScoreStore>,
    item_repo: Arc<dyn ItemRepo>,
    interval: Duration,
    cancellation_token: CancellationToken,
    in_flight: Mutex<()>,
    /// Holds only members of the latest snapshot.
    last_flushed: DashMap<ItemId, u64>,
}

impl CounterFlusher {
    pub fn new(
        score_store: Arc<dyn ViewScoreStore>,
        item_repo: Arc<dyn ItemRepo>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            score_store,
            item_repo,
            interval,
            cancellation_token,
            in_flight: Mutex::new(()),
            last_flushed: DashMap::new(),
        }
    }

    /// One pass over the whole set. Returns `None` when a previous pass is
    /// still running.
    pub async fn flush_once(&self) -> anyhow::Result<Option<FlushReport>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("previous view count flush still running, skipping");
            return Ok(None);
        };

        let snapshot = self.score_store.snapshot().await?;
        if snapshot.is_empty() {
            debug!("no view counts to flush");
            self.last_flushed.clear();
            return Ok(Some(FlushReport::default()));
        }

        let present: HashSet<ItemId> = snapshot.iter().map(|(item, _)| *item).collect();
        self.last_flushed.retain(|item, _| present.contains(item));

        let mut report = FlushReport::default();
        for (item, score) in snapshot {
            if self
                .last_flushed
                .get(&item)
                .is_some_and(|last| *last == score)
            {
                report.unchanged += 1;
                continue;
            }

            match self.item_repo.update_view_count(item, score).await {
                Ok(CountUpdate::Applied) => {
                    self.last_flushed.insert(item, score);
                    report.synced += 1;
                }
                Ok(CountUpdate::Missing) => {
                    debug!(%item, "post no longer stored, skipping view count");
                    self.last_flushed.remove(&item);
                    report.missing += 1;
                }
                Err(e) => {
                    warn!(%item, error = %e, "view count flush failed, retrying next cycle");
                    report.failed += 1;
                }
            }
        }

        info!(
            synced = report.synced,
            unchanged = report.unchanged,
            missing = report.missing,
            failed = report.failed,
            "view counts flushed"
        );
        Ok(Some(report))
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; start counting from now instead.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("CounterFlusher shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.flush_once().await {
                        error!("CounterFlusher error: {:#}", e);
                    }
                }
            }
        }

        // Last pass so a clean shutdown persists what the cache holds.
        if let Err(e) = self.flush_once().await {
            error!("CounterFlusher final flush error: {:#}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_fake::{FakeItemRepo, FakeViewScoreStore};
    use chrono::Utc;

    const A: ItemId = ItemId(1);
    const B: ItemId = ItemId(2);
    const GONE: ItemId = ItemId(3);

    fn record(id: ItemId, view_count: u64) -> ItemRecord {
        ItemRecord {
            id,
            title: format!("post {id}"),
            price: 500,
            view_count,
            created_at: Utc::now(),
        }
    }

    fn setup() -> (CounterFlusher, Arc<FakeItemRepo>, Arc<FakeViewScoreStore>) {
        let items = Arc::new(FakeItemRepo::new());
        let scores = Arc::new(FakeViewScoreStore::new());
        items.insert(record(A, 0));
        items.insert(record(B, 0));
        let flusher = CounterFlusher::new(
            scores.clone(),
            items.clone(),
            Duration::from_millis(10),
            CancellationToken::new(),
        );
        (flusher, items, scores)
    }

    #[tokio::test]
    async fn flush_copies_scores_and_keeps_the_set() {
        let (flusher, items, scores) = setup();
        scores.seed(A, 5);
        scores.seed(B, 12);

        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.synced, 2);
        assert_eq!(items.view_count(A), Some(5));
        assert_eq!(items.view_count(B), Some(12));
        assert_eq!(scores.score(A).await.unwrap(), Some(5));
        assert_eq!(scores.score(B).await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn repeat_flush_without_views_writes_nothing() {
        let (flusher, items, scores) = setup();
        scores.seed(A, 5);
        scores.seed(B, 12);
        flusher.flush_once().await.unwrap();

        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(
            report,
            FlushReport {
                unchanged: 2,
                ..FlushReport::default()
            }
        );
        assert_eq!(items.view_count(A), Some(5));

        scores.increment(A).await.unwrap();
        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(items.view_count(A), Some(6));
    }

    #[tokio::test]
    async fn missing_posts_are_skipped() {
        let (flusher, items, scores) = setup();
        scores.seed(A, 4);
        scores.seed(GONE, 9);

        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(items.view_count(A), Some(4));
        assert_eq!(items.view_count(GONE), None);
    }

    #[tokio::test]
    async fn failed_item_does_not_abort_and_is_retried() {
        let (flusher, items, scores) = setup();
        scores.seed(A, 3);
        scores.seed(B, 8);
        items.fail_updates_for(A);

        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(items.view_count(A), Some(0));
        assert_eq!(items.view_count(B), Some(8));

        items.heal(A);
        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(items.view_count(A), Some(3));
    }

    #[tokio::test]
    async fn durable_count_never_moves_backwards() {
        let (flusher, items, scores) = setup();
        items.insert(record(A, 500));
        // Cache was wiped and the post has been viewed once since.
        scores.seed(A, 1);

        flusher.flush_once().await.unwrap();
        assert_eq!(items.view_count(A), Some(500));
    }

    #[tokio::test]
    async fn flushed_values_are_forgotten_with_their_members() {
        let (flusher, items, scores) = setup();
        scores.seed(A, 4);
        scores.seed(B, 6);
        flusher.flush_once().await.unwrap();
        assert!(flusher.last_flushed.contains_key(&A));
        assert!(flusher.last_flushed.contains_key(&B));

        // Post B deleted along with its score.
        items.delete(B);
        scores.remove(B).await.unwrap();
        flusher.flush_once().await.unwrap();
        assert!(flusher.last_flushed.contains_key(&A));
        assert!(!flusher.last_flushed.contains_key(&B));

        // Post A deleted but its score lingers.
        items.delete(A);
        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.unchanged, 1);
        scores.increment(A).await.unwrap();
        let report = flusher.flush_once().await.unwrap().unwrap();
        assert_eq!(report.missing, 1);
        assert!(!flusher.last_flushed.contains_key(&A));

        scores.remove(A).await.unwrap();
        flusher.flush_once().await.unwrap();
        assert!(flusher.last_flushed.is_empty());
    }

    struct SlowRepo {
        inner: FakeItemRepo,
    }

    #[async_trait::async_trait]
    impl ItemRepo for SlowRepo {
        async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn find_all_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>, StoreError> {
            self.inner.find_all_by_ids(ids).await
        }
        async fn list_recent(
            &self,
            offset: u64,
            limit: usize,
        ) -> Result<Vec<ItemRecord>, StoreError> {
            self.inner.list_recent(offset, limit).await
        }
        async fn update_view_count(
            &self,
            id: ItemId,
            count: u64,
        ) -> Result<CountUpdate, StoreError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.inner.update_view_count(id, count).await
        }
    }

    #[tokio::test]
    async fn overlapping_flush_is_skipped() {
        let inner = FakeItemRepo::new();
        inner.insert(record(A, 0));
        let scores = Arc::new(FakeViewScoreStore::new());
        scores.seed(A, 2);
        let flusher = Arc::new(CounterFlusher::new(
            scores,
            Arc::new(SlowRepo { inner }),
            Duration::from_secs(60),
            CancellationToken::new(),
        ));

        let running = {
            let flusher = flusher.clone();
            tokio::spawn(async move { flusher.flush_once().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(flusher.flush_once().await.unwrap(), None);
        let first = running.await.unwrap().unwrap().unwrap();
        assert_eq!(first.synced, 1);
    }

    #[tokio::test]
    async fn run_flushes_until_cancelled() {
        let items = Arc::new(FakeItemRepo::new());
        items.insert(record(A, 0));
        let scores = Arc::new(FakeViewScoreStore::new());
        scores.seed(A, 7);
        let cancel = CancellationToken::new();
        let flusher = Arc::new(CounterFlusher::new(
            scores.clone(),
            items.clone(),
            Duration::from_millis(10),
            cancel.clone(),
        ));

        let handle = {
            let flusher = flusher.clone();
            tokio::spawn(async move { flusher.run().await })
        };
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(items.view_count(A), Some(7));

        scores.increment(A).await.unwrap();
        cancel.cancel();
        handle.await.unwrap().unwrap();
        // The shutdown pass picks up the last view.
        assert_eq!(items.view_count(A), Some(8));
    }
}
