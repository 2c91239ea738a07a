use super::util::bounded;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Single sorted set of post id -> views. It carries no TTL; members leave
/// only through `remove` when their post is deleted.
pub struct RedisViewScoreStore {
    conn: ConnectionManager,
    key: String,
    op_timeout: Duration,
}

impl RedisViewScoreStore {
    pub fn new(conn: ConnectionManager, prefix: &str, op_timeout: Duration) -> Self {
        RedisViewScoreStore {
            conn,
            key: format!("{prefix}:post:view_scores"),
            op_timeout,
        }
    }

    fn to_counts(raw: Vec<(ItemId, f64)>) -> Vec<(ItemId, u64)> {
        raw.into_iter()
            .map(|(item, score)| (item, score_to_count(score)))
            .collect()
    }
}

#[async_trait::async_trait]
impl ViewScoreStore for RedisViewScoreStore {
    async fn increment(&self, item: ItemId) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let score: f64 = bounded(self.op_timeout, conn.zincr(&self.key, item, 1)).await?;
        Ok(score_to_count(score))
    }

    async fn score(&self, item: ItemId) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.clone();
        let score: Option<f64> = bounded(self.op_timeout, conn.zscore(&self.key, item)).await?;
        Ok(score.map(score_to_count))
    }

    async fn snapshot(&self) -> Result<Vec<(ItemId, u64)>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Vec<(ItemId, f64)> =
            bounded(self.op_timeout, conn.zrange_withscores(&self.key, 0, -1)).await?;
        Ok(Self::to_counts(raw))
    }

    async fn top_range(&self, start: u64, stop: u64) -> Result<Vec<(ItemId, u64)>, StoreError> {
        if stop < start {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let raw: Vec<(ItemId, f64)> = bounded(
            self.op_timeout,
            conn.zrevrange_withscores(&self.key, start as isize, stop as isize),
        )
        .await?;
        Ok(Self::to_counts(raw))
    }

    async fn remove(&self, item: ItemId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = bounded(self.op_timeout, conn.zrem(&self.key, item)).await?;
        Ok(())
    }
}
