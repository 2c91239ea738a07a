use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::cmp::Reverse;

#[derive(Debug, Default)]
pub struct FakeViewScoreStore {
    scores: DashMap<ItemId, u64>,
}

impl FakeViewScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, item: ItemId, score: u64) {
        self.scores.insert(item, score);
    }

    // ZREVRANGE breaks score ties by member bytes, descending, so "9" ranks
    // ahead of "10".
    fn ranked(&self) -> Vec<(ItemId, u64)> {
        let mut all: Vec<(ItemId, u64)> = self
            .scores
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        all.sort_by_cached_key(|&(item, score)| (Reverse(score), Reverse(item.to_string())));
        all
    }
}

#[async_trait::async_trait]
impl ViewScoreStore for FakeViewScoreStore {
    async fn increment(&self, item: ItemId) -> Result<u64, StoreError> {
        let mut score = self.scores.entry(item).or_insert(0);
        *score += 1;
        Ok(*score)
    }

    async fn score(&self, item: ItemId) -> Result<Option<u64>, StoreError> {
        Ok(self.scores.get(&item).map(|score| *score))
    }

    async fn snapshot(&self) -> Result<Vec<(ItemId, u64)>, StoreError> {
        Ok(self.ranked())
    }

    async fn top_range(&self, start: u64, stop: u64) -> Result<Vec<(ItemId, u64)>, StoreError> {
        if stop < start {
            return Ok(Vec::new());
        }
        Ok(self
            .ranked()
            .into_iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .collect())
    }

    async fn remove(&self, item: ItemId) -> Result<(), StoreError> {
        self.scores.remove(&item);
        Ok(())
    }
}
