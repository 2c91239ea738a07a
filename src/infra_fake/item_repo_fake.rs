use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::{DashMap, DashSet};
use std::cmp::Reverse;

/// In-process post table. Update failures can be injected per item.
#[derive(Debug, Default)]
pub struct FakeItemRepo {
    rows: DashMap<ItemId, ItemRecord>,
    failing: DashSet<ItemId>,
}

impl FakeItemRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ItemRecord) {
        self.rows.insert(record.id, record);
    }

    pub fn delete(&self, id: ItemId) {
        self.rows.remove(&id);
    }

    pub fn fail_updates_for(&self, id: ItemId) {
        self.failing.insert(id);
    }

    pub fn heal(&self, id: ItemId) {
        self.failing.remove(&id);
    }

    pub fn view_count(&self, id: ItemId) -> Option<u64> {
        self.rows.get(&id).map(|row| row.view_count)
    }
}

#[async_trait::async_trait]
impl ItemRepo for FakeItemRepo {
    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>, StoreError> {
        Ok(self.rows.get(&id).map(|row| row.clone()))
    }

    async fn find_all_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>, StoreError> {
        let mut found: Vec<ItemRecord> = ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| row.clone()))
            .collect();
        // Like `WHERE id IN (...)`: primary key order, not request order.
        found.sort_by_key(|row| row.id);
        Ok(found)
    }

    async fn list_recent(&self, offset: u64, limit: usize) -> Result<Vec<ItemRecord>, StoreError> {
        let mut all: Vec<ItemRecord> = self.rows.iter().map(|row| row.clone()).collect();
        all.sort_by_key(|row| (Reverse(row.created_at), Reverse(row.id)));
        Ok(all.into_iter().skip(offset as usize).take(limit).collect())
    }

    async fn update_view_count(&self, id: ItemId, count: u64) -> Result<CountUpdate, StoreError> {
        if self.failing.contains(&id) {
            return Err(StoreError::Unavailable(format!("injected failure for {id}")));
        }
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.view_count = row.view_count.max(count);
                Ok(CountUpdate::Applied)
            }
            None => Ok(CountUpdate::Missing),
        }
    }
}
