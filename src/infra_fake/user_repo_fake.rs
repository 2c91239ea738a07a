use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug)]
pub struct FakeUserRepo {
    by_username: DashMap<String, UserRecord>,
    next_id: AtomicI64,
}

impl FakeUserRepo {
    pub fn new() -> Self {
        FakeUserRepo {
            by_username: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for FakeUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for FakeUserRepo {
    async fn upsert_social(&self, profile: &SocialProfile) -> Result<UserRecord, StoreError> {
        let username = profile.username();
        let record = self
            .by_username
            .entry(username.clone())
            .or_insert_with(|| UserRecord {
                identity: Identity(self.next_id.fetch_add(1, Ordering::Relaxed)),
                username,
                role: Role::User,
            });
        Ok(record.clone())
    }
}
