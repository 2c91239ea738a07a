use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slot {
    token: String,
    expires_at: Instant,
}

impl Slot {
    fn live(&self) -> Option<&str> {
        (Instant::now() < self.expires_at).then_some(self.token.as_str())
    }
}

/// In-process token store. A shard write lock stands in for Redis'
/// single-key atomicity.
#[derive(Debug, Default)]
pub struct FakeTokenStore {
    slots: DashMap<Identity, Slot>,
}

impl FakeTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenStore for FakeTokenStore {
    async fn put(
        &self,
        identity: Identity,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.slots.insert(
            identity,
            Slot {
                token: token.to_owned(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, identity: Identity) -> Result<Option<String>, StoreError> {
        Ok(self
            .slots
            .get(&identity)
            .and_then(|slot| slot.live().map(str::to_owned)))
    }

    async fn exists(&self, identity: Identity, token: &str) -> Result<bool, StoreError> {
        Ok(self.get(identity).await?.as_deref() == Some(token))
    }

    async fn remove(&self, identity: Identity) -> Result<(), StoreError> {
        self.slots.remove(&identity);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        identity: Identity,
        expected: &str,
        replacement: &str,
        ttl: Duration,
    ) -> Result<SwapOutcome, StoreError> {
        let Some(mut slot) = self.slots.get_mut(&identity) else {
            return Ok(SwapOutcome::Absent);
        };
        let outcome = match slot.live() {
            None => SwapOutcome::Absent,
            Some(current) if current != expected => SwapOutcome::Mismatch,
            Some(_) => SwapOutcome::Swapped,
        };
        if outcome == SwapOutcome::Swapped {
            *slot = Slot {
                token: replacement.to_owned(),
                expires_at: Instant::now() + ttl,
            };
        }
        Ok(outcome)
    }
}
