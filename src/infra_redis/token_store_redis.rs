use super::util::bounded;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

const REFRESH_ROTATE: &str = include_str!("refresh_rotate.lua");

pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
    op_timeout: Duration,
    rotate_script: Script,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, op_timeout: Duration) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
            op_timeout,
            rotate_script: Script::new(REFRESH_ROTATE),
        }
    }

    fn key(&self, identity: Identity) -> String {
        format!("{}:refresh:{}", self.prefix, identity)
    }

    #[inline]
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn put(
        &self,
        identity: Identity,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = self.key(identity);
        let mut conn = self.conn.clone();
        let _: () = bounded(
            self.op_timeout,
            conn.set_ex(&key, token, Self::ttl_secs(ttl)),
        )
        .await?;
        Ok(())
    }

    async fn get(&self, identity: Identity) -> Result<Option<String>, StoreError> {
        let key = self.key(identity);
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, conn.get(&key)).await
    }

    async fn exists(&self, identity: Identity, token: &str) -> Result<bool, StoreError> {
        Ok(self.get(identity).await?.as_deref() == Some(token))
    }

    async fn remove(&self, identity: Identity) -> Result<(), StoreError> {
        let key = self.key(identity);
        let mut conn = self.conn.clone();
        let _: () = bounded(self.op_timeout, conn.del(&key)).await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        identity: Identity,
        expected: &str,
        replacement: &str,
        ttl: Duration,
    ) -> Result<SwapOutcome, StoreError> {
        let key = self.key(identity);
        let mut conn = self.conn.clone();
        let mut invocation = self.rotate_script.key(&key);
        invocation
            .arg(expected)
            .arg(replacement)
            .arg(Self::ttl_secs(ttl));
        let status: i64 = bounded(self.op_timeout, invocation.invoke_async(&mut conn)).await?;

        match status {
            1 => Ok(SwapOutcome::Swapped),
            0 => Ok(SwapOutcome::Mismatch),
            -1 => Ok(SwapOutcome::Absent),
            other => Err(StoreError::Internal(format!(
                "unknown rotate script status {other}"
            ))),
        }
    }
}
