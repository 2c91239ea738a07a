use crate::domain_model::*;
use crate::domain_port::StoreError;
use redis::{FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value};
use std::future::Future;
use std::time::Duration;

/// Runs one Redis round trip under `timeout`. Anything that smells like the
/// server being gone or slow becomes `Unavailable`.
pub async fn bounded<T>(
    timeout: Duration,
    op: impl Future<Output = RedisResult<T>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(timeout, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(classify(e)),
        Err(_) => Err(StoreError::Unavailable(format!(
            "redis call exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}

fn classify(e: RedisError) -> StoreError {
    if e.is_timeout() || e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
    {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Internal(e.to_string())
    }
}

impl ToRedisArgs for ItemId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for ItemId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let item_id = s.parse::<ItemId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid ItemId member",
                e.to_string(),
            ))
        })?;
        Ok(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_call_is_unavailable() {
        let result = bounded(
            Duration::from_millis(10),
            std::future::pending::<RedisResult<()>>(),
        )
        .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn connection_errors_are_unavailable_and_bad_replies_internal() {
        let refused = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(matches!(classify(refused), StoreError::Unavailable(_)));

        let bad_type = RedisError::from((redis::ErrorKind::TypeError, "not an integer"));
        assert!(matches!(classify(bad_type), StoreError::Internal(_)));
    }

    #[test]
    fn item_id_members_parse() {
        let value = Value::BulkString(b"42".to_vec());
        assert_eq!(ItemId::from_redis_value(&value).unwrap(), ItemId(42));

        let value = Value::BulkString(b"forty-two".to_vec());
        assert!(ItemId::from_redis_value(&value).is_err());
    }
}
