use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tracing::info;

use super::{CounterStore, StoreError};

// INCR and the first-hit EXPIRE run as one script so a crash between the two
// can never leave a counter without a TTL.
const INCR_WITH_EXPIRY: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Counter store shared by every server instance.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: MultiplexedConnection,
    script: Script,
}

impl RedisCounterStore {
    /// Opens a multiplexed connection and pings the server.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        info!("Redis client connected");

        Ok(Self {
            conn,
            script: Script::new(INCR_WITH_EXPIRY),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let count = self
            .script
            .key(key)
            .arg(ttl.as_secs().max(1))
            .invoke_async::<_, i64>(&mut conn)
            .await?;
        Ok(count)
    }
}
