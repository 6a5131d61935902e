//  LIB.rs
//
//  Created:
//    17 Oct 2026, 17:02:54
//  Last edited:
//    18 Oct 2026, 11:21:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a [`Cache`] that is backed by an external Redis server,
//!   shared between all instances of the backend.
//

use std::future::Future;
use std::time::Duration;

use deadpool_redis::{Config, CreatePoolError, Pool, PoolConfig, PoolError, Runtime};
use redis::{AsyncCommands as _, ConnectionInfo, IntoConnectionInfo as _, RedisError};
use specifications::cache::{Cache, CacheKey};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, span, Instrument as _, Level};


/***** CONSTANTS *****/
/// The default URL of the Redis server.
pub const DEFAULT_URL: &str = "redis://127.0.0.1:6379";





/***** ERRORS *****/
/// Defines the errors originating from the [`RedisCache`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Illegal Redis URL {url:?}")]
    Url {
        url: String,
        #[source]
        err: RedisError,
    },
    #[error("Failed to create Redis connection pool for {url:?}")]
    PoolCreate {
        url: String,
        #[source]
        err: CreatePoolError,
    },
    #[error("Failed to get a Redis connection from the pool")]
    Pool {
        #[source]
        err: PoolError,
    },
    #[error("Failed to {op} {key} in Redis")]
    Command {
        op:  &'static str,
        key: String,
        #[source]
        err: RedisError,
    },
    #[error("Timed out after {}ms trying to {op} {key} in Redis", timeout.as_millis())]
    Timeout { op: &'static str, key: String, timeout: Duration },
}





/***** AUXILLARY *****/
/// Configures the [`RedisCache`].
#[derive(Clone, Debug)]
pub struct RedisCacheConfig {
    /// The URL of the server, e.g., `redis://127.0.0.1:6379`.
    pub url: String,
    /// The password to authenticate with, overriding any in the URL.
    pub password: Option<String>,
    /// The logical database to select.
    pub db: i64,
    /// The maximum number of pooled connections.
    pub pool_size: usize,
    /// How long a single get or set may take in total.
    pub op_timeout: Duration,
}
impl Default for RedisCacheConfig {
    #[inline]
    fn default() -> Self { Self { url: DEFAULT_URL.into(), password: None, db: 0, pool_size: 16, op_timeout: Duration::from_secs(2) } }
}
impl RedisCacheConfig {
    /// Combines the URL with the password and database into the full connection info.
    ///
    /// # Errors
    /// This function errors if the URL is not a Redis URL.
    pub fn connection_info(&self) -> Result<ConnectionInfo, Error> {
        let mut info: ConnectionInfo = self.url.as_str().into_connection_info().map_err(|err| Error::Url { url: self.url.clone(), err })?;
        if let Some(password) = self.password.as_ref().filter(|pw| !pw.is_empty()) {
            info.redis.password = Some(password.clone());
        }
        info.redis.db = self.db;
        Ok(info)
    }
}





/***** LIBRARY *****/
/// A [`Cache`] that stores its entries in Redis.
///
/// Entries expire on the server side, with millisecond precision.
#[derive(Clone)]
pub struct RedisCache {
    pool:       Pool,
    op_timeout: Duration,
}
impl RedisCache {
    /// Constructor for the RedisCache.
    ///
    /// No connection is made yet; connections are opened lazily when the cache is first used.
    ///
    /// # Arguments
    /// - `config`: The [`RedisCacheConfig`] describing which server to connect to and how.
    ///
    /// # Returns
    /// A new RedisCache.
    ///
    /// # Errors
    /// This function errors if the URL or pool configuration is unusable.
    pub fn new(config: &RedisCacheConfig) -> Result<Self, Error> {
        let mut pool: PoolConfig = PoolConfig::new(config.pool_size);
        pool.timeouts.wait = Some(config.op_timeout);
        pool.timeouts.create = Some(config.op_timeout);
        pool.timeouts.recycle = Some(config.op_timeout);

        let mut redis: Config = Config::from_connection_info(config.connection_info()?);
        redis.pool = Some(pool);
        let pool: Pool = redis.create_pool(Some(Runtime::Tokio1)).map_err(|err| Error::PoolCreate { url: config.url.clone(), err })?;
        info!("Created Redis cache pool for {:?}, database {} (max {} connection(s))", config.url, config.db, config.pool_size);
        Ok(Self { pool, op_timeout: config.op_timeout })
    }

    /// Runs a command against the server, within the operation timeout.
    async fn run<T, F>(&self, op: &'static str, key: &CacheKey, cmd: impl FnOnce(deadpool_redis::Connection, String) -> F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        let skey: String = key.to_string();
        let work = async {
            let conn = self.pool.get().await.map_err(|err| Error::Pool { err })?;
            cmd(conn, skey.clone()).await.map_err(|err| Error::Command { op, key: skey.clone(), err })
        };
        let res = timeout(self.op_timeout, work).await;
        match res {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout { op, key: skey, timeout: self.op_timeout }),
        }
    }
}
impl Cache for RedisCache {
    type Error = Error;

    fn get(&self, key: &CacheKey) -> impl Send + Future<Output = Result<Option<Vec<u8>>, Self::Error>> {
        let key: CacheKey = *key;
        async move {
            let value: Option<Vec<u8>> = self.run("get", &key, |mut conn, skey| async move { conn.get(skey).await }).await?;
            debug!("Redis cache {} for {key}", if value.is_some() { "hit" } else { "miss" });
            Ok(value)
        }
        .instrument(span!(Level::DEBUG, "RedisCache::get"))
    }

    fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> impl Send + Future<Output = Result<(), Self::Error>> {
        let key: CacheKey = *key;
        // Redis refuses non-positive expiry times
        let ttl_ms: u64 = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        async move {
            self.run("set", &key, |mut conn, skey| async move { conn.pset_ex::<_, _, ()>(skey, value, ttl_ms).await }).await?;
            debug!("Stored {key} in Redis cache (ttl {ttl_ms}ms)");
            Ok(())
        }
        .instrument(span!(Level::DEBUG, "RedisCache::set"))
    }
}





/***** TESTS *****/
