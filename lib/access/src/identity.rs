//  IDENTITY.rs
//
//  Created:
//    17 Oct 2026, 17:50:02
//  Last edited:
//    17 Oct 2026, 18:41:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the [`IdentityResolver`], which turns a verified subject
//!   into a full [`User`] by consulting a cache before the store.
//

use std::error::Error;
use std::time::Duration;

use specifications::cache::{Cache, CacheKey};
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::User;
use specifications::UserStore;
use thiserror::Error;
use tracing::{debug, span, Instrument as _, Level};


/***** CONSTANTS *****/
/// How long a resolved user remains in the cache.
pub const USER_TTL: Duration = Duration::from_secs(60);





/***** ERRORS *****/
/// Defines the errors originating from resolving users.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The user does not exist.
    #[error("User {id} not found")]
    NotFound { id: i64 },
    /// The store failed.
    #[error("Failed to retrieve user {id} from the store")]
    Store {
        id:  i64,
        #[source]
        err: Box<dyn 'static + Send + Sync + Error>,
    },
    /// The cache failed to answer. This is not the same as a miss.
    #[error("Failed to read {key} from the cache")]
    CacheRead {
        key: CacheKey,
        #[source]
        err: Box<dyn 'static + Send + Sync + Error>,
    },
    /// The cache failed to store a freshly retrieved user.
    #[error("Failed to write {key} to the cache")]
    CacheWrite {
        key: CacheKey,
        #[source]
        err: Box<dyn 'static + Send + Sync + Error>,
    },
    /// The cache returned something that isn't a user.
    #[error("Failed to decode cached {key}")]
    Decode {
        key: CacheKey,
        #[source]
        err: serde_json::Error,
    },
    #[error("Failed to encode user {id} for the cache")]
    Encode {
        id:  i64,
        #[source]
        err: serde_json::Error,
    },
}
impl ClassifiedError for ResolveError {
    #[inline]
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store { .. } | Self::CacheRead { .. } | Self::CacheWrite { .. } | Self::Decode { .. } | Self::Encode { .. } => ErrorKind::Internal,
        }
    }
}





/***** LIBRARY *****/
/// Resolves user IDs to [`User`]s, reading through a [`Cache`] in front of a [`UserStore`].
///
/// There is no invalidation; an entry lives out its TTL even if the user changes in the meantime.
/// To disable caching, give it a cache that never remembers anything.
#[derive(Clone, Debug)]
pub struct IdentityResolver<S, C> {
    store: S,
    cache: C,
    ttl:   Duration,
}
impl<S: UserStore, C: Cache> IdentityResolver<S, C> {
    /// Constructor for the IdentityResolver.
    ///
    /// # Arguments
    /// - `store`: The [`UserStore`] that is the source of truth.
    /// - `cache`: The [`Cache`] to consult first.
    ///
    /// # Returns
    /// A new IdentityResolver that caches users for [`USER_TTL`].
    #[inline]
    pub const fn new(store: S, cache: C) -> Self { Self { store, cache, ttl: USER_TTL } }

    /// Changes how long resolved users are cached.
    #[inline]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the store this resolver reads from.
    #[inline]
    pub const fn store(&self) -> &S { &self.store }

    /// Resolves the user with the given ID.
    ///
    /// A cached entry is returned without asking the store. Otherwise, the user is retrieved from
    /// the store and cached before being returned.
    ///
    /// # Arguments
    /// - `id`: The ID of the user to resolve.
    ///
    /// # Returns
    /// The [`User`] with that ID.
    ///
    /// # Errors
    /// This function errors with [`ResolveError::NotFound`] if there is no such user. Any failure
    /// of the cache or the store is an error too; in particular, an unreachable cache does not
    /// silently fall back to the store.
    pub async fn resolve(&self, id: i64) -> Result<User, ResolveError> {
        let key = CacheKey::user(id);
        async move {
            // Try the cache first
            if let Some(raw) = self.cache.get(&key).await.map_err(|err| ResolveError::CacheRead { key, err: Box::new(err) })? {
                debug!("Cache hit for {key}");
                return serde_json::from_slice(&raw).map_err(|err| ResolveError::Decode { key, err });
            }

            // Then the source of truth
            debug!("Cache miss for {key}, asking store");
            let user: User = match self.store.get_user(id).await {
                Ok(user) => user,
                Err(err) if err.kind() == ErrorKind::NotFound => return Err(ResolveError::NotFound { id }),
                Err(err) => return Err(ResolveError::Store { id, err: Box::new(err) }),
            };

            // Populate the cache for next time
            let raw: Vec<u8> = serde_json::to_vec(&user).map_err(|err| ResolveError::Encode { id, err })?;
            self.cache.set(&key, raw, self.ttl).await.map_err(|err| ResolveError::CacheWrite { key, err: Box::new(err) })?;
            Ok(user)
        }
        .instrument(span!(Level::DEBUG, "IdentityResolver::resolve", user = id))
        .await
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use memory_cache::MemoryCache;
    use no_op_cache::NoOpCache;

    use super::*;
    use crate::testing::{user, BrokenCache, CountingUserStore};

    #[tokio::test]
    async fn second_resolve_within_ttl_skips_store() {
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(42, "user", 1)]), MemoryCache::new());
        assert_eq!(resolver.resolve(42).await.unwrap().id, 42);
        assert_eq!(resolver.store().calls(), 1);
        assert_eq!(resolver.resolve(42).await.unwrap(), user(42, "user", 1));
        assert_eq!(resolver.store().calls(), 1);
    }

    #[tokio::test]
    async fn expired_entries_go_back_to_store() {
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(7, "user", 1)]), MemoryCache::new()).with_ttl(Duration::ZERO);
        resolver.resolve(7).await.unwrap();
        resolver.resolve(7).await.unwrap();
        assert_eq!(resolver.store().calls(), 2);
    }

    #[tokio::test]
    async fn disabled_cache_always_asks_store() {
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(1, "admin", 3)]), NoOpCache::new());
        for _ in 0..3 {
            resolver.resolve(1).await.unwrap();
        }
        assert_eq!(resolver.store().calls(), 3);
    }

    #[tokio::test]
    async fn missing_user_is_not_found_and_not_cached() {
        let cache = MemoryCache::new();
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![]), cache);
        let err = resolver.resolve(99).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { id: 99 }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(resolver.cache.is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let resolver = IdentityResolver::new(CountingUserStore::down(), MemoryCache::new());
        let err = resolver.resolve(1).await.unwrap_err();
        assert!(matches!(err, ResolveError::Store { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn unreadable_cache_does_not_fall_back() {
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(1, "user", 1)]), BrokenCache::reads());
        let err = resolver.resolve(1).await.unwrap_err();
        assert!(matches!(err, ResolveError::CacheRead { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(resolver.store().calls(), 0);
    }

    #[tokio::test]
    async fn unwritable_cache_is_internal() {
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(1, "user", 1)]), BrokenCache::writes());
        let err = resolver.resolve(1).await.unwrap_err();
        assert!(matches!(err, ResolveError::CacheWrite { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn undecodable_entry_is_internal() {
        let cache = MemoryCache::new();
        cache.set(&CacheKey::user(5), b"definitely not json".to_vec(), USER_TTL).await.unwrap();
        let resolver = IdentityResolver::new(CountingUserStore::with_users(vec![user(5, "user", 1)]), cache);
        let err = resolver.resolve(5).await.unwrap_err();
        assert!(matches!(err, ResolveError::Decode { .. }));
        assert_eq!(resolver.store().calls(), 0);
    }
}
