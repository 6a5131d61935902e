//  LIB.rs
//
//  Created:
//    17 Oct 2026, 16:35:27
//  Last edited:
//    17 Oct 2026, 16:58:41
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements an in-process [`Cache`] on top of a concurrent map.
//

use std::convert::Infallible;
use std::future::{ready, Future};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use specifications::cache::{Cache, CacheKey};
use tracing::{debug, trace};


/***** AUXILLARY *****/
/// A value together with the moment it stops being valid.
#[derive(Clone, Debug)]
struct Entry {
    data:       Vec<u8>,
    expires_at: Instant,
}
impl Entry {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool { now >= self.expires_at }
}





/***** LIBRARY *****/
/// A [`Cache`] that lives in the memory of this process.
///
/// Expired entries are never returned, and are dropped when they are next read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Entry>,
}
impl MemoryCache {
    /// Constructor for the MemoryCache.
    #[inline]
    pub fn new() -> Self { Self { entries: DashMap::new() } }

    /// Returns how many entries are stored, including expired ones not yet dropped.
    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns whether nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now: Instant = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}
impl Cache for MemoryCache {
    type Error = Infallible;

    fn get(&self, key: &CacheKey) -> impl Send + Future<Output = Result<Option<Vec<u8>>, Self::Error>> {
        let now: Instant = Instant::now();
        let hit: Option<Vec<u8>> = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.data.clone()),
            Some(_) => None,
            None => {
                trace!("Cache miss for {key}");
                return ready(Ok(None));
            },
        };
        if hit.is_none() {
            debug!("Cache entry {key} expired");
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        ready(Ok(hit))
    }

    fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> impl Send + Future<Output = Result<(), Self::Error>> {
        let now: Instant = Instant::now();
        // A TTL too large to represent never expires in practice
        let expires_at: Instant = now.checked_add(ttl).unwrap_or(now + Duration::from_secs(100 * 365 * 24 * 3600));
        self.entries.insert(*key, Entry { data: value, expires_at });
        ready(Ok(()))
    }
}





/***** TESTS *****/
