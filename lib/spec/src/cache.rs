//  CACHE.rs
//
//  Created:
//    17 Oct 2026, 12:31:44
//  Last edited:
//    17 Oct 2026, 12:58:20
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines an interface to a fast key/value cache that sits in front of
//!   the persistent store.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::future::Future;
use std::time::Duration;


/***** LIBRARY *****/
/// Identifies a cached entity by its kind and ID.
///
/// Formats as `<kind>:<id>`, e.g., `user:42`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    /// The kind of entity cached.
    pub kind: &'static str,
    /// The ID of the entity within its kind.
    pub id:   i64,
}
impl CacheKey {
    /// Constructor for the CacheKey of a user.
    #[inline]
    pub const fn user(id: i64) -> Self { Self { kind: "user", id } }
}
impl Display for CacheKey {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult { write!(f, "{}:{}", self.kind, self.id) }
}



/// A cache of serialized values with a time-to-live.
///
/// Implementations only have to guarantee per-key atomic gets and sets. An entry older than its
/// TTL must never be returned.
///
/// Note that the Cache is intended to be used in a distributed context. As such, any reference to
/// `self` is done immutably only.
pub trait Cache {
    /// Errors produced by the cache's infrastructure. A missing key is _not_ an error.
    type Error: 'static + Send + Sync + Error;


    /// Reads a value from the cache.
    ///
    /// # Arguments
    /// - `key`: The [`CacheKey`] to read.
    ///
    /// # Returns
    /// The stored bytes, or [`None`] if the key is absent or expired.
    ///
    /// # Errors
    /// This function errors if the cache itself could not be reached or failed.
    fn get(&self, key: &CacheKey) -> impl Send + Future<Output = Result<Option<Vec<u8>>, Self::Error>>;

    /// Writes a value to the cache, replacing any previous one.
    ///
    /// # Arguments
    /// - `key`: The [`CacheKey`] to write.
    /// - `value`: The serialized value.
    /// - `ttl`: How long the entry remains valid.
    ///
    /// # Errors
    /// This function errors if the cache itself could not be reached or failed.
    fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> impl Send + Future<Output = Result<(), Self::Error>>;
}





/***** TESTS *****/
