//  LIB.rs
//
//  Created:
//    17 Oct 2026, 16:44:10
//  Last edited:
//    17 Oct 2026, 16:50:58
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a [`Cache`] that doesn't actually cache anything.
//!
//!   Selecting this backend is how caching is disabled: every read misses
//!   and every write is dropped.
//

use std::convert::Infallible;
use std::future::{ready, Future};
use std::time::Duration;

use specifications::cache::{Cache, CacheKey};
use tracing::trace;


/***** LIBRARY *****/
/// Defines a [`Cache`] that forgets everything immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCache;
impl NoOpCache {
    /// Constructor for the NoOpCache.
    ///
    /// # Returns
    /// A new NoOpCache ready to remember absolutely nothing.
    #[inline]
    pub const fn new() -> Self { Self }
}
impl Cache for NoOpCache {
    type Error = Infallible;

    #[inline]
    fn get(&self, key: &CacheKey) -> impl Send + Future<Output = Result<Option<Vec<u8>>, Self::Error>> {
        trace!("Cache disabled; {key} misses");
        ready(Ok(None))
    }

    #[inline]
    fn set(&self, _key: &CacheKey, _value: Vec<u8>, _ttl: Duration) -> impl Send + Future<Output = Result<(), Self::Error>> { ready(Ok(())) }
}





/***** TESTS *****/
