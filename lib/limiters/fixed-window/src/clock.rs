//  CLOCK.rs
//
//  Created:
//    17 Oct 2026, 15:59:40
//  Last edited:
//    17 Oct 2026, 16:10:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Abstracts over the monotonic time source used by the limiter.
//

use std::sync::Arc;
use std::time::Instant;
#[cfg(any(test, feature = "test-seams"))]
use std::sync::{Mutex, PoisonError};
#[cfg(any(test, feature = "test-seams"))]
use std::time::Duration;


/***** LIBRARY *****/
/// Something that tells the time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}
impl<K: ?Sized + Clock> Clock for Arc<K> {
    #[inline]
    fn now(&self) -> Instant { (**self).now() }
}



/// The [`Clock`] that reads [`Instant::now()`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant { Instant::now() }
}



/// A [`Clock`] that only moves when told to.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<Instant>,
}
#[cfg(any(test, feature = "test-seams"))]
impl Default for MockClock {
    #[inline]
    fn default() -> Self { Self::new() }
}
#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Creates a mock clock frozen at the current instant.
    #[inline]
    pub fn new() -> Self { Self { now: Mutex::new(Instant::now()) } }

    /// Moves the clock forward by the given duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}
#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    #[inline]
    fn now(&self) -> Instant { *self.now.lock().unwrap_or_else(PoisonError::into_inner) }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_only_moves_when_advanced() {
        let clock = MockClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now() - start, Duration::from_millis(1500));
    }
}
