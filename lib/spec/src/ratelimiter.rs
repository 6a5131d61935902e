//  RATELIMITER.rs
//
//  Created:
//    17 Oct 2026, 10:48:12
//  Last edited:
//    17 Oct 2026, 10:59:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`RateLimiter`] trait, which decides whether a client may
//!   spend another request.
//

use std::time::Duration;


/***** LIBRARY *****/
/// The outcome of a [`RateLimiter::check()`].
///
/// Being limited is a normal outcome, not an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RateDecision {
    /// The request may proceed.
    Allowed {
        /// How many more requests the client may make in the current window.
        remaining: u32,
    },
    /// The request must be rejected.
    Limited {
        /// How long until the client's budget is replenished.
        retry_after: Duration,
    },
}
impl RateDecision {
    /// Returns whether this decision admits the request.
    #[inline]
    pub const fn is_allowed(&self) -> bool { matches!(self, Self::Allowed { .. }) }
}



/// Decides, per client, whether another request may be admitted.
///
/// Checks perform no I/O and therefore cannot fail or time out. Checks for the same client must be
/// linearizable; no ordering is required across clients.
pub trait RateLimiter {
    /// Counts a request by the given client and decides on it.
    ///
    /// # Arguments
    /// - `client`: Something identifying the client (e.g., its address).
    ///
    /// # Returns
    /// A [`RateDecision`].
    fn check(&self, client: &str) -> RateDecision;
}
