//  LIMITER.rs
//
//  Created:
//    17 Oct 2026, 16:02:19
//  Last edited:
//    17 Oct 2026, 16:31:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the [`FixedWindowLimiter`] itself.
//

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use specifications::ratelimiter::{RateDecision, RateLimiter};
use thiserror::Error;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};


/***** CONSTANTS *****/
/// Every how many checks the limiter sweeps out expired counters.
pub const SWEEP_EVERY: u64 = 1024;





/***** ERRORS *****/
/// Defines the ways in which a [`RateLimitConfig`] may be unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Rate limit window cannot be zero")]
    ZeroWindow,
    #[error("Rate limit cannot admit zero requests per window")]
    ZeroLimit,
}





/***** AUXILLARY *****/
/// Configures the [`FixedWindowLimiter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimitConfig {
    /// How many requests a client may make per window.
    pub requests_per_window: u32,
    /// How long a window lasts.
    pub window: Duration,
    /// Whether limiting happens at all.
    pub enabled: bool,
}
impl Default for RateLimitConfig {
    #[inline]
    fn default() -> Self { Self { requests_per_window: 20, window: Duration::from_secs(5), enabled: false } }
}



/// The state kept per client.
#[derive(Clone, Copy, Debug)]
struct WindowCounter {
    /// How many requests were admitted in the current window. Never exceeds the limit.
    count: u32,
    /// When the current window started.
    window_start: Instant,
}





/***** LIBRARY *****/
/// A [`RateLimiter`] that admits at most `requests_per_window` requests per client within each
/// window, resetting the count completely once the window has passed.
///
/// This admits bursts of up to twice the limit around a window boundary.
#[derive(Debug)]
pub struct FixedWindowLimiter<K = SystemClock> {
    config:   RateLimitConfig,
    clock:    K,
    counters: DashMap<String, WindowCounter>,
    checks:   AtomicU64,
}
impl FixedWindowLimiter<SystemClock> {
    /// Constructor for the FixedWindowLimiter that uses the system clock.
    ///
    /// # Arguments
    /// - `config`: The [`RateLimitConfig`] to enforce.
    ///
    /// # Errors
    /// This function errors if the config has a zero window or a zero limit.
    #[inline]
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> { Self::with_clock(config, SystemClock) }
}
impl<K: Clock> FixedWindowLimiter<K> {
    /// Constructor for the FixedWindowLimiter that uses a custom [`Clock`].
    ///
    /// # Arguments
    /// - `config`: The [`RateLimitConfig`] to enforce.
    /// - `clock`: The [`Clock`] that decides when windows start and end.
    ///
    /// # Errors
    /// This function errors if the config has a zero window or a zero limit.
    pub fn with_clock(config: RateLimitConfig, clock: K) -> Result<Self, ConfigError> {
        if config.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if config.requests_per_window == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(Self { config, clock, counters: DashMap::new(), checks: AtomicU64::new(0) })
    }

    /// Returns the configuration this limiter enforces.
    #[inline]
    pub const fn config(&self) -> &RateLimitConfig { &self.config }

    /// Returns how many clients currently have a counter.
    #[inline]
    pub fn tracked_clients(&self) -> usize { self.counters.len() }

    /// Drops the counters of all clients whose window has passed.
    ///
    /// Such counters would be reset by their next check anyway, so this never changes a decision.
    ///
    /// # Returns
    /// How many counters were dropped.
    pub fn evict_expired(&self) -> usize {
        let now: Instant = self.clock.now();
        let window: Duration = self.config.window;
        let before: usize = self.counters.len();
        self.counters.retain(|_, counter| now.saturating_duration_since(counter.window_start) < window);
        let evicted: usize = before.saturating_sub(self.counters.len());
        if evicted > 0 {
            debug!("Evicted {evicted} expired rate limit counter(s)");
        }
        evicted
    }

    /// Counts and decides on a request while holding the client's entry.
    fn decide(&self, client: &str) -> RateDecision {
        let now: Instant = self.clock.now();
        let limit: u32 = self.config.requests_per_window;
        let window: Duration = self.config.window;

        // The entry guard locks the shard, serializing checks for the same client
        let mut counter = self.counters.entry(client.to_owned()).or_insert(WindowCounter { count: 0, window_start: now });
        let elapsed: Duration = now.saturating_duration_since(counter.window_start);
        if elapsed >= window {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count >= limit {
            let retry_after: Duration = window.saturating_sub(now.saturating_duration_since(counter.window_start));
            trace!("Client {client:?} limited ({}/{limit}, retry after {retry_after:?})", counter.count);
            return RateDecision::Limited { retry_after };
        }
        counter.count += 1;
        RateDecision::Allowed { remaining: limit - counter.count }
    }
}
impl<K: Clock> RateLimiter for FixedWindowLimiter<K> {
    fn check(&self, client: &str) -> RateDecision {
        if !self.config.enabled {
            return RateDecision::Allowed { remaining: self.config.requests_per_window };
        }

        let decision: RateDecision = self.decide(client);
        // Only sweep once the entry guard is gone, as `retain()` locks every shard
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_expired();
        }
        decision
    }
}





/***** TESTS *****/
