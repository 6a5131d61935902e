//  LIB.rs
//
//  Created:
//    17 Oct 2026, 15:58:02
//  Last edited:
//    17 Oct 2026, 16:31:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a [`RateLimiter`](specifications::RateLimiter) that counts
//!   requests per client in fixed, hard-resetting windows.
//

// Modules
pub mod clock;
mod limiter;

// Use some of it into the main namespace
pub use clock::{Clock, SystemClock};
pub use limiter::*;
