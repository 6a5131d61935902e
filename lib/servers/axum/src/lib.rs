//  LIB.rs
//
//  Created:
//    23 Oct 2024, 10:25:43
//  Last edited:
//    17 Oct 2026, 21:27:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements an out-of-the-box, standardized HTTP API for the social
//!   backend using `axum`.
//

// Modules
mod auth;
mod errors;
mod paths;
mod server;

// Re-exports
pub use axum_server_spec as spec;
// Use local parts
pub use auth::RequestContext;
pub use errors::ApiError;
pub use server::*;
