//  LIB.rs
//
//  Created:
//    17 Oct 2026, 17:48:30
//  Last edited:
//    18 Oct 2026, 13:50:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the two access-control steps that follow authentication:
//!   resolving a subject to a user through a cache, and deciding whether
//!   that user may act on a resource owned by someone. Also hashes the
//!   credentials with which users register and log in.
//

// Modules
pub mod authorization;
pub mod credentials;
pub mod identity;
#[cfg(test)]
mod testing;

// Use some of it into the main namespace
pub use authorization::{Access, AuthorizationEvaluator, AuthorizeError};
pub use credentials::{hash_password, hash_token, verify_password, CredentialError, InvitationToken, INVITATION_TTL};
pub use identity::{IdentityResolver, ResolveError, USER_TTL};
