//  LIB.rs
//
//  Created:
//    23 Oct 2024, 10:37:34
//  Last edited:
//    17 Oct 2026, 14:52:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a JSON Web Token (JWT)-based bearer scheme for the
//!   `AuthResolver`, together with the issuer that mints matching tokens.
//

// Modules
mod authresolver;
mod claims;
mod config;
mod issuer;

// Use some of it into the main namespace
pub use authresolver::*;
pub use claims::*;
pub use config::*;
pub use issuer::*;
