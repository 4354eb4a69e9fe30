//! Token authority and authorization guard.
//!
//! The authority issues, validates and revokes bearer tokens against the session table.
//! The guard is a pure decision function over an already validated identity.

pub mod authority;
pub mod claims;
pub mod error;
pub mod guard;
pub mod password;

pub use authority::{spawn_session_sweeper, token_hash, IssuedToken, TokenAuthority};
pub use claims::{Claims, Identity};
pub use error::AuthError;
pub use guard::{authorize, Action, Decision, ResourceContext};
