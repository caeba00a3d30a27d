//! Authentication and authorization
//!
//! Handles:
//! - Token service (access/refresh credential pairs)
//! - Authorization guard (middleware + extractors)
//! - Ownership policy
//! - Password hashing

mod middleware;
mod ownership;
mod password;
pub mod token;

pub use middleware::{
    ACCESS_TOKEN_COOKIE, CurrentUser, Identity, MaybeUser, REFRESH_TOKEN_COOKIE, require_auth,
};
pub use ownership::assert_owner;
pub use password::{hash_password, verify_password};
pub use token::{TokenPair, issue_token_pair, verify_refresh_token};
