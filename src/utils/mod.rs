//! Shared utilities.
//!
//! - [`audit`]: best-effort activity logging to `system_logs`
//! - [`errors`]: application error type and response mapping
//! - [`jwt`]: access/refresh token creation and verification
//! - [`pagination`]: request pagination helpers
//! - [`password`]: password hashing and verification
//! - [`serde`]: query-string deserialization helpers

pub mod audit;
pub mod errors;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod serde;
