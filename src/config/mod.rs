//! Application configuration, loaded from environment variables.
//!
//! - [`cors`]: allowed origins for the CORS layer
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`jwt`]: token secrets and expiries
//! - [`rate_limit`]: per-IP rate limiting knobs

pub mod cors;
pub mod database;
pub mod jwt;
pub mod rate_limit;
