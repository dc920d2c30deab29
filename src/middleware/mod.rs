//! Request middleware and extractors.
//!
//! - [`auth`]: the [`auth::CurrentUser`] extractor (JWT + fresh user load)
//! - [`access`]: decision-to-response mapping and router-level gates

pub mod access;
pub mod auth;
