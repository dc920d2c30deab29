//! Authentication module.
//!
//! Login issues an access token and a refresh token; `/auth/me` returns the
//! caller's full profile including role permissions and the linked employee
//! record. Role and permission data is never trusted from the token itself,
//! the `CurrentUser` extractor reloads it per request.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
