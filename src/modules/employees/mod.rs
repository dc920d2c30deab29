//! Employee records.
//!
//! Listing is role-scoped: Team Leaders see their own department, level-4
//! users only themselves. Single-record access goes through the evaluator.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
