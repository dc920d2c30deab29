//! User account management.
//!
//! Listing, creation, update and deletion are restricted to Owner and Direct
//! Manager. The owner account itself is shielded: only the owner can update
//! it, nobody can delete it, and permanent deletes are owner-only.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
