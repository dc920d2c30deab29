//! Access control evaluator.
//!
//! Authorization decisions are made here, independently of the HTTP layer:
//! pure functions over an [`Actor`] plus read-only lookups through the
//! [`Directory`] trait. Handlers and middleware translate the resulting
//! [`AccessDecision`] into responses; nothing in this module knows about
//! status codes or axum.
//!
//! The model is a five-level role hierarchy (lower level = more senior):
//!
//! ```text
//! 1 Owner ─ bypasses every fine-grained check
//! 2 Direct Manager ─ full access to employees, clients and tasks
//! 3 Team Leader ─ department-scoped access
//! 4 Employee ─ self / assignment-scoped access
//! 5 Accountant ─ financial data plus whatever the permission matrix grants
//! ```

pub mod decision;
pub mod directory;
pub mod evaluator;
pub mod matrix;
pub mod role;

pub use decision::{AccessDecision, DenyReason, ResourceKind};
pub use directory::{Directory, PgDirectory};
pub use evaluator::{AccessEvaluator, Actor, authorize, can_access_financial};
pub use matrix::{Action, PermissionMatrix};
pub use role::Role;
