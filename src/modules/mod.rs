pub mod auth;
pub mod clients;
pub mod departments;
pub mod employees;
pub mod financial;
pub mod notifications;
pub mod tasks;
pub mod users;
