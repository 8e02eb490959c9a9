//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: resolves the bearer token to a `Caller`
//! 2. Audit logger: runs after auth, so it knows the user

pub mod audit;
pub mod auth;
