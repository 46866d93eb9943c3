//! Command implementations.

pub mod cache;
pub mod health;
pub mod resolve;
