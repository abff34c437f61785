//! HTTP handlers for the search gateway.

pub mod health;
pub mod metrics;
pub mod search;
pub mod sessions;
