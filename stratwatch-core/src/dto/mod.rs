//! Data Transfer Objects for the remote strategy API
//!
//! These mirror the JSON payloads the remote service accepts and returns.
//! Field names follow the service's camelCase convention.

pub mod job;
pub mod log;
