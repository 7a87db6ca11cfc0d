//! Core domain types
//!
//! These types describe a remote strategy job as seen from the client side:
//! how it is identified, which lifecycle state it is in, and what its log
//! stream looks like. They are shared between the HTTP client (which produces
//! them from wire payloads) and the monitor (which consumes them).

pub mod job;
pub mod log;
