//! Stratwatch Core
//!
//! Core types shared by the Stratwatch client, monitor and CLI.
//!
//! This crate contains:
//! - Domain types: jobs, trading modes, lifecycle status, log entries and batches
//! - DTOs: request/response payloads exchanged with the remote strategy API

pub mod domain;
pub mod dto;
