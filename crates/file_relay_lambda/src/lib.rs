//! AWS-oriented adapters and handlers for the file relay pipeline.
//!
//! This crate owns runtime integration details (the Lambda entrypoint, queue
//! batch orchestration, configuration, logging, and collaborator traits) and
//! exposes a single runtime module boundary for the envelope, contract,
//! storage key, and transformation primitives.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod runtime;
