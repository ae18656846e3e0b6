//! Narrow, blocking contracts for the collaborators a batch talks to.
//!
//! Implementations report failures as plain descriptions; the batch handler
//! decides which failures are fatal.

pub mod notifier;
pub mod object_store;
pub mod secrets;
