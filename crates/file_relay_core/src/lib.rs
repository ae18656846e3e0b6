//! Pure building blocks for the file relay pipeline: envelope decoding,
//! outcome contracts, destination naming, and the reference transformation.
//!
//! Nothing in this crate talks to AWS. The Lambda crate wires these pieces to
//! real clients through its adapter traits.

pub mod clock;
pub mod contract;
pub mod envelope;
pub mod error;
pub mod storage_keys;
pub mod transform;
