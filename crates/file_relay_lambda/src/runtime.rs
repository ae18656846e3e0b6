pub use file_relay_core::{clock, contract, envelope, error, storage_keys, transform};
