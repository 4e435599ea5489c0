//! Error types shared by every subsystem.
//!
//! Nothing below the CLI retries or swallows these: credential, query and
//! normalization failures travel unchanged up to the caller, wrapped in
//! [`types::ReaderError`] where the kinds meet.

pub mod types;
