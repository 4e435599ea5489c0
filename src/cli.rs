//! Command-line actions and their tab-separated rendering.

pub mod actions;
pub mod render;

pub use actions::{Action, KNOWN_ACTIONS};
