//! Doliboot Shared - common code for the bootstrap and its test helpers
//!
//! This crate contains the error taxonomy, the fixed constants of the
//! container image, and the filesystem layout derived from them.

pub mod constants;
pub mod errors;
pub mod layout;

pub use errors::{BootError, BootResult};
pub use layout::BootLayout;
