//! Boot stages.
//!
//! Each stage is a function over the layout and the config that does ONE
//! thing and reports what it did.
//!
//! ```text
//! Filesystem ──→ Identity ──→ Ownership ──→ Bundle ──→ CompatLink ──→ Render ──→ Install?
//! ```

pub mod bundle;
pub mod filesystem;
pub mod identity;
pub mod install;
pub mod ownership;
pub mod render;
