//! Doliboot - container bootstrap for the Dolibarr web stack.
//!
//! Converges an arbitrary container state (fresh volume, half-initialized
//! volume, UID/GID drift) to a correctly owned, correctly versioned install,
//! then hands the process over to the web server.

pub mod bundle;
pub mod config;
pub mod db;
pub mod handoff;
pub mod identity;
pub mod install;
pub mod pipeline;
pub mod render;
pub mod storage;

pub use config::{BootArgs, BootConfig, ServiceIdentity};
pub use doliboot_shared::{BootError, BootLayout, BootResult};
pub use handoff::Handoff;
pub use pipeline::{BootPipeline, BootReport};
