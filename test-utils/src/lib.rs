//! Test helpers for doliboot.
//!
//! - `scratch`: a throwaway container root with identity tables and php.ini
//! - `bundle`: release archives in the layout the bootstrap expects
//! - `db`: an in-memory database and a recording script runner

pub mod bundle;
pub mod db;
pub mod scratch;

pub use bundle::BundleBuilder;
pub use db::{FakeConnector, RecordingScripts, Statement};
pub use scratch::ScratchRoot;
