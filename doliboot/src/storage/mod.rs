//! Filesystem provisioning.
//!
//! - `tree`: ensure directories, permission-preserving copy, recursive removal
//! - `ownership`: recursive chown of a tree to the service identity

pub mod ownership;
pub mod tree;

pub use ownership::{apply_ownership, owned_by};
pub use tree::{copy_tree, ensure_dir, remove_tree};
