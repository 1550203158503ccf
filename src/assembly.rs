//! Assembly of local (per-element) and global linear systems.

pub mod global;
pub mod local;
