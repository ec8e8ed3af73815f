//! Shared helpers: subprocess execution, digests and path handling.

pub mod exec;
pub mod hash;
pub mod path;
