//! Repository operations
//!
//! Every user-facing operation is an `impl Repository` block under `porcelain`, one file
//! per command.

pub mod porcelain;
