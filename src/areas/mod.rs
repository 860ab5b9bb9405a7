//! Core repository components
//!
//! - `database`: content-addressable object store for blobs, trees and commits
//! - `index`: staging area
//! - `refs`: branches, `HEAD` and `MERGE_HEAD`
//! - `remotes`: named remote URLs
//! - `lock`: repository-wide write lock
//! - `repository`: the façade coordinating all of the above
//! - `workspace`: working tree file system operations

pub mod database;
pub mod index;
pub mod lock;
pub mod refs;
pub mod remotes;
pub mod repository;
pub mod workspace;
