//! cit: a small content-addressed version control library
//!
//! - `areas`: on-disk stores (objects, index, refs, remotes) and the [`Repository`] handle
//! - `artifacts`: object formats and the algorithms working on them
//! - `commands`: repository operations, one module per command
//! - `errors`: domain errors carried through `anyhow`

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use areas::repository::{Repository, RepositoryConfig};
pub use errors::{CitError, ErrorKind, domain_error};
