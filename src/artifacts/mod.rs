//! Data structures and algorithms
//!
//! - `branch`: branch names and branch records
//! - `checkout`: snapshot-to-snapshot working tree migrations
//! - `index`: staging area file format
//! - `log`: commit history traversal
//! - `merge`: common ancestor search, three-way merge and conflict markers
//! - `objects`: object types (blob, tree, commit)
//! - `remote`: remotes and the push boundary
//! - `status`: working tree status inspection

pub mod branch;
pub mod checkout;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod remote;
pub mod status;
