//! Object types and operations
//!
//! All content is stored as objects identified by SHA-256 hashes. There are three types:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Flat snapshot mapping every tracked path to a blob
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//!
//! All objects serialize to the format `<type> <size>\0<content>`, and the object ID is
//! the hash of that serialized form.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-256 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 64;

/// Length of a SHA-256 hash in binary format
pub const OBJECT_ID_BYTES: usize = OBJECT_ID_LENGTH / 2;
