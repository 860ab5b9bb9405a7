//! Staging index file format
//!
//! The index records which content is staged for the next commit.
//!
//! ## File Format (Version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "CIDX" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, staged entries then removals, each sorted by path):
//!   - Object ID (32 bytes, zeroed for removals)
//!   - Flags (2 bytes)
//!   - Path length (2 bytes)
//!   - Path bytes, `/`-separated
//!
//! Checksum (32 bytes):
//!   - SHA-256 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-256 checksum in bytes
pub const CHECKSUM_SIZE: usize = 32;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12; // 4 bytes for marker, 4 for version, 4 for entries_count

/// Magic signature identifying index files
pub const SIGNATURE: &str = "CIDX";

/// Index file format version
pub const VERSION: u32 = 2;
