//! Index entry representation
//!
//! Each entry pairs a repository-relative path with the object ID of its staged content.
//! A removal is stored as an entry with the `REMOVED` flag set and a zeroed object ID.
//!
//! ## Entry Format
//!
//! ```text
//! <32-byte oid> <u16 flags> <u16 path length> <path bytes>
//! ```

use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::path_to_slash;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Size of the fixed part of an entry: object ID, flags and path length
pub const ENTRY_PREFIX_SIZE: usize = OBJECT_ID_BYTES + 4;

/// Flag of an entry recording that the path is removed by the next commit
pub const REMOVED: u16 = 0x0001;

/// Decoded fixed part of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPrefix {
    pub oid: ObjectId,
    pub flags: u16,
    pub path_len: usize,
}

impl EntryPrefix {
    pub fn is_removal(&self) -> bool {
        self.flags & REMOVED != 0
    }
}

/// Staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: PathBuf,
    /// Object ID of the staged content
    pub oid: ObjectId,
}

impl IndexEntry {
    /// Decode the fixed prefix: object ID, flags and the length of the path that follows
    pub fn parse_prefix(prefix: &[u8]) -> anyhow::Result<EntryPrefix> {
        if prefix.len() != ENTRY_PREFIX_SIZE {
            return Err(anyhow::anyhow!("Invalid index entry size"));
        }

        let oid = ObjectId::read_h64_from(&mut &prefix[..OBJECT_ID_BYTES])?;
        let flags = byteorder::NetworkEndian::read_u16(&prefix[OBJECT_ID_BYTES..]);
        let path_len =
            byteorder::NetworkEndian::read_u16(&prefix[OBJECT_ID_BYTES + 2..]) as usize;

        Ok(EntryPrefix {
            oid,
            flags,
            path_len,
        })
    }

    pub fn from_parts(oid: ObjectId, path_bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(IndexEntry::new(parse_name(path_bytes)?, oid))
    }

    /// Encoded form of a removal of `path`
    pub fn serialize_removal(path: &Path) -> anyhow::Result<Bytes> {
        encode(&[0u8; OBJECT_ID_BYTES], REMOVED, path)
    }
}

pub fn parse_name(path_bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let name = std::str::from_utf8(path_bytes)
        .map_err(|_| anyhow::anyhow!("Invalid UTF-8 in entry name"))?;
    if name.is_empty() {
        return Err(anyhow::anyhow!("Empty entry name"));
    }

    Ok(PathBuf::from(name))
}

fn encode(oid_bytes: &[u8], flags: u16, path: &Path) -> anyhow::Result<Bytes> {
    let entry_name = path_to_slash(path)?;
    let name_len = u16::try_from(entry_name.len())
        .map_err(|_| anyhow::anyhow!("Entry name too long: {entry_name}"))?;

    let mut entry_bytes = Vec::with_capacity(ENTRY_PREFIX_SIZE + entry_name.len());
    entry_bytes.write_all(oid_bytes)?;
    entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
    entry_bytes.write_u16::<byteorder::NetworkEndian>(name_len)?;
    entry_bytes.write_all(entry_name.as_bytes())?;

    Ok(Bytes::from(entry_bytes))
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut oid_bytes = Vec::with_capacity(OBJECT_ID_BYTES);
        self.oid.write_h64_to(&mut oid_bytes)?;

        encode(&oid_bytes, 0, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_layout() {
        let oid = ObjectId::try_parse("ab".repeat(32)).unwrap();
        let entry = IndexEntry::new(PathBuf::from("src/main.rs"), oid.clone());

        let bytes = entry.serialize().unwrap();
        assert_eq!(bytes.len(), ENTRY_PREFIX_SIZE + "src/main.rs".len());

        let prefix = IndexEntry::parse_prefix(&bytes[..ENTRY_PREFIX_SIZE]).unwrap();
        assert_eq!(prefix.oid, oid);
        assert_eq!(prefix.path_len, 11);
        assert!(!prefix.is_removal());

        let parsed = IndexEntry::from_parts(prefix.oid, &bytes[ENTRY_PREFIX_SIZE..]).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_removal_layout() {
        let bytes = IndexEntry::serialize_removal(Path::new("docs/old.md")).unwrap();

        let prefix = IndexEntry::parse_prefix(&bytes[..ENTRY_PREFIX_SIZE]).unwrap();
        assert!(prefix.is_removal());
        assert_eq!(prefix.path_len, "docs/old.md".len());
        assert_eq!(
            parse_name(&bytes[ENTRY_PREFIX_SIZE..]).unwrap(),
            PathBuf::from("docs/old.md")
        );
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let oid = ObjectId::try_parse("0".repeat(64)).unwrap();

        assert!(IndexEntry::from_parts(oid, b"").is_err());
    }
}
