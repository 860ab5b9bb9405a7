//! Object identifier (SHA-256 hash)
//!
//! Object IDs are 64-character lowercase hexadecimal strings.
//!
//! ## Format
//!
//! - Full: 64 hex characters
//! - Short: First 7 characters
//!
//! ## Storage
//!
//! Objects are stored in `.cit/objects/<first-2-chars>/<remaining-62-chars>`

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use std::io;
use std::path::PathBuf;

/// Object identifier (SHA-256 hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Upper-case digits are normalized to lower case.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from a raw digest
    pub fn from_digest(digest: &[u8]) -> anyhow::Result<Self> {
        let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self::try_parse(hex)
    }

    /// Write the object ID in binary format (32 bytes)
    pub fn write_h64_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex64 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex64[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from binary format (32 bytes)
    pub fn read_h64_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buffer = [0; OBJECT_ID_BYTES];
        reader.read_exact(&mut buffer)?;

        Self::from_digest(&buffer)
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    proptest! {
        #[test]
        fn test_binary_form_preserves_oid(hex in "[0-9a-f]{64}") {
            let oid = ObjectId::try_parse(hex.clone()).unwrap();

            let mut buffer = Vec::new();
            oid.write_h64_to(&mut buffer).unwrap();
            assert_eq!(buffer.len(), OBJECT_ID_BYTES);

            let parsed = ObjectId::read_h64_from(&mut buffer.as_slice()).unwrap();
            assert_eq!(parsed.as_ref(), hex.as_str());
        }
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(ObjectId::try_parse("abc".to_string()).is_err());
        assert!(ObjectId::try_parse("a".repeat(40)).is_err());
    }

    #[test]
    fn test_rejects_non_hex_characters() {
        assert!(ObjectId::try_parse("z".repeat(64)).is_err());
    }

    #[test]
    fn test_path_and_short_form() {
        let oid = ObjectId::try_parse(format!("ab{}", "c".repeat(62))).unwrap();

        assert_eq!(oid.to_path(), PathBuf::from("ab").join("c".repeat(62)));
        assert_eq!(oid.to_short_oid(), "abccccc");
    }
}
