//! Content-addressable object store
//!
//! Objects live zlib-compressed under `objects/<2 hex>/<62 hex>`, named by the SHA-256 of
//! their serialized form. Writes go through a temp file and a rename, so a reader never
//! observes a partially written object.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{Snapshot, Tree};
use crate::errors::CitError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store raw content as a blob and return its ID
    ///
    /// Storing the same content twice is a no-op returning the same ID.
    pub fn put(&self, content: &[u8]) -> anyhow::Result<ObjectId> {
        let blob = Blob::new(Bytes::copy_from_slice(content));
        self.store(&blob)
    }

    /// Raw content of a stored blob
    pub fn get(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Blob::deserialize(object_reader)?.into_content()),
            other => Err(anyhow::anyhow!(
                "object {object_id} is a {other}, expected a blob"
            )),
        }
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        // write the object to disk unless it already exists
        // otherwise, create the object directory
        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .context(format!("Invalid object path {}", object_path.display()))?,
            )
            .context(format!(
                "Unable to create object directory {}",
                object_path.display()
            ))?;

            self.write_object(object_path, object.serialize()?)?;
            tracing::debug!(oid = %object_id, kind = %object.object_type(), "stored object");
        }

        Ok(object_id)
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Commit::deserialize(object_reader),
            other => Err(anyhow::anyhow!(
                "object {object_id} is a {other}, expected a commit"
            )),
        }
    }

    pub fn load_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Tree::deserialize(object_reader),
            other => Err(anyhow::anyhow!(
                "object {object_id} is a {other}, expected a tree"
            )),
        }
    }

    /// Full snapshot recorded by a commit; an absent commit yields the empty snapshot
    pub fn load_snapshot(&self, commit_id: Option<&ObjectId>) -> anyhow::Result<Snapshot> {
        match commit_id {
            Some(commit_id) => {
                let commit = self.load_commit(commit_id)?;
                Ok(self.load_tree(commit.tree_oid())?.into_entries())
            }
            None => Ok(Snapshot::new()),
        }
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let object_path = self.path.join(object_id.to_path());
        let object_content = self.read_object(object_id, object_path)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_id: &ObjectId, object_path: PathBuf) -> anyhow::Result<Bytes> {
        if !object_path.is_file() {
            return Err(CitError::ObjectNotFound(object_id.to_string()).into());
        }

        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Author;
    use crate::errors::domain_error;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("objects").into_boxed_path())
    }

    #[test]
    fn test_put_then_get_returns_content() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);

        let oid = database.put(b"hello world\n").unwrap();

        assert!(database.contains(&oid));
        assert_eq!(&database.get(&oid).unwrap()[..], b"hello world\n");
    }

    #[test]
    fn test_put_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);

        let first = database.put(b"same").unwrap();
        let second = database.put(b"same").unwrap();

        assert_eq!(first, second);
        let stored = std::fs::read_dir(database.objects_path().join(&first.as_ref()[..2]))
            .unwrap()
            .count();
        assert_eq!(stored, 1);
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        let oid = ObjectId::try_parse("f".repeat(64)).unwrap();

        let error = database.get(&oid).unwrap_err();

        assert!(matches!(
            domain_error(&error),
            Some(CitError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_commit_and_snapshot_are_loaded_back() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        let blob_oid = database.put(b"content").unwrap();
        let tree = Tree::new(Snapshot::from([(PathBuf::from("a.txt"), blob_oid)]));
        let tree_oid = database.store(&tree).unwrap();
        let author = Author::new("Jane".into(), "jane@example.com".into());
        let commit = Commit::new(vec![], tree_oid, author, "Initial".into());

        let commit_oid = database.store(&commit).unwrap();

        assert_eq!(database.load_commit(&commit_oid).unwrap(), commit);
        assert_eq!(
            database.load_snapshot(Some(&commit_oid)).unwrap(),
            tree.into_entries()
        );
        assert!(database.load_snapshot(None).unwrap().is_empty());
    }

    #[test]
    fn test_blob_is_not_loaded_as_commit() {
        let dir = TempDir::new().unwrap();
        let database = database(&dir);
        let oid = database.put(b"not a commit").unwrap();

        assert!(database.load_commit(&oid).is_err());
    }
}
