//! Staging area
//!
//! The index tracks which changes are staged for the next commit: a sorted mapping from
//! repository-relative path to the object ID of the staged blob, plus the set of tracked
//! paths the next commit drops.
//!
//! ## Index File Format
//!
//! - Header: signature, version and entry count
//! - Entries: object ID and path of every staged file, then every removal, sorted by path
//! - Checksum: SHA-256 over everything before it
//!
//! Reading takes a shared lock on the index file, writing an exclusive one.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_PREFIX_SIZE, IndexEntry, parse_name};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::DerefMut;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.cit/index`)
    path: Box<Path>,
    /// Staged files mapped by path
    entries: BTreeMap<Box<Path>, IndexEntry>,
    /// Tracked paths removed by the next commit
    removed: BTreeSet<Box<Path>>,
    header: IndexHeader,
    /// Set when the in-memory entries diverge from the file on disk
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            removed: BTreeSet::new(),
            header: IndexHeader::new(String::from(SIGNATURE), VERSION, 0),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn is_removed(&self, path: &Path) -> bool {
        self.removed.contains(path)
    }

    /// Neither staged content nor staged removals
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.removed.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.changed
    }

    /// Insert or replace the staged content of `path`
    pub fn stage(&mut self, path: &Path, oid: ObjectId) {
        self.removed.remove(path);
        self.entries.insert(
            path.to_path_buf().into_boxed_path(),
            IndexEntry::new(path.to_path_buf(), oid),
        );

        self.update_count();
        self.changed = true;
    }

    /// Stage the removal of a tracked `path`
    pub fn remove(&mut self, path: &Path) {
        self.entries.remove(path);
        if self.removed.insert(path.to_path_buf().into_boxed_path()) {
            self.changed = true;
        }

        self.update_count();
    }

    /// Forget whatever is staged for `path`
    pub fn discard(&mut self, path: &Path) {
        let had_entry = self.entries.remove(path).is_some();
        let had_removal = self.removed.remove(path);
        if had_entry || had_removal {
            self.changed = true;
        }

        self.update_count();
    }

    /// Drop every staged entry and removal
    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.changed = true;
        }

        self.entries.clear();
        self.removed.clear();
        self.header = IndexHeader::empty();
    }

    /// Staged entries, ordered by path
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Staged removals, ordered by path
    pub fn removals(&self) -> impl Iterator<Item = &Path> {
        self.removed.iter().map(|path| path.as_ref())
    }

    fn update_count(&mut self) {
        self.header.entries_count = (self.entries.len() + self.removed.len()) as u32;
    }

    /// Load the index from disk
    ///
    /// A missing or empty index file is an empty staging area.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        self.removed.clear();
        self.header = IndexHeader::empty();
        self.changed = false;

        if !self.path().exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(self.path())
            .with_context(|| format!("failed to open index file at {:?}", self.path()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let entries_count = Self::parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader
            .verify()
            .with_context(|| format!("corrupt index file at {:?}", self.path))
    }

    fn parse_header(reader: &mut Checksum) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(std::io::Cursor::new(header_bytes))?;
        header.validate()?;

        Ok(header.entries_count)
    }

    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let prefix = reader.read(ENTRY_PREFIX_SIZE)?;
            let prefix = IndexEntry::parse_prefix(&prefix)?;
            let path_bytes = reader.read(prefix.path_len)?;

            if prefix.is_removal() {
                self.removed
                    .insert(parse_name(&path_bytes)?.into_boxed_path());
            } else {
                let entry = IndexEntry::from_parts(prefix.oid, &path_bytes)?;
                self.entries
                    .insert(entry.name.clone().into_boxed_path(), entry);
            }
        }

        self.header.entries_count = entries_count;

        Ok(())
    }

    /// Persist the in-memory entries, replacing the index file
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path())
            .with_context(|| format!("failed to open index file at {:?}", self.path()))?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock);

        self.update_count();
        writer.write(&self.header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }
        for path in &self.removed {
            writer.write(&IndexEntry::serialize_removal(path)?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn oid(c: char) -> ObjectId {
        ObjectId::try_parse(c.to_string().repeat(64)).unwrap()
    }

    fn index(dir: &TempDir) -> Index {
        Index::new(dir.path().join("index").into_boxed_path())
    }

    #[test]
    fn test_missing_file_is_empty_index() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);

        index.rehydrate().unwrap();

        assert!(index.is_empty());
    }

    #[test]
    fn test_entries_survive_a_reload_in_path_order() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);
        index.stage(Path::new("src/b.rs"), oid('b'));
        index.stage(Path::new("a.txt"), oid('a'));
        index.stage(Path::new("src/b.rs"), oid('c'));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(dir.path().join("index").into_boxed_path());
        reloaded.rehydrate().unwrap();

        let entries = reloaded
            .entries()
            .map(|entry| (entry.name.clone(), entry.oid.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            entries,
            vec![
                (PathBuf::from("a.txt"), oid('a')),
                (PathBuf::from("src/b.rs"), oid('c')),
            ]
        );
    }

    #[test]
    fn test_cleared_index_is_persisted_empty() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);
        index.stage(Path::new("a.txt"), oid('a'));
        index.write_updates().unwrap();

        index.clear();
        assert!(index.has_changes());
        index.write_updates().unwrap();
        index.rehydrate().unwrap();

        assert!(index.is_empty());
        assert!(index.entry_by_path(Path::new("a.txt")).is_none());
    }

    #[test]
    fn test_removals_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);
        index.stage(Path::new("a.txt"), oid('a'));
        index.stage(Path::new("gone.txt"), oid('b'));
        index.remove(Path::new("gone.txt"));
        index.remove(Path::new("old/notes.md"));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(dir.path().join("index").into_boxed_path());
        reloaded.rehydrate().unwrap();

        assert_eq!(
            reloaded.removals().collect::<Vec<_>>(),
            vec![Path::new("gone.txt"), Path::new("old/notes.md")]
        );
        assert!(reloaded.entry_by_path(Path::new("gone.txt")).is_none());
        assert!(reloaded.entry_by_path(Path::new("a.txt")).is_some());
    }

    #[test]
    fn test_staging_cancels_a_removal() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);
        index.remove(Path::new("a.txt"));
        assert!(!index.is_empty());

        index.stage(Path::new("a.txt"), oid('a'));
        assert!(!index.is_removed(Path::new("a.txt")));

        index.discard(Path::new("a.txt"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_tampered_file_fails_checksum() {
        let dir = TempDir::new().unwrap();
        let mut index = index(&dir);
        index.stage(Path::new("a.txt"), oid('a'));
        index.write_updates().unwrap();

        let mut bytes = std::fs::read(index.path()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(index.path(), bytes).unwrap();

        assert!(index.rehydrate().is_err());
    }
}
