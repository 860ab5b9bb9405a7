//! Tree object
//!
//! A tree is the complete snapshot of a commit: every tracked path mapped to the blob that
//! holds its content. Trees are flat (paths carry their directories) and are serialized
//! deterministically so that the same snapshot always produces the same tree ID.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<slash-separated path>\0<32-byte-sha256>`, sorted by path

use crate::artifacts::objects::object::{Object, Packable, Unpackable, with_header};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};

/// Path to blob mapping describing a full working tree state
pub type Snapshot = BTreeMap<PathBuf, ObjectId>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Snapshot,
}

impl Tree {
    pub fn new(entries: Snapshot) -> Self {
        Tree { entries }
    }

    /// Build the snapshot of a new commit: the parent snapshot overlaid with staged entries,
    /// minus the staged removals
    pub fn build<'e>(
        parent: Option<&Snapshot>,
        staged: impl Iterator<Item = (&'e Path, &'e ObjectId)>,
        removed: impl Iterator<Item = &'e Path>,
    ) -> Self {
        let mut entries = parent.cloned().unwrap_or_default();

        for (path, oid) in staged {
            entries.insert(path.to_path_buf(), oid.clone());
        }
        for path in removed {
            entries.remove(path);
        }

        Tree { entries }
    }

    pub fn entries(&self) -> &Snapshot {
        &self.entries
    }

    pub fn into_entries(self) -> Snapshot {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render a relative path with `/` separators regardless of platform
pub fn path_to_slash(path: &Path) -> anyhow::Result<String> {
    let parts = path
        .components()
        .map(|component| match component {
            Component::Normal(part) => part
                .to_str()
                .map(str::to_string)
                .with_context(|| format!("path is not valid UTF-8: {}", path.display())),
            _ => Err(anyhow::anyhow!(
                "path must be relative and normalized: {}",
                path.display()
            )),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (path, oid) in &self.entries {
            content_bytes.write_all(path_to_slash(path)?.as_bytes())?;
            content_bytes.write_all(b"\0")?;
            oid.write_h64_to(&mut content_bytes)?;
        }

        Ok(with_header(&self.object_type(), &content_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Snapshot::new();

        loop {
            let mut path = Vec::new();
            let read = reader.read_until(b'\0', &mut path)?;
            if read == 0 {
                break;
            }

            if path.pop() != Some(b'\0') {
                anyhow::bail!("Invalid tree object: truncated entry path");
            }

            let path = String::from_utf8(path).context("Invalid tree object: non UTF-8 path")?;
            let oid = ObjectId::read_h64_from(&mut reader)
                .context("Invalid tree object: truncated entry id")?;

            entries.insert(PathBuf::from(path), oid);
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
