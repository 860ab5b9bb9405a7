use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Name of the metadata directory at the repository root
pub const METADATA_DIR: &str = ".cit";

/// Result of walking part of the working tree
#[derive(Debug, Default)]
pub struct Listing {
    /// Regular, non-hidden files relative to the working tree root, sorted
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read, with the reason
    pub unreadable: Vec<(PathBuf, String)>,
}

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hidden entries (including the metadata directory) are never part of the working tree
    pub fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                name.to_string_lossy().starts_with('.')
            } else {
                false
            }
        })
    }

    /// Every regular, non-hidden file of the working tree, relative to its root, sorted
    pub fn list_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        self.list_files_under(self.path())
    }

    /// Every regular, non-hidden file below `root` (absolute or relative to the working tree)
    ///
    /// A file path lists just that file. Entries that cannot be read are logged and left out.
    pub fn list_files_under(&self, root: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let listing = self.scan(root)?;

        for (path, reason) in &listing.unreadable {
            tracing::warn!(path = %path.display(), error = %reason, "cannot read entry");
        }

        Ok(listing.files)
    }

    /// Walk `root` like [`Workspace::list_files_under`], keeping the entries that could not
    /// be read
    pub fn scan(&self, root: &Path) -> anyhow::Result<Listing> {
        let root = self.path.join(root);

        if !root.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", root);
        }

        let mut listing = Listing::default();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() == root || !Self::is_hidden(entry));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if let Some(path) = self.relative_path(entry.path())
                        && !Self::is_ignored(&path)
                    {
                        listing.files.push(path);
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    let path = error
                        .path()
                        .and_then(|path| self.relative_path(path))
                        .unwrap_or_else(|| root.clone());
                    listing.unreadable.push((path, error.to_string()));
                }
            }
        }

        listing.files.sort();
        Ok(listing)
    }

    /// Path relative to the working tree root, if `path` lies inside it
    pub fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        let absolute = self.path.join(path);
        absolute
            .strip_prefix(self.path.as_ref())
            .ok()
            .map(Path::to_path_buf)
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.file_name().to_string_lossy().starts_with('.')
    }

    pub fn file_exists(&self, file_path: &Path) -> bool {
        self.path.join(file_path).is_file()
    }

    /// Whether nothing exists at `file_path`
    ///
    /// Unlike `!file_exists`, an entry that exists but cannot be inspected is not missing.
    pub fn is_missing(&self, file_path: &Path) -> bool {
        matches!(
            std::fs::symlink_metadata(self.path.join(file_path)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound
        )
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let path = self.path.join(file_path);

        let content = std::fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", file_path))?;

        Ok(Bytes::from(content))
    }

    /// Object ID the file's current content would be stored under, `None` if it is missing
    pub fn hash_file(&self, file_path: &Path) -> anyhow::Result<Option<ObjectId>> {
        if !self.file_exists(file_path) {
            return Ok(None);
        }

        let blob = Blob::new(self.read_file(file_path)?);
        Ok(Some(blob.object_id()?))
    }

    pub fn write_file(&self, file_path: &Path, data: &[u8]) -> anyhow::Result<()> {
        let path = self.path.join(file_path);

        if let Some(parent) = path.parent() {
            self.make_directory(parent)?;
        }

        if path.is_dir() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove existing directory: {:?}", file_path))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open file: {:?}", file_path))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

        Ok(())
    }

    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let path = self.path.join(file_path);

        if path.is_file() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove file: {:?}", file_path))?;
        }

        Ok(())
    }

    // Deletions come first, then emptied directories are pruned deepest first,
    // then modified and added files are written (creating their directories).
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        self.apply_migration_action_set(migration, ActionType::Delete)?;

        migration
            .rmdirs()
            .iter()
            .rev()
            .map(|dir_path| self.remove_empty_directory(dir_path))
            .collect::<Result<Vec<()>, _>>()?;

        self.apply_migration_action_set(migration, ActionType::Modify)?;
        self.apply_migration_action_set(migration, ActionType::Add)?;

        Ok(())
    }

    fn apply_migration_action_set(
        &self,
        migration: &Migration,
        action: ActionType,
    ) -> anyhow::Result<()> {
        migration
            .actions()
            .get(&action)
            .ok_or_else(|| anyhow::anyhow!("Invalid action type"))?
            .iter()
            .map(|(file_path, oid)| match (&action, oid) {
                (ActionType::Delete, None) => self.remove_file(file_path),
                (ActionType::Add | ActionType::Modify, Some(oid)) => {
                    let data = migration.load_blob_data(oid)?;
                    self.write_file(file_path, &data)
                }
                _ => Err(anyhow::anyhow!("Invalid action and entry combination")),
            })
            .collect::<Result<Vec<()>, _>>()?;

        Ok(())
    }

    fn remove_empty_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        let dir_path = self.path.join(dir_path);

        if dir_path.is_dir() && dir_path.read_dir()?.next().is_none() {
            std::fs::remove_dir(&dir_path)
                .with_context(|| format!("Failed to remove directory: {:?}", dir_path))?;
        }

        Ok(())
    }

    fn make_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        // a file standing where a directory is needed gets replaced
        if let Some(blocking_file) = dir_path
            .ancestors()
            .take_while(|ancestor| ancestor.starts_with(self.path.as_ref()))
            .find(|ancestor| ancestor.is_file())
        {
            std::fs::remove_file(blocking_file)?;
        }

        std::fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {:?}", dir_path))?;

        Ok(())
    }
}
