//! Repository handle
//!
//! A [`Repository`] is an explicit handle on one working tree and its `.cit` metadata
//! directory. All operations are methods on it (see `commands::porcelain`); there is no
//! process-wide "current repository".

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::lock::RepositoryLock;
use crate::areas::refs::Refs;
use crate::areas::remotes::{REMOTES_FILE_NAME, Remotes};
use crate::areas::workspace::{METADATA_DIR, Workspace};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Author;
use crate::errors::CitError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

pub const DEFAULT_BRANCH: &str = "main";

/// Per-handle configuration
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Identity recorded in new commits; read from the environment when absent
    pub author: Option<Author>,
    /// Branch `HEAD` points at right after `init`
    pub default_branch: BranchName,
}

impl RepositoryConfig {
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_default_branch(mut self, default_branch: BranchName) -> Self {
        self.default_branch = default_branch;
        self
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            author: None,
            default_branch: BranchName::try_parse(DEFAULT_BRANCH.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
pub struct Repository {
    /// Root of the working tree
    path: Box<Path>,
    config: RepositoryConfig,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    remotes: Remotes,
}

impl Repository {
    /// Open the repository containing `path` (the directory itself or any ancestor)
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let absolute_path = path
            .canonicalize()
            .map_err(|_| CitError::RepositoryNotFound(path.to_path_buf()))?;

        let root = Self::find_repository_root(&absolute_path)
            .ok_or_else(|| CitError::RepositoryNotFound(path.to_path_buf()))?;

        let repository = Self::build(root, RepositoryConfig::default());
        repository.index_mut().rehydrate()?;

        Ok(repository)
    }

    /// Nearest directory, starting at `path` and walking up, that holds a `.cit` directory
    pub fn find_repository_root(path: &Path) -> Option<PathBuf> {
        path.ancestors()
            .find(|ancestor| ancestor.join(METADATA_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn build(root: PathBuf, config: RepositoryConfig) -> Self {
        let metadata_path = root.join(METADATA_DIR);

        Repository {
            index: RefCell::new(Index::new(metadata_path.join("index").into_boxed_path())),
            database: Database::new(metadata_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(root.clone().into_boxed_path()),
            refs: Refs::new(metadata_path.clone().into_boxed_path()),
            remotes: Remotes::new(metadata_path.join(REMOTES_FILE_NAME).into_boxed_path()),
            path: root.into_boxed_path(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_DIR)
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Author of the next commit, stamped with the current time unless pinned
    pub fn author(&self) -> Author {
        match &self.config.author {
            Some(author) => author.clone(),
            None => Author::load_from_env(),
        }
    }

    pub fn index_mut(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn remotes(&self) -> &Remotes {
        &self.remotes
    }

    /// Take the repository-wide write lock and reload the staging area under it
    pub(crate) fn lock(&self) -> anyhow::Result<RepositoryLock> {
        let lock = RepositoryLock::acquire(&self.metadata_path())?;
        self.index_mut()
            .rehydrate()
            .context("failed to load the staging area")?;

        Ok(lock)
    }

    /// Resolve a user-supplied path against the working tree root
    pub(crate) fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        }
    }
}
