use crate::areas::repository::{Repository, RepositoryConfig};
use crate::areas::workspace::METADATA_DIR;
use crate::errors::CitError;
use anyhow::Context;
use std::fs;
use std::path::Path;

impl Repository {
    /// Create an empty repository at `path` with the default configuration
    pub fn init(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::init_with_config(path, RepositoryConfig::default())
    }

    /// Create `.cit/{objects,refs/heads}`, an unborn default branch that `HEAD` points at,
    /// and an empty staging area
    pub fn init_with_config(
        path: impl AsRef<Path>,
        config: RepositoryConfig,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
        let root = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;

        let metadata_path = root.join(METADATA_DIR);
        if metadata_path.exists() {
            return Err(CitError::AlreadyInitialized(root).into());
        }

        let repository = Repository::build(root, config);

        fs::create_dir_all(repository.database().objects_path())
            .context("Failed to create .cit/objects directory")?;

        repository
            .refs()
            .init(&repository.config().default_branch)
            .context("Failed to create initial HEAD reference")?;

        repository
            .index_mut()
            .write_updates()
            .context("Failed to create .cit/index file")?;

        tracing::info!(path = %repository.path().display(), "initialized empty repository");

        Ok(repository)
    }
}
