use crate::areas::repository::Repository;
use crate::artifacts::merge::conflict::{ResolutionStrategy, has_conflict_markers, resolve};
use crate::errors::CitError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl Repository {
    /// Collapse the conflict blocks of one working file
    ///
    /// Only the working file is rewritten; staging the result is left to the caller.
    pub fn resolve_conflict(
        &self,
        path: impl AsRef<Path>,
        strategy: ResolutionStrategy,
    ) -> anyhow::Result<()> {
        let requested = path.as_ref();
        let relative_path = self
            .resolve_path(requested)
            .canonicalize()
            .ok()
            .and_then(|absolute_path| self.workspace().relative_path(&absolute_path))
            .ok_or_else(|| CitError::FileNotFound(requested.to_path_buf()))?;

        let _lock = self.lock()?;
        if !self.workspace().file_exists(&relative_path) {
            return Err(CitError::FileNotFound(requested.to_path_buf()).into());
        }

        let content = self.workspace().read_file(&relative_path)?;
        let resolved = resolve(&content, strategy);
        self.workspace().write_file(&relative_path, &resolved)?;

        tracing::info!(path = %relative_path.display(), %strategy, "resolved conflict");

        Ok(())
    }

    /// Tracked working tree files still carrying conflict markers, sorted
    ///
    /// Tracked means committed on the current branch or staged. While a merge is being
    /// concluded, paths of the merged branch and of the merged tree count as well.
    pub fn conflict_status(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut index = self.index_mut();
        index.rehydrate()?;

        let mut tracked = self
            .database()
            .load_snapshot(self.refs().read_head()?.as_ref())?
            .into_keys()
            .collect::<BTreeSet<_>>();
        if let Some(merge_head) = self.refs().read_merge_head()? {
            tracked.extend(self.tracked_snapshot()?.into_keys());
            tracked.extend(
                self.database()
                    .load_snapshot(Some(&merge_head.oid))?
                    .into_keys(),
            );
        }
        tracked.extend(index.entries().map(|entry| entry.name.clone()));

        let mut conflicted = Vec::new();
        for file in tracked {
            if !self.workspace().file_exists(&file) {
                continue;
            }

            let content = self.workspace().read_file(&file)?;
            if has_conflict_markers(&content) {
                conflicted.push(file);
            }
        }

        Ok(conflicted)
    }
}
