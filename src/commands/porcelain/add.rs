use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Snapshot;
use crate::errors::CitError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Outcome of staging a path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Files whose content is now staged, sorted
    pub staged: Vec<PathBuf>,
    /// Tracked files missing from the working tree whose removal is now staged, sorted
    pub removed: Vec<PathBuf>,
    /// Files or directories of a walk that could not be staged, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl Repository {
    /// Stage a file, or every regular non-hidden file below a directory
    ///
    /// Tracked files that no longer exist at or below `path` are staged as removals. A path
    /// that is neither in the working tree nor tracked fails with `FileNotFound`.
    ///
    /// A single file is staged all-or-nothing. During a directory walk an entry that cannot be
    /// read or stored is skipped with a warning and reported; the rest are still staged.
    pub fn stage_path(&self, path: impl AsRef<Path>) -> anyhow::Result<StageReport> {
        let requested = path.as_ref();
        let absolute_path = self.resolve_path(requested);

        let relative_path = self.relative_to_root(&absolute_path).ok_or_else(|| {
            anyhow::anyhow!(
                "path '{}' is outside the repository at {}",
                requested.display(),
                self.path().display()
            )
        })?;

        let _lock = self.lock()?;
        let tracked = self.tracked_snapshot()?;
        let mut index = self.index_mut();
        let mut report = StageReport::default();

        if self.workspace().is_missing(&relative_path) {
            let removed = tracked_below(&tracked, &index_paths(&index), &relative_path);
            if removed.is_empty() {
                return Err(CitError::FileNotFound(requested.to_path_buf()).into());
            }

            for path in removed {
                if index.is_removed(&path) {
                    continue;
                }

                if tracked.contains_key(&path) {
                    index.remove(&path);
                } else {
                    index.discard(&path);
                }
                report.removed.push(path);
            }
        } else {
            let is_directory = self.path().join(&relative_path).is_dir();
            let listing = self.workspace().scan(&relative_path)?;

            for (entry, reason) in listing.unreadable {
                tracing::warn!(path = %entry.display(), error = %reason, "skipping entry");
                report.skipped.push((entry, reason));
            }

            for file in &listing.files {
                match self.store_file(file) {
                    Ok(oid) => {
                        index.stage(file, oid);
                        report.staged.push(file.clone());
                    }
                    Err(error) if is_directory => {
                        tracing::warn!(path = %file.display(), error = %error, "skipping file");
                        report.skipped.push((file.clone(), format!("{error:#}")));
                    }
                    Err(error) => return Err(error),
                }
            }

            for path in tracked_below(&tracked, &index_paths(&index), &relative_path) {
                if index.is_removed(&path) || !self.workspace().is_missing(&path) {
                    continue;
                }

                if tracked.contains_key(&path) {
                    index.remove(&path);
                } else {
                    index.discard(&path);
                }
                report.removed.push(path);
            }
        }

        if index.has_changes() {
            index.write_updates()?;
        }
        tracing::info!(
            staged = report.staged.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            "staged {}",
            requested.display()
        );

        Ok(report)
    }

    fn store_file(&self, file: &Path) -> anyhow::Result<ObjectId> {
        let data = self.workspace().read_file(file)?;
        self.database().put(&data)
    }

    /// Snapshot the next commit builds on: the merged tree while a merge is being concluded,
    /// otherwise the current branch's last commit
    pub(crate) fn tracked_snapshot(&self) -> anyhow::Result<Snapshot> {
        match self.refs().read_merge_head()? {
            Some(merge_head) => Ok(self
                .database()
                .load_tree(&merge_head.merged_tree)?
                .into_entries()),
            None => {
                let head = self.refs().read_head()?;
                self.database().load_snapshot(head.as_ref())
            }
        }
    }

    /// `absolute_path` relative to the working tree root
    ///
    /// The path need not exist: its nearest existing ancestor is canonicalized and the
    /// missing components are appended.
    fn relative_to_root(&self, absolute_path: &Path) -> Option<PathBuf> {
        let existing = absolute_path
            .ancestors()
            .find(|ancestor| ancestor.exists())?;
        let missing = absolute_path.strip_prefix(existing).ok()?;
        let resolved = existing.canonicalize().ok()?.join(missing);

        resolved
            .strip_prefix(self.path())
            .ok()
            .map(Path::to_path_buf)
    }
}

fn index_paths(index: &Index) -> BTreeSet<PathBuf> {
    index
        .entries()
        .map(|entry| entry.name.clone())
        .collect()
}

/// Tracked or staged paths equal to or below `root`, sorted
fn tracked_below(tracked: &Snapshot, staged: &BTreeSet<PathBuf>, root: &Path) -> Vec<PathBuf> {
    tracked
        .keys()
        .chain(staged.iter())
        .filter(|path| path.starts_with(root))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
