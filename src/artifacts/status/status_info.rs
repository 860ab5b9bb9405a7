use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Snapshot;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Classification of the working tree
///
/// Every list is sorted by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub current_branch: BranchName,
    /// Tip of the current branch, `None` while it is unborn
    pub last_commit: Option<ObjectId>,
    /// Paths with staged content or a staged removal
    pub staged: Vec<PathBuf>,
    /// Tracked paths whose working content differs from the staged (or committed) content
    pub modified: Vec<PathBuf>,
    /// Tracked paths missing from the working tree
    pub deleted: Vec<PathBuf>,
    /// Working tree files neither committed nor staged
    pub untracked: Vec<PathBuf>,
    /// Branch being merged while a conflicting merge waits to be committed
    pub merging: Option<BranchName>,
}

impl StatusInfo {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }
}

/// Inputs of a status computation
pub struct Status<'r> {
    pub workspace: &'r Workspace,
    pub index: &'r Index,
    /// Snapshot of the current branch's last commit
    pub head_snapshot: &'r Snapshot,
}

impl Status<'_> {
    pub fn inspect(
        &self,
        current_branch: BranchName,
        last_commit: Option<ObjectId>,
        merging: Option<BranchName>,
    ) -> anyhow::Result<StatusInfo> {
        let staged = self
            .index
            .entries()
            .map(|entry| entry.name.clone())
            .chain(self.index.removals().map(|path| path.to_path_buf()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        // staged content takes precedence over the committed one
        let mut expected = self
            .head_snapshot
            .iter()
            .map(|(path, oid)| (path.clone(), oid))
            .collect::<BTreeMap<_, _>>();
        for entry in self.index.entries() {
            expected.insert(entry.name.clone(), &entry.oid);
        }
        for path in self.index.removals() {
            expected.remove(path);
        }

        let mut modified = Vec::new();
        let mut deleted = Vec::new();
        for (path, expected_oid) in &expected {
            match self.workspace.hash_file(path)? {
                None => deleted.push(path.clone()),
                Some(actual_oid) if &actual_oid != *expected_oid => modified.push(path.clone()),
                Some(_) => {}
            }
        }

        let tracked = expected.keys().collect::<BTreeSet<_>>();
        let untracked = self
            .workspace
            .list_files()?
            .into_iter()
            .filter(|path| !tracked.contains(path))
            .collect::<Vec<_>>();

        Ok(StatusInfo {
            current_branch,
            last_commit,
            staged,
            modified,
            deleted,
            untracked,
            merging,
        })
    }
}
