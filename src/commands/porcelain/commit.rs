use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Snapshot, Tree};
use crate::errors::CitError;
use anyhow::Context;

impl Repository {
    /// Record the staged changes on the current branch
    ///
    /// The new snapshot is the parent's snapshot overlaid with every staged entry, without
    /// the paths whose removal is staged. When a
    /// conflicting merge is being concluded the merge source becomes the second parent and
    /// the cleanly merged snapshot is the base instead.
    pub fn commit(&self, message: &str) -> anyhow::Result<Commit> {
        let _lock = self.lock()?;
        let mut index = self.index_mut();

        if index.is_empty() {
            return Err(CitError::EmptyStagingArea.into());
        }

        let branch = self.refs().current_branch()?;
        let parent = self.refs().branch_head(&branch)?;
        let merge_head = self.refs().read_merge_head()?;

        let base = match &merge_head {
            Some(merge_head) => self
                .database()
                .load_tree(&merge_head.merged_tree)?
                .into_entries(),
            None => self.database().load_snapshot(parent.as_ref())?,
        };
        let tree = Tree::build(
            Some(&base),
            index.entries().map(|entry| (entry.name.as_path(), &entry.oid)),
            index.removals(),
        );

        let parents = parent
            .iter()
            .cloned()
            .chain(merge_head.map(|merge_head| merge_head.oid))
            .collect::<Vec<_>>();
        let (commit_oid, commit) =
            self.create_commit(message.trim(), self.author(), parents, tree.into_entries())?;

        self.refs().update_branch_head(&branch, &commit_oid)?;

        index.clear();
        if let Err(error) = index.write_updates() {
            self.refs()
                .restore_branch_head(&branch, parent.as_ref())
                .context("failed to restore the branch head after a failed commit")?;
            return Err(error.context("failed to clear the staging area; the commit was rolled back"));
        }

        self.refs().clear_merge_head()?;

        let root_marker = if commit.is_root() { "(root-commit) " } else { "" };
        tracing::info!(
            branch = %branch,
            "[{}{}] {}",
            root_marker,
            commit_oid.to_short_oid(),
            commit.short_message()
        );

        Ok(commit)
    }

    /// Store a snapshot as a tree plus a commit on top of `parents`
    ///
    /// No ref is moved.
    pub fn create_commit(
        &self,
        message: &str,
        author: Author,
        parents: Vec<ObjectId>,
        snapshot: Snapshot,
    ) -> anyhow::Result<(ObjectId, Commit)> {
        if snapshot.is_empty() {
            return Err(CitError::EmptySnapshot.into());
        }

        let tree_oid = self.database().store(&Tree::new(snapshot))?;
        let commit = Commit::new(parents, tree_oid, author, message.to_string());
        let commit_oid = self.database().store(&commit)?;

        Ok((commit_oid, commit))
    }
}
