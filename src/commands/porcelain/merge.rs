use crate::areas::refs::MergeHead;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::merge::bca_finder::BCAFinder;
use crate::artifacts::merge::conflict::conflict_markers;
use crate::artifacts::merge::merge_result::MergeResult;
use crate::artifacts::merge::three_way::{PathConflict, ThreeWayMerge};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Snapshot, Tree};
use crate::errors::CitError;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::path::PathBuf;

impl Repository {
    /// Merge `source_branch` into the current branch
    ///
    /// Preconditions are checked and every working file the merge would overwrite is
    /// verified before anything is written, so a refused merge leaves the repository as it
    /// was. A clean merge always records a merge commit; conflicts leave marked files and a
    /// `MERGE_HEAD` behind for the next commit to conclude.
    pub fn merge(&self, source_branch: &str) -> anyhow::Result<MergeResult> {
        let source_branch = BranchName::try_parse(source_branch.to_string())
            .map_err(|_| CitError::SourceBranchNotFound(source_branch.to_string()))?;
        let _lock = self.lock()?;

        if !self.refs().branch_exists(&source_branch) {
            return Err(CitError::SourceBranchNotFound(source_branch.to_string()).into());
        }
        if !self.index_mut().is_empty() {
            return Err(CitError::DirtyStagingArea.into());
        }
        if let Some(merge_head) = self.refs().read_merge_head()? {
            return Err(CitError::MergeInProgress(merge_head.branch.to_string()).into());
        }

        let current_branch = self.refs().current_branch()?;
        let Some(source_oid) = self.refs().branch_head(&source_branch)? else {
            tracing::info!(source = %source_branch, "source branch is unborn, nothing to merge");
            return Ok(MergeResult::up_to_date());
        };
        let Some(current_oid) = self.refs().branch_head(&current_branch)? else {
            return self.adopt_source_tip(&current_branch, &source_branch, source_oid);
        };

        let database = self.database();
        let bca_finder = BCAFinder::new(|oid: &ObjectId| database.load_commit(oid)?.to_slim());

        if bca_finder.is_ancestor(&source_oid, &current_oid)? {
            tracing::info!(source = %source_branch, "already up to date");
            return Ok(MergeResult::up_to_date());
        }

        let base_oid = bca_finder.find_best_common_ancestor(&current_oid, &source_oid)?;
        let base = database.load_snapshot(base_oid.as_ref())?;
        let ours = database.load_snapshot(Some(&current_oid))?;
        let theirs = database.load_snapshot(Some(&source_oid))?;

        let three_way = ThreeWayMerge::merge(&base, &ours, &theirs);
        if !three_way.has_conflicts() && three_way.merged.is_empty() {
            return Err(CitError::EmptySnapshot.into());
        }

        let migration = Migration::new(database, &ours, &three_way.merged);
        let stale_paths = self.merge_stale_paths(&migration, &ours, &three_way.conflicts)?;
        if !stale_paths.is_empty() {
            return Err(CitError::CheckoutConflict(stale_paths).into());
        }

        let merged_files = Self::migrated_paths(&migration);
        self.workspace().apply_migration(&migration)?;

        if three_way.has_conflicts() {
            return self.record_conflicts(
                &current_branch,
                &source_branch,
                source_oid,
                &ours,
                three_way,
                merged_files,
            );
        }

        let message = format!("Merge branch '{}' into {}", source_branch, current_branch);
        let (commit_oid, _) = self.create_commit(
            &message,
            self.author(),
            vec![current_oid, source_oid],
            three_way.merged,
        )?;
        self.refs().update_branch_head(&current_branch, &commit_oid)?;

        tracing::info!(
            source = %source_branch,
            target = %current_branch,
            commit = %commit_oid.to_short_oid(),
            files = merged_files.len(),
            "{}",
            message
        );

        Ok(MergeResult::merged(message, commit_oid, merged_files))
    }

    /// An unborn branch simply takes over the source history
    fn adopt_source_tip(
        &self,
        current_branch: &BranchName,
        source_branch: &BranchName,
        source_oid: ObjectId,
    ) -> anyhow::Result<MergeResult> {
        let target = self.database().load_snapshot(Some(&source_oid))?;
        let migration = Migration::new(self.database(), &Snapshot::new(), &target);

        let stale_paths = migration.stale_paths(self.workspace())?;
        if !stale_paths.is_empty() {
            return Err(CitError::CheckoutConflict(stale_paths).into());
        }

        let merged_files = Self::migrated_paths(&migration);
        self.workspace().apply_migration(&migration)?;
        self.refs().update_branch_head(current_branch, &source_oid)?;

        tracing::info!(
            source = %source_branch,
            target = %current_branch,
            head = %source_oid.to_short_oid(),
            "unborn branch adopted the source tip"
        );

        Ok(MergeResult::adopted(
            source_branch.as_ref(),
            source_oid,
            merged_files,
        ))
    }

    /// Write conflict markers, stage the clean changes and remember the merge source
    fn record_conflicts(
        &self,
        current_branch: &BranchName,
        source_branch: &BranchName,
        source_oid: ObjectId,
        ours: &Snapshot,
        three_way: ThreeWayMerge,
        merged_files: Vec<PathBuf>,
    ) -> anyhow::Result<MergeResult> {
        for conflict in &three_way.conflicts {
            let our_content = self.load_side(conflict.ours.as_ref())?;
            let their_content = self.load_side(conflict.theirs.as_ref())?;

            let content = conflict_markers(
                current_branch.as_ref(),
                &our_content,
                source_branch.as_ref(),
                &their_content,
            );
            self.workspace().write_file(&conflict.path, &content)?;
        }

        let mut index = self.index_mut();
        three_way
            .merged
            .iter()
            .filter(|(path, oid)| ours.get(*path) != Some(*oid))
            .for_each(|(path, oid)| index.stage(path, oid.clone()));
        index.write_updates()?;

        let merged_tree_oid = self.database().store(&Tree::new(three_way.merged.clone()))?;
        self.refs().set_merge_head(&MergeHead::new(
            source_oid,
            source_branch.clone(),
            merged_tree_oid,
        ))?;

        let conflicts = three_way.conflict_paths();
        tracing::warn!(
            source = %source_branch,
            target = %current_branch,
            conflicts = conflicts.len(),
            "merge stopped on conflicts"
        );

        Ok(MergeResult::conflicted(conflicts, merged_files))
    }

    /// Local changes the merge would destroy, including those of conflicting paths
    fn merge_stale_paths(
        &self,
        migration: &Migration,
        ours: &Snapshot,
        conflicts: &[PathConflict],
    ) -> anyhow::Result<Vec<PathBuf>> {
        let mut stale_paths = migration
            .stale_paths(self.workspace())?
            .into_iter()
            .collect::<BTreeSet<_>>();

        for conflict in conflicts {
            let working_oid = self.workspace().hash_file(&conflict.path)?;
            if working_oid.is_some() && working_oid.as_ref() != ours.get(&conflict.path) {
                stale_paths.insert(conflict.path.clone());
            }
        }

        Ok(stale_paths.into_iter().collect())
    }

    fn migrated_paths(migration: &Migration) -> Vec<PathBuf> {
        [ActionType::Add, ActionType::Delete, ActionType::Modify]
            .iter()
            .filter_map(|action_type| migration.actions().get(action_type))
            .flatten()
            .map(|(path, _)| path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn load_side(&self, oid: Option<&ObjectId>) -> anyhow::Result<Bytes> {
        match oid {
            Some(oid) => self.database().get(oid),
            None => Ok(Bytes::new()),
        }
    }
}
