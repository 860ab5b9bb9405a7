use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::migration::Migration;
use crate::errors::CitError;

impl Repository {
    /// Switch the working tree and `HEAD` to `branch_name`
    ///
    /// Nothing is touched unless the whole migration is safe: the staging area must be empty
    /// and no file the migration rewrites or removes may carry local changes.
    pub fn checkout_branch(&self, branch_name: &str) -> anyhow::Result<()> {
        let target_branch = BranchName::try_parse(branch_name.to_string())
            .map_err(|_| CitError::BranchNotFound(branch_name.to_string()))?;
        let _lock = self.lock()?;

        let target_oid = self.refs().branch_head(&target_branch)?;
        let current_branch = self.refs().current_branch()?;

        if current_branch == target_branch {
            tracing::info!(branch = %target_branch, "already on branch");
            return Ok(());
        }

        if !self.index_mut().is_empty() {
            return Err(CitError::DirtyStagingArea.into());
        }
        if let Some(merge_head) = self.refs().read_merge_head()? {
            return Err(CitError::MergeInProgress(merge_head.branch.to_string()).into());
        }

        let current_oid = self.refs().branch_head(&current_branch)?;
        let current_snapshot = self.database().load_snapshot(current_oid.as_ref())?;
        let target_snapshot = self.database().load_snapshot(target_oid.as_ref())?;

        let migration = Migration::new(self.database(), &current_snapshot, &target_snapshot);
        let stale_paths = migration.stale_paths(self.workspace())?;
        if !stale_paths.is_empty() {
            return Err(CitError::CheckoutConflict(stale_paths).into());
        }

        if !migration.is_empty() {
            self.workspace().apply_migration(&migration)?;
        }
        self.refs().set_head(&target_branch)?;

        tracing::info!(
            from = %current_branch,
            to = %target_branch,
            "switched to branch '{}'",
            target_branch
        );

        Ok(())
    }
}
