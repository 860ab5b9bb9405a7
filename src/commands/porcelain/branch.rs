use crate::areas::repository::Repository;
use crate::artifacts::branch::Branch;
use crate::artifacts::branch::branch_name::BranchName;

impl Repository {
    /// Create `branch_name` at the current branch head
    ///
    /// Branching off an unborn branch yields another unborn branch.
    pub fn create_branch(&self, branch_name: &str) -> anyhow::Result<Branch> {
        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let _lock = self.lock()?;

        let source_oid = self.refs().read_head()?;
        self.refs().create_branch(&branch_name, source_oid.as_ref())?;

        tracing::info!(
            branch = %branch_name,
            head = source_oid.as_ref().map(|oid| oid.to_short_oid()).unwrap_or_default(),
            "created branch"
        );

        Ok(Branch::new(branch_name, source_oid, false))
    }

    /// Delete `branch_name`, returning the commit it pointed at
    pub fn delete_branch(&self, branch_name: &str) -> anyhow::Result<Branch> {
        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let _lock = self.lock()?;

        let head = self.refs().delete_branch(&branch_name)?;
        tracing::info!(branch = %branch_name, "deleted branch");

        Ok(Branch::new(branch_name, head, false))
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<Branch>> {
        self.refs().list_branches()
    }
}
