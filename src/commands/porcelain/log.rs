use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::log::history::History;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Commits of the current branch, newest first, following first parents
    pub fn history(&self) -> anyhow::Result<Vec<Commit>> {
        let branch_name = self.refs().current_branch()?;
        self.branch_history(branch_name.as_ref())
    }

    /// Commits of `branch_name`, newest first, following first parents
    ///
    /// An unborn branch has an empty history.
    pub fn branch_history(&self, branch_name: &str) -> anyhow::Result<Vec<Commit>> {
        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let head = self.refs().branch_head(&branch_name)?;

        self.history_from(head)
    }

    pub(crate) fn history_from(&self, start: Option<ObjectId>) -> anyhow::Result<Vec<Commit>> {
        History::new(self.database(), start).collect()
    }
}
