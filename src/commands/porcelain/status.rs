use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::{Status, StatusInfo};

// Terminology:
// - staged files: files with content recorded in the index
// - modified files: tracked files whose working content differs from the staged content,
//   or from the last commit when they are not staged
// - deleted files: tracked files missing from the workspace
// - untracked files: files neither committed nor staged
impl Repository {
    pub fn status(&self) -> anyhow::Result<StatusInfo> {
        let mut index = self.index_mut();
        index.rehydrate()?;

        let current_branch = self.refs().current_branch()?;
        let last_commit = self.refs().branch_head(&current_branch)?;
        let merge_head = self.refs().read_merge_head()?;

        // while a merge is being concluded, cleanly merged paths are the tracked baseline
        let head_snapshot = match &merge_head {
            Some(merge_head) => self
                .database()
                .load_tree(&merge_head.merged_tree)?
                .into_entries(),
            None => self.database().load_snapshot(last_commit.as_ref())?,
        };

        let status = Status {
            workspace: self.workspace(),
            index: &index,
            head_snapshot: &head_snapshot,
        };

        status.inspect(
            current_branch,
            last_commit,
            merge_head.map(|merge_head| merge_head.branch),
        )
    }
}
