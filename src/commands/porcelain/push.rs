use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::remote::push::{PushFile, PushRequest, PushResult, PushTransport};
use crate::errors::CitError;

impl Repository {
    /// Hand the current branch to `transport` for publication on `remote_name`
    ///
    /// The request carries every commit of the branch (first parents, newest first) and the
    /// content of every working tree file.
    pub fn push(
        &self,
        remote_name: &str,
        transport: &impl PushTransport,
    ) -> anyhow::Result<PushResult> {
        let remote = self.remotes().get(remote_name)?;
        let branch = self.refs().current_branch()?;
        let head = self
            .refs()
            .branch_head(&branch)?
            .ok_or_else(|| CitError::NoCommits(branch.to_string()))?;

        let commits = self
            .history_from(Some(head.clone()))?
            .iter()
            .map(|commit| commit.object_id())
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut files = Vec::new();
        for path in self.workspace().list_files()? {
            let content = self.workspace().read_file(&path)?;
            let oid = Blob::new(content.clone()).object_id()?;
            files.push(PushFile::new(path, oid, content));
        }

        let request = PushRequest::new(remote, branch, head, commits, files);
        tracing::debug!(
            remote = request.remote.name(),
            branch = %request.branch,
            objects = request.total_objects(),
            "pushing"
        );

        let result = transport.push(&request)?;
        tracing::info!(
            remote = %result.remote_name,
            branch = %result.branch_name,
            commits = result.pushed_commits,
            "pushed"
        );

        Ok(result)
    }
}
