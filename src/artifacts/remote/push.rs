use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::remote::Remote;
use bytes::Bytes;
use derive_new::new;
use std::path::PathBuf;

/// A working tree file shipped with a push
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PushFile {
    pub path: PathBuf,
    pub oid: ObjectId,
    pub content: Bytes,
}

/// Everything a transport needs to publish one branch
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PushRequest {
    pub remote: Remote,
    pub branch: BranchName,
    pub head: ObjectId,
    /// Commits of the branch, newest first
    pub commits: Vec<ObjectId>,
    /// Working tree files sorted by path
    pub files: Vec<PushFile>,
}

impl PushRequest {
    pub fn total_objects(&self) -> usize {
        self.commits.len() + self.files.len()
    }
}

/// Outcome reported back by a transport
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PushResult {
    pub remote_name: String,
    pub branch_name: String,
    pub pushed_commits: usize,
    pub total_objects: usize,
}

/// Delivers a [`PushRequest`] to a remote
pub trait PushTransport {
    fn push(&self, request: &PushRequest) -> anyhow::Result<PushResult>;
}
