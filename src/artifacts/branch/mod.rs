use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

pub mod branch_name;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Directory of branch refs, relative to the metadata directory
pub const HEADS_PREFIX: &str = "refs/heads/";

/// A named, mutable pointer into the commit graph
///
/// `head` is `None` while the branch is unborn (created before its first commit).
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Branch {
    pub name: BranchName,
    pub head: Option<ObjectId>,
    pub is_current: bool,
}
