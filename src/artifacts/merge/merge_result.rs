use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;

/// Outcome of a merge
///
/// A merge that stops on conflicts is not an error: `success` is false, `conflicts` lists
/// the marked paths and no commit is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub success: bool,
    /// Paths left with conflict markers, sorted
    pub conflicts: Vec<PathBuf>,
    /// Paths whose content changed in the working tree, sorted
    pub merged_files: Vec<PathBuf>,
    pub message: String,
    /// The merge commit, or the new tip when an unborn branch adopted the source
    pub commit: Option<ObjectId>,
}

impl MergeResult {
    pub fn up_to_date() -> Self {
        MergeResult {
            success: true,
            conflicts: Vec::new(),
            merged_files: Vec::new(),
            message: "Already up to date".to_string(),
            commit: None,
        }
    }

    pub fn adopted(source_branch: &str, tip: ObjectId, merged_files: Vec<PathBuf>) -> Self {
        MergeResult {
            success: true,
            conflicts: Vec::new(),
            merged_files,
            message: format!("Fast-forward to '{source_branch}'"),
            commit: Some(tip),
        }
    }

    pub fn merged(message: String, commit: ObjectId, merged_files: Vec<PathBuf>) -> Self {
        MergeResult {
            success: true,
            conflicts: Vec::new(),
            merged_files,
            message,
            commit: Some(commit),
        }
    }

    pub fn conflicted(conflicts: Vec<PathBuf>, merged_files: Vec<PathBuf>) -> Self {
        MergeResult {
            message: format!(
                "Automatic merge failed; fix conflicts in {} file(s) and then commit the result",
                conflicts.len()
            ),
            success: false,
            conflicts,
            merged_files,
            commit: None,
        }
    }
}
