//! Domain errors raised by the repository façade
//!
//! Plumbing code returns `anyhow::Result` with context attached at every filesystem step.
//! Failures a caller may want to react to are raised as a [`CitError`] inside the
//! `anyhow::Error`, so they can be recovered with `downcast_ref::<CitError>()`.
//!
//! A merge that stops on conflicts is *not* an error: it completes with a
//! [`MergeResult`](crate::artifacts::merge::merge_result::MergeResult) whose `success`
//! flag is false.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`CitError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A repository, branch, remote, object or file is missing
    NotFound,
    /// The repository is not in a state that allows the operation
    InvalidState,
    /// A filesystem fault reported by a collaborator
    IoFailure,
}

#[derive(Debug, Error)]
pub enum CitError {
    #[error("not a cit repository (or any of the parent directories): {0}")]
    RepositoryNotFound(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("source branch '{0}' not found")]
    SourceBranchNotFound(String),

    #[error("branch '{0}' already exists")]
    BranchAlreadyExists(String),

    #[error("invalid branch name: '{0}'")]
    InvalidBranchName(String),

    #[error("cannot delete the currently checked out branch '{0}'")]
    CurrentBranchDeletion(String),

    #[error("remote '{0}' not found")]
    RemoteNotFound(String),

    #[error("remote '{0}' already exists")]
    RemoteExists(String),

    #[error("object {0} not found")]
    ObjectNotFound(String),

    #[error("path '{0}' did not match any files")]
    FileNotFound(PathBuf),

    #[error("nothing to commit: the staging area is empty")]
    EmptyStagingArea,

    #[error("the staging area has uncommitted changes; commit them first")]
    DirtyStagingArea,

    #[error("a commit must capture at least one file")]
    EmptySnapshot,

    #[error("branch '{0}' has no commits yet")]
    NoCommits(String),

    #[error("a merge of '{0}' is in progress; resolve the conflicts and commit first")]
    MergeInProgress(String),

    #[error("unsupported conflict resolution strategy '{0}' (expected ours, theirs or both)")]
    UnsupportedStrategy(String),

    #[error("your local changes to the following files would be overwritten by checkout: {}", display_paths(.0))]
    CheckoutConflict(Vec<PathBuf>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CitError::RepositoryNotFound(_)
            | CitError::BranchNotFound(_)
            | CitError::SourceBranchNotFound(_)
            | CitError::RemoteNotFound(_)
            | CitError::ObjectNotFound(_)
            | CitError::FileNotFound(_) => ErrorKind::NotFound,
            CitError::Io(_) => ErrorKind::IoFailure,
            _ => ErrorKind::InvalidState,
        }
    }
}

/// Extract the domain error carried by an `anyhow::Error`, if any
pub fn domain_error(error: &anyhow::Error) -> Option<&CitError> {
    error.downcast_ref::<CitError>()
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
