//! References (branches, HEAD, MERGE_HEAD)
//!
//! Branch refs live under `refs/heads/<name>` and contain the 64-character ID of the tip
//! commit, or nothing at all while the branch is unborn. `HEAD` is always symbolic:
//! `ref: refs/heads/<name>`. `MERGE_HEAD` exists only while a conflicting merge waits to
//! be concluded.

use crate::artifacts::branch::Branch;
use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::CitError;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const HEAD_REF_NAME: &str = "HEAD";
pub const MERGE_HEAD_REF_NAME: &str = "MERGE_HEAD";

/// Source side of a merge that stopped on conflicts
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MergeHead {
    pub oid: ObjectId,
    pub branch: BranchName,
    /// Tree holding every cleanly merged path, conflicting paths keep the current side
    pub merged_tree: ObjectId,
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the metadata directory (typically `.cit`)
    path: Box<Path>,
}

impl Refs {
    /// Point `HEAD` at an unborn `default_branch`
    pub fn init(&self, default_branch: &BranchName) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.heads_path())
            .with_context(|| format!("failed to create {:?}", self.heads_path()))?;

        self.write_ref_file(&self.branch_path(default_branch), "")?;
        self.set_head(default_branch)
    }

    /// Name of the branch `HEAD` points at
    pub fn current_branch(&self) -> anyhow::Result<BranchName> {
        let head_path = self.head_path();
        let content = std::fs::read_to_string(&head_path)
            .with_context(|| format!("failed to read HEAD at {:?}", head_path))?;

        let symref_match = regex::Regex::new(SYMREF_REGEX)?
            .captures(content.trim())
            .with_context(|| format!("HEAD is not a symbolic ref: {}", content.trim()))?;

        BranchName::try_parse_sym_ref_name(&SymRefName::new(symref_match[1].to_string()))
    }

    pub fn is_current_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        Ok(&self.current_branch()? == branch_name)
    }

    pub fn set_head(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        let sym_ref = SymRefName::for_branch(branch_name);
        self.write_ref_file(&self.head_path(), &format!("ref: {}", sym_ref.as_ref_path()))
    }

    /// Tip of the current branch, `None` while it is unborn
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.branch_head(&self.current_branch()?)
    }

    pub fn branch_exists(&self, branch_name: &BranchName) -> bool {
        self.branch_path(branch_name).is_file()
    }

    /// Tip of `branch_name`, `None` while it is unborn
    pub fn branch_head(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let branch_path = self.branch_path(branch_name);
        if !branch_path.is_file() {
            return Err(CitError::BranchNotFound(branch_name.to_string()).into());
        }

        Self::read_oid_file(&branch_path)
    }

    /// Move `branch_name` to `oid`
    ///
    /// No ancestry check is made: any commit may become the new tip.
    pub fn update_branch_head(
        &self,
        branch_name: &BranchName,
        oid: &ObjectId,
    ) -> anyhow::Result<()> {
        let branch_path = self.branch_path(branch_name);
        if !branch_path.is_file() {
            return Err(CitError::BranchNotFound(branch_name.to_string()).into());
        }

        self.write_ref_file(&branch_path, oid.as_ref())
    }

    /// Put `branch_name` back to a previously read tip, including the unborn state
    pub fn restore_branch_head(
        &self,
        branch_name: &BranchName,
        oid: Option<&ObjectId>,
    ) -> anyhow::Result<()> {
        let content = oid.map(ObjectId::to_string).unwrap_or_default();
        self.write_ref_file(&self.branch_path(branch_name), &content)
    }

    pub fn create_branch(
        &self,
        branch_name: &BranchName,
        head: Option<&ObjectId>,
    ) -> anyhow::Result<()> {
        let branch_path = self.branch_path(branch_name);

        // refs/heads/a and refs/heads/a/b cannot both exist
        if branch_path.exists() || self.conflicts_with_hierarchy(&branch_path) {
            return Err(CitError::BranchAlreadyExists(branch_name.to_string()).into());
        }

        let content = head.map(ObjectId::to_string).unwrap_or_default();
        self.write_ref_file(&branch_path, &content)
    }

    /// Delete `branch_name` and return the tip it pointed to
    pub fn delete_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let oid = self.branch_head(branch_name)?;

        if self.is_current_branch(branch_name)? {
            return Err(CitError::CurrentBranchDeletion(branch_name.to_string()).into());
        }

        let branch_path = self.branch_path(branch_name);
        std::fs::remove_file(&branch_path)
            .with_context(|| format!("failed to delete branch file at {:?}", branch_path))?;
        self.prune_branch_empty_parent_dirs(&branch_path)?;

        Ok(oid)
    }

    /// Every branch sorted by name, the checked out one flagged
    pub fn list_branches(&self) -> anyhow::Result<Vec<Branch>> {
        let current_branch = self.current_branch()?;
        let heads_path = self.heads_path();

        let mut branches = WalkDir::new(&heads_path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| -> anyhow::Result<Branch> {
                let relative_path = entry.path().strip_prefix(&heads_path)?;
                let name = relative_path
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let name = BranchName::try_parse(name)?;
                let head = Self::read_oid_file(entry.path())?;
                let is_current = name == current_branch;

                Ok(Branch::new(name, head, is_current))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    pub fn set_merge_head(&self, merge_head: &MergeHead) -> anyhow::Result<()> {
        self.write_ref_file(
            &self.merge_head_path(),
            &format!(
                "{}\n{}\n{}\n",
                merge_head.oid, merge_head.branch, merge_head.merged_tree
            ),
        )
    }

    pub fn read_merge_head(&self) -> anyhow::Result<Option<MergeHead>> {
        let merge_head_path = self.merge_head_path();
        if !merge_head_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&merge_head_path)
            .with_context(|| format!("failed to read {:?}", merge_head_path))?;
        let mut lines = content.lines();

        let oid = lines.next().context("MERGE_HEAD is missing the commit id")?;
        let branch = lines.next().context("MERGE_HEAD is missing the branch name")?;
        let merged_tree = lines
            .next()
            .context("MERGE_HEAD is missing the merged tree id")?;

        Ok(Some(MergeHead::new(
            ObjectId::try_parse(oid.trim().to_string())?,
            BranchName::try_parse(branch.trim().to_string())?,
            ObjectId::try_parse(merged_tree.trim().to_string())?,
        )))
    }

    pub fn clear_merge_head(&self) -> anyhow::Result<()> {
        let merge_head_path = self.merge_head_path();
        if merge_head_path.exists() {
            std::fs::remove_file(&merge_head_path)
                .with_context(|| format!("failed to remove {:?}", merge_head_path))?;
        }

        Ok(())
    }

    fn read_oid_file(path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {:?}", path))?;
        let content = content.trim();

        if content.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ObjectId::try_parse(content.to_string())?))
        }
    }

    fn write_ref_file(&self, path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        // create all the parent directories if they don't exist
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to find parent directory of ref file at {:?}", path)
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut()
            .write_all(raw_ref.as_bytes())
            .with_context(|| format!("failed to write ref file at {:?}", path))?;

        Ok(())
    }

    fn conflicts_with_hierarchy(&self, branch_path: &Path) -> bool {
        let heads_path = self.heads_path();

        branch_path.is_dir()
            || branch_path
                .ancestors()
                .skip(1)
                .take_while(|ancestor| *ancestor != heads_path.as_ref())
                .any(|ancestor| ancestor.is_file())
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.heads_path().as_ref()
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent).with_context(|| {
                format!("failed to remove empty branch directory at {:?}", parent)
            })?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }

    fn branch_path(&self, branch_name: &BranchName) -> Box<Path> {
        self.path
            .join(SymRefName::for_branch(branch_name).as_ref_path())
            .into_boxed_path()
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn merge_head_path(&self) -> Box<Path> {
        self.path.join(MERGE_HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
