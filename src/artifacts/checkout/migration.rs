//! Snapshot-to-snapshot working tree migration
//!
//! 1. Compute the per-path difference between the current and the target snapshot
//! 2. Detect local changes that the migration would destroy
//! 3. Apply the changes to the workspace
//!
//! A path is *stale* when its working file no longer matches the content recorded in
//! the current snapshot (or, for a path the current snapshot lacks, when an untracked
//! file with different content sits where the target wants to write).

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Snapshot;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Type of file system action required for a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    /// Create new file
    Add,
    /// Delete file
    Delete,
    /// Modify existing file
    Modify,
}

/// Planned actions grouped by type; deletions carry no object
pub type ActionsSet = BTreeMap<ActionType, Vec<(PathBuf, Option<ObjectId>)>>;

pub struct Migration<'r> {
    database: &'r Database,
    actions: ActionsSet,
    /// Current content of every path the migration touches
    expected: BTreeMap<PathBuf, Option<ObjectId>>,
    /// Directories that may be left empty by deletions
    rmdirs: BTreeSet<PathBuf>,
}

impl<'r> Migration<'r> {
    pub fn new(database: &'r Database, current: &Snapshot, target: &Snapshot) -> Self {
        let mut actions = ActionsSet::from([
            (ActionType::Add, Vec::new()),
            (ActionType::Delete, Vec::new()),
            (ActionType::Modify, Vec::new()),
        ]);
        let mut expected = BTreeMap::new();
        let mut rmdirs = BTreeSet::new();

        for (path, old_oid) in current {
            match target.get(path) {
                None => {
                    actions
                        .entry(ActionType::Delete)
                        .or_default()
                        .push((path.clone(), None));
                    path.ancestors().skip(1).for_each(|ancestor| {
                        if !ancestor.as_os_str().is_empty() {
                            rmdirs.insert(ancestor.to_path_buf());
                        }
                    });
                }
                Some(new_oid) if new_oid != old_oid => {
                    actions
                        .entry(ActionType::Modify)
                        .or_default()
                        .push((path.clone(), Some(new_oid.clone())));
                }
                Some(_) => continue,
            }

            expected.insert(path.clone(), Some(old_oid.clone()));
        }

        for (path, new_oid) in target {
            if !current.contains_key(path) {
                actions
                    .entry(ActionType::Add)
                    .or_default()
                    .push((path.clone(), Some(new_oid.clone())));
                expected.insert(path.clone(), None);
            }
        }

        Migration {
            database,
            actions,
            expected,
            rmdirs,
        }
    }

    pub fn actions(&self) -> &ActionsSet {
        &self.actions
    }

    pub fn rmdirs(&self) -> &BTreeSet<PathBuf> {
        &self.rmdirs
    }

    pub fn is_empty(&self) -> bool {
        self.actions.values().all(Vec::is_empty)
    }

    /// Paths whose local state would be lost by applying this migration
    pub fn stale_paths(&self, workspace: &Workspace) -> anyhow::Result<Vec<PathBuf>> {
        let mut stale = Vec::new();

        for (path, expected_oid) in &self.expected {
            let actual_oid = workspace.hash_file(path)?;
            let target_oid = self.target_oid(path);

            let is_stale = match (expected_oid, &actual_oid) {
                // tracked: any divergence from the recorded content is a local change
                (Some(expected), Some(actual)) => expected != actual,
                // untracked file in the way, harmless only if it already matches
                (None, Some(actual)) => target_oid != Some(actual),
                (_, None) => false,
            };

            if is_stale {
                stale.push(path.clone());
            }
        }

        Ok(stale)
    }

    fn target_oid(&self, path: &Path) -> Option<&ObjectId> {
        [ActionType::Add, ActionType::Modify]
            .iter()
            .filter_map(|action_type| self.actions.get(action_type))
            .flatten()
            .find(|(action_path, _)| action_path == path)
            .and_then(|(_, oid)| oid.as_ref())
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        self.database.get(object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn oid(c: char) -> ObjectId {
        ObjectId::try_parse(c.to_string().repeat(64)).unwrap()
    }

    fn snapshot(entries: &[(&str, char)]) -> Snapshot {
        entries
            .iter()
            .map(|(path, c)| (PathBuf::from(path), oid(*c)))
            .collect()
    }

    #[test]
    fn test_plans_adds_modifies_and_deletes() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let current = snapshot(&[("keep.txt", 'a'), ("change.txt", 'b'), ("dir/gone.txt", 'c')]);
        let target = snapshot(&[("keep.txt", 'a'), ("change.txt", 'd'), ("new.txt", 'e')]);

        let migration = Migration::new(&database, &current, &target);

        assert_eq!(
            migration.actions()[&ActionType::Add],
            vec![(PathBuf::from("new.txt"), Some(oid('e')))]
        );
        assert_eq!(
            migration.actions()[&ActionType::Modify],
            vec![(PathBuf::from("change.txt"), Some(oid('d')))]
        );
        assert_eq!(
            migration.actions()[&ActionType::Delete],
            vec![(PathBuf::from("dir/gone.txt"), None)]
        );
        assert!(migration.rmdirs().contains(Path::new("dir")));
    }

    #[test]
    fn test_identical_snapshots_need_no_migration() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let current = snapshot(&[("a.txt", 'a')]);

        assert!(Migration::new(&database, &current, &current).is_empty());
    }
}
