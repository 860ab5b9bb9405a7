use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Snapshot;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A path both sides changed differently since the base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    pub path: PathBuf,
    pub ours: Option<ObjectId>,
    pub theirs: Option<ObjectId>,
}

/// Result of comparing base, ours and theirs path by path
///
/// `merged` holds every cleanly merged path; a conflicting path keeps our side there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreeWayMerge {
    pub merged: Snapshot,
    pub conflicts: Vec<PathConflict>,
}

impl ThreeWayMerge {
    pub fn merge(base: &Snapshot, ours: &Snapshot, theirs: &Snapshot) -> Self {
        let paths = base
            .keys()
            .chain(ours.keys())
            .chain(theirs.keys())
            .collect::<BTreeSet<_>>();

        let mut result = ThreeWayMerge::default();

        for path in paths {
            let base_oid = base.get(path);
            let our_oid = ours.get(path);
            let their_oid = theirs.get(path);

            let resolved = if our_oid == their_oid || base_oid == their_oid {
                our_oid
            } else if base_oid == our_oid {
                their_oid
            } else {
                result.conflicts.push(PathConflict {
                    path: path.clone(),
                    ours: our_oid.cloned(),
                    theirs: their_oid.cloned(),
                });
                our_oid
            };

            if let Some(oid) = resolved {
                result.merged.insert(path.clone(), oid.clone());
            }
        }

        result
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflict_paths(&self) -> Vec<PathBuf> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.path.clone())
            .collect()
    }
}
