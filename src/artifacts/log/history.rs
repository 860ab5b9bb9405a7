use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::HashSet;

/// First-parent walk from a start commit down to the root
///
/// Yields the start commit first. Every commit is yielded at most once, so the walk is
/// finite even over a corrupted graph; a commit that cannot be loaded ends it with an error.
pub struct History<'r> {
    database: &'r Database,
    current_commit_oid: Option<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl<'r> History<'r> {
    pub fn new(database: &'r Database, start: Option<ObjectId>) -> Self {
        History {
            database,
            current_commit_oid: start,
            seen: HashSet::new(),
        }
    }
}

impl Iterator for History<'_> {
    type Item = anyhow::Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit_oid = self.current_commit_oid.take()?;

        if !self.seen.insert(commit_oid.clone()) {
            return None;
        }

        match self.database.load_commit(&commit_oid) {
            Ok(commit) => {
                // move to the first parent for the next iteration
                self.current_commit_oid = commit.parent().cloned();
                Some(Ok(commit))
            }
            Err(error) => Some(Err(error)),
        }
    }
}
