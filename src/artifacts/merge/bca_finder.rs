//! Best common ancestor search
//!
//! The base of a three-way merge is a *best common ancestor*: a commit reachable from both
//! tips that is not itself an ancestor of another common ancestor.
//!
//! ## Algorithm
//!
//! ### Phase 1: common ancestors
//!
//! Both tips are pushed onto a max-heap ordered by commit timestamp, so the newest commit is
//! always expanded first. Each commit carries bit flags telling from which side it was
//! reached. A commit reached from both sides is a common ancestor; its own ancestors are
//! marked `STALE`, since anything below a common ancestor cannot be a better one.
//!
//! ### Phase 2: redundancy filter
//!
//! A common ancestor reachable from another common ancestor is redundant. Among the
//! remaining candidates the newest wins, ties broken by the smaller object ID, so the
//! choice is deterministic.

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        /// Below a common ancestor, cannot be a best one
        const STALE = 0b100;
        /// Reached from both sides
        const RESULT = 0b1000;
    }
}

impl fmt::Debug for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (VisitState::VISITED_FROM_SOURCE, "SOURCE"),
            (VisitState::VISITED_FROM_TARGET, "TARGET"),
            (VisitState::STALE, "STALE"),
            (VisitState::RESULT, "RESULT"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect::<Vec<_>>();

        if flags.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

/// Finds the best common ancestor of two commits
///
/// Commits are fetched through `commit_loader`, so the finder works over the object
/// database as well as over an in-memory graph. Loaded commits are cached for the lifetime
/// of the finder.
pub struct BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
    cache: RefCell<HashMap<ObjectId, SlimCommit>>,
}

impl<CommitLoaderFn> BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<SlimCommit>,
{
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            commit_loader,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn load(&self, commit_id: &ObjectId) -> anyhow::Result<SlimCommit> {
        if let Some(commit) = self.cache.borrow().get(commit_id) {
            return Ok(commit.clone());
        }

        let commit = (self.commit_loader)(commit_id)?;
        self.cache
            .borrow_mut()
            .insert(commit_id.clone(), commit.clone());

        Ok(commit)
    }

    /// Best common ancestor of `source_commit_id` and `target_commit_id`
    ///
    /// `None` when the histories are unrelated.
    pub fn find_best_common_ancestor(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Option<ObjectId>> {
        let common_ancestors = self.find_common_ancestors(source_commit_id, target_commit_id)?;
        tracing::debug!(
            source = %source_commit_id.to_short_oid(),
            target = %target_commit_id.to_short_oid(),
            candidates = common_ancestors.len(),
            "found common ancestors"
        );

        let mut redundant_ancestors = HashSet::new();
        for candidate in &common_ancestors {
            let ancestors = self.ancestors_of(candidate)?;

            common_ancestors
                .iter()
                .filter(|other| *other != candidate && ancestors.contains(*other))
                .for_each(|other| {
                    redundant_ancestors.insert(other.clone());
                });
        }

        let mut best_common_ancestors = Vec::new();
        for candidate in common_ancestors {
            if !redundant_ancestors.contains(&candidate) {
                let timestamp = self.load(&candidate)?.timestamp;
                best_common_ancestors.push((timestamp, candidate));
            }
        }

        // newest first, then smallest id
        best_common_ancestors.sort_by(|(ts_a, oid_a), (ts_b, oid_b)| {
            ts_b.cmp(ts_a).then_with(|| oid_a.cmp(oid_b))
        });

        let best = best_common_ancestors.into_iter().next().map(|(_, oid)| oid);
        tracing::debug!(best = ?best.as_ref().map(ObjectId::to_short_oid), "best common ancestor");

        Ok(best)
    }

    /// Whether `ancestor_id` is reachable from `commit_id` (a commit is its own ancestor)
    pub fn is_ancestor(&self, ancestor_id: &ObjectId, commit_id: &ObjectId) -> anyhow::Result<bool> {
        if ancestor_id == commit_id {
            return Ok(true);
        }

        Ok(self.ancestors_of(commit_id)?.contains(ancestor_id))
    }

    fn find_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Vec<ObjectId>> {
        if source_commit_id == target_commit_id {
            return Ok(vec![source_commit_id.clone()]);
        }

        let mut ancestors_states = HashMap::<ObjectId, VisitState>::new();
        let mut priority_queue = BinaryHeap::new();

        for (commit_id, side) in [
            (source_commit_id, VisitState::VISITED_FROM_SOURCE),
            (target_commit_id, VisitState::VISITED_FROM_TARGET),
        ] {
            let commit = self.load(commit_id)?;
            ancestors_states.insert(commit.oid.clone(), side);
            priority_queue.push((commit.timestamp, commit.oid));
        }

        while let Some((_, commit_id)) = priority_queue.pop() {
            let current_state = ancestors_states
                .get(&commit_id)
                .copied()
                .unwrap_or(VisitState::NONE);

            tracing::trace!(commit = %commit_id.to_short_oid(), state = ?current_state, "visiting");

            if current_state.contains(VisitState::STALE) {
                continue;
            }

            let is_common_ancestor = current_state.contains(VisitState::VISITED_FROM_BOTH);
            if is_common_ancestor {
                ancestors_states
                    .entry(commit_id.clone())
                    .and_modify(|state| *state |= VisitState::RESULT);
            }

            let current_commit = self.load(&commit_id)?;

            for parent_id in &current_commit.parents {
                let parent_state = ancestors_states
                    .get(parent_id)
                    .copied()
                    .unwrap_or(VisitState::NONE);

                let mut new_state = parent_state | (current_state & VisitState::VISITED_FROM_BOTH);
                if is_common_ancestor {
                    new_state |= VisitState::STALE;
                }

                if new_state != parent_state {
                    let parent_commit = self.load(parent_id)?;
                    ancestors_states.insert(parent_id.clone(), new_state);
                    priority_queue.push((parent_commit.timestamp, parent_id.clone()));
                }
            }
        }

        let mut common_ancestors = ancestors_states
            .into_iter()
            .filter(|(_, state)| {
                state.contains(VisitState::RESULT) && !state.contains(VisitState::STALE)
            })
            .map(|(oid, _)| oid)
            .collect::<Vec<_>>();
        common_ancestors.sort();

        Ok(common_ancestors)
    }

    /// Every strict ancestor of `commit_id`
    fn ancestors_of(&self, commit_id: &ObjectId) -> anyhow::Result<HashSet<ObjectId>> {
        let mut ancestors = HashSet::new();
        let mut queue = VecDeque::from(self.load(commit_id)?.parents);

        while let Some(current) = queue.pop_front() {
            if ancestors.insert(current.clone()) {
                queue.extend(self.load(&current)?.parents);
            }
        }

        Ok(ancestors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use rstest::rstest;

    /// In-memory commit graph, each commit one hour newer than the previous one
    #[derive(Default)]
    struct InMemoryCommitStore {
        commits: HashMap<ObjectId, SlimCommit>,
    }

    impl InMemoryCommitStore {
        fn add_commit(&mut self, name: &str, parents: &[&str]) {
            let offset = self.commits.len() as i64 * 3600;
            self.add_commit_at(name, parents, 1640995200 + offset);
        }

        fn add_commit_at(&mut self, name: &str, parents: &[&str], timestamp: i64) {
            let timestamp: DateTime<FixedOffset> = FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(timestamp, 0)
                .unwrap();
            let commit = SlimCommit {
                oid: oid(name),
                parents: parents.iter().map(|parent| oid(parent)).collect(),
                timestamp,
            };
            self.commits.insert(commit.oid.clone(), commit);
        }

        fn finder(&self) -> BCAFinder<impl Fn(&ObjectId) -> anyhow::Result<SlimCommit> + '_> {
            BCAFinder::new(|commit_id| {
                self.commits
                    .get(commit_id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("unknown commit {commit_id}"))
            })
        }
    }

    /// Deterministic 64-character id derived from a readable name
    fn oid(name: &str) -> ObjectId {
        let mut hex = name
            .bytes()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        hex.truncate(64);
        while hex.len() < 64 {
            hex.push('0');
        }

        ObjectId::try_parse(hex).unwrap()
    }

    fn bca(store: &InMemoryCommitStore, a: &str, b: &str) -> Option<ObjectId> {
        store
            .finder()
            .find_best_common_ancestor(&oid(a), &oid(b))
            .unwrap()
    }

    #[rstest]
    #[case("b", "d", "b")]
    #[case("d", "b", "b")]
    #[case("c", "c", "c")]
    fn test_linear_history(#[case] source: &str, #[case] target: &str, #[case] expected: &str) {
        // a <- b <- c <- d
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["b"]);
        store.add_commit("d", &["c"]);

        assert_eq!(bca(&store, source, target), Some(oid(expected)));
    }

    #[test]
    fn test_simple_divergence() {
        //     a
        //    / \
        //   b   c
        //   |
        //   d
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["a"]);
        store.add_commit("d", &["b"]);

        assert_eq!(bca(&store, "d", "c"), Some(oid("a")));
    }

    #[test]
    fn test_previous_merge_moves_the_base() {
        //   a - b ---- e
        //    \     /
        //     c - d - f
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["a"]);
        store.add_commit("d", &["c"]);
        store.add_commit("e", &["b", "d"]);
        store.add_commit("f", &["d"]);

        assert_eq!(bca(&store, "e", "f"), Some(oid("d")));
    }

    #[test]
    fn test_criss_cross_picks_a_best_ancestor_deterministically() {
        //     a
        //    / \
        //   b   c
        //   |\ /|
        //   | X |
        //   |/ \|
        //   d   e
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["a"]);
        store.add_commit("d", &["b", "c"]);
        store.add_commit("e", &["c", "b"]);

        let first = bca(&store, "d", "e");
        let second = bca(&store, "e", "d");

        assert!(first == Some(oid("b")) || first == Some(oid("c")));
        assert_eq!(first, second);
        // c is newer than b
        assert_eq!(first, Some(oid("c")));
    }

    #[test]
    fn test_skewed_timestamps_still_filter_redundant_ancestors() {
        // a <- b <- c, with b older than a
        let mut store = InMemoryCommitStore::default();
        store.add_commit_at("a", &[], 2000);
        store.add_commit_at("b", &["a"], 1000);
        store.add_commit_at("c", &["b"], 3000);
        store.add_commit_at("x", &["a"], 4000);
        store.add_commit_at("y", &["b"], 5000);

        assert_eq!(bca(&store, "c", "y"), Some(oid("b")));
        assert_eq!(bca(&store, "x", "y"), Some(oid("a")));
    }

    #[test]
    fn test_unrelated_histories_have_no_ancestor() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &[]);

        assert_eq!(bca(&store, "a", "b"), None);
    }

    #[test]
    fn test_is_ancestor() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["a"]);
        let finder = store.finder();

        assert!(finder.is_ancestor(&oid("a"), &oid("b")).unwrap());
        assert!(finder.is_ancestor(&oid("b"), &oid("b")).unwrap());
        assert!(!finder.is_ancestor(&oid("b"), &oid("c")).unwrap());
    }
}
