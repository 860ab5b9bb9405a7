use cit::artifacts::objects::object::Object;
use cit::errors::{CitError, ErrorKind, domain_error};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

mod common;
use common::{AUTHOR_EMAIL, AUTHOR_NAME, repository, TestRepository};

#[rstest]
fn first_commit_is_a_root_commit(repository: TestRepository) {
    repository.write("a.txt", "alpha");
    repository.stage_path("a.txt").unwrap();

    let commit = repository.commit("Initial commit").unwrap();

    assert!(commit.is_root());
    assert_eq!(commit.message(), "Initial commit");
    assert_eq!(commit.author().name(), AUTHOR_NAME);
    assert_eq!(commit.author().email(), AUTHOR_EMAIL);
    assert_eq!(repository.head(), Some(commit.object_id().unwrap()));
}

#[rstest]
fn commit_clears_the_staging_area(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");

    assert!(repository.index_mut().is_empty());

    let reopened = cit::Repository::open(repository.path()).unwrap();
    assert!(reopened.index_mut().is_empty());
}

#[rstest]
fn empty_commit_fails_and_leaves_head_unchanged(repository: TestRepository) {
    let first = repository.commit_files(&[("a.txt", "alpha")], "Initial commit");

    let error = repository.commit("Nothing staged").unwrap_err();

    let error = domain_error(&error).expect("expected a domain error");
    assert!(matches!(error, CitError::EmptyStagingArea));
    assert_eq!(error.kind(), ErrorKind::InvalidState);
    assert_eq!(repository.head(), Some(first));
}

#[rstest]
fn commit_on_unborn_branch_without_staging_fails(repository: TestRepository) {
    let error = repository.commit("Nothing staged").unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::EmptyStagingArea)));
    assert_eq!(repository.head(), None);
}

#[rstest]
fn snapshot_is_the_parent_snapshot_plus_staged_changes(repository: TestRepository) {
    let first = repository.commit_files(&[("a.txt", "alpha"), ("b.txt", "beta")], "First");
    let second = repository.commit_files(&[("b.txt", "beta 2"), ("c/d.txt", "delta")], "Second");

    let commit = repository.database().load_commit(&second).unwrap();
    assert_eq!(commit.parents(), &[first]);

    let snapshot = repository.database().load_snapshot(Some(&second)).unwrap();
    let paths = snapshot.keys().cloned().collect::<Vec<_>>();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("a.txt"),
            PathBuf::from("b.txt"),
            PathBuf::from("c/d.txt"),
        ]
    );

    let b_oid = &snapshot[&PathBuf::from("b.txt")];
    assert_eq!(&repository.database().get(b_oid).unwrap()[..], b"beta 2");
}

#[rstest]
fn create_commit_rejects_an_empty_snapshot(repository: TestRepository) {
    let error = repository
        .create_commit("empty", common::author(), Vec::new(), Default::default())
        .unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::EmptySnapshot)));
}

#[rstest]
fn staged_removal_drops_the_file_from_the_snapshot(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha"), ("b.txt", "beta")], "First");
    repository.remove("b.txt");
    repository.write("a.txt", "alpha 2");

    let report = repository.stage_path(".").unwrap();
    assert_eq!(report.staged, vec![PathBuf::from("a.txt")]);
    assert_eq!(report.removed, vec![PathBuf::from("b.txt")]);

    let second = repository.commit("Drop b.txt").unwrap().object_id().unwrap();

    let snapshot = repository.database().load_snapshot(Some(&second)).unwrap();
    assert_eq!(
        snapshot.keys().cloned().collect::<Vec<_>>(),
        vec![PathBuf::from("a.txt")]
    );
    assert!(repository.index_mut().is_empty());
    assert!(repository.status().unwrap().is_clean());
}

#[rstest]
fn removal_only_commit_is_allowed(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha"), ("dir/b.txt", "beta")], "First");
    repository.remove("dir/b.txt");

    repository.stage_path("dir/b.txt").unwrap();
    let second = repository.commit("Drop dir/b.txt").unwrap().object_id().unwrap();

    let snapshot = repository.database().load_snapshot(Some(&second)).unwrap();
    assert!(!snapshot.contains_key(&PathBuf::from("dir/b.txt")));
    assert!(snapshot.contains_key(&PathBuf::from("a.txt")));
}

#[rstest]
fn removing_every_file_fails_with_an_empty_snapshot(repository: TestRepository) {
    let first = repository.commit_files(&[("a.txt", "alpha")], "First");
    repository.remove("a.txt");
    repository.stage_path("a.txt").unwrap();

    let error = repository.commit("Drop everything").unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::EmptySnapshot)));
    assert_eq!(repository.head(), Some(first));
}
