use cit::errors::{CitError, ErrorKind, domain_error};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

mod common;
use common::{repository, TestRepository};

fn current_branch(repository: &TestRepository) -> String {
    repository.refs().current_branch().unwrap().to_string()
}

#[rstest]
fn checkout_restores_each_branch_snapshot(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha"), ("dir/b.txt", "beta")], "Initial commit");
    repository.create_branch("feature").unwrap();
    repository.checkout_branch("feature").unwrap();

    repository.commit_files(
        &[("a.txt", "alpha feature"), ("dir/b.txt", "beta feature"), ("c.txt", "gamma")],
        "Feature work",
    );

    repository.checkout_branch("main").unwrap();

    assert_eq!(current_branch(&repository), "main");
    assert_eq!(repository.read("a.txt"), "alpha");
    assert_eq!(repository.read("dir/b.txt"), "beta");
    assert!(!repository.exists("c.txt"));

    repository.checkout_branch("feature").unwrap();

    assert_eq!(current_branch(&repository), "feature");
    assert_eq!(repository.read("a.txt"), "alpha feature");
    assert_eq!(repository.read("dir/b.txt"), "beta feature");
    assert_eq!(repository.read("c.txt"), "gamma");
}

#[rstest]
fn checkout_prunes_emptied_directories(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");
    repository.create_branch("feature").unwrap();
    repository.checkout_branch("feature").unwrap();
    repository.commit_files(&[("nested/deep/file.txt", "deep")], "Nested file");

    repository.checkout_branch("main").unwrap();

    assert!(!repository.exists("nested"));
}

#[rstest]
fn checkout_of_a_missing_branch_fails(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");

    let error = repository.checkout_branch("ghost").unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::BranchNotFound(_))));
    assert_eq!(current_branch(&repository), "main");
}

#[rstest]
#[case("bad..name")]
#[case("has space")]
#[case("")]
fn checkout_of_an_invalid_branch_name_is_not_found(
    repository: TestRepository,
    #[case] branch_name: &str,
) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");

    let error = repository.checkout_branch(branch_name).unwrap_err();

    let error = domain_error(&error).expect("expected a domain error");
    assert!(matches!(error, CitError::BranchNotFound(name) if name == branch_name));
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(current_branch(&repository), "main");
}

#[rstest]
fn checkout_refuses_a_dirty_staging_area(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");
    repository.create_branch("feature").unwrap();
    repository.write("b.txt", "beta");
    repository.stage_path("b.txt").unwrap();

    let error = repository.checkout_branch("feature").unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::DirtyStagingArea)));
    assert_eq!(current_branch(&repository), "main");
}

#[rstest]
fn checkout_refuses_to_overwrite_local_changes(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha")], "Initial commit");
    repository.create_branch("feature").unwrap();
    repository.checkout_branch("feature").unwrap();
    repository.commit_files(&[("a.txt", "alpha feature")], "Feature work");
    repository.checkout_branch("main").unwrap();

    repository.write("a.txt", "local edit");
    let error = repository.checkout_branch("feature").unwrap_err();

    match domain_error(&error) {
        Some(CitError::CheckoutConflict(paths)) => {
            assert_eq!(paths, &vec![PathBuf::from("a.txt")])
        }
        other => panic!("expected a checkout conflict, got {other:?}"),
    }
    assert_eq!(current_branch(&repository), "main");
    assert_eq!(repository.read("a.txt"), "local edit");
}

#[rstest]
fn untouched_local_changes_are_carried_over(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha"), ("b.txt", "beta")], "Initial commit");
    repository.create_branch("feature").unwrap();
    repository.checkout_branch("feature").unwrap();
    repository.commit_files(&[("a.txt", "alpha feature")], "Feature work");
    repository.checkout_branch("main").unwrap();

    repository.write("b.txt", "local edit");
    repository.checkout_branch("feature").unwrap();

    assert_eq!(repository.read("a.txt"), "alpha feature");
    assert_eq!(repository.read("b.txt"), "local edit");
}
