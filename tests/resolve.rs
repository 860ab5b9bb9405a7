use cit::artifacts::merge::conflict::ResolutionStrategy;
use cit::errors::{CitError, domain_error};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

mod common;
use common::{repository, TestRepository};

const CONFLICTED: &str = "header\n\
<<<<<<< HEAD (main)\n\
our line 1\n\
our line 2\n\
=======\n\
their line\n\
>>>>>>> feature\n\
footer\n";

#[rstest]
#[case::ours(ResolutionStrategy::Ours, "header\nour line 1\nour line 2\nfooter\n")]
#[case::theirs(ResolutionStrategy::Theirs, "header\ntheir line\nfooter\n")]
#[case::both(
    ResolutionStrategy::Both,
    "header\nour line 1\nour line 2\ntheir line\nfooter\n"
)]
fn resolve_conflict_rewrites_the_working_file(
    repository: TestRepository,
    #[case] strategy: ResolutionStrategy,
    #[case] expected: &str,
) {
    repository.write("notes.txt", CONFLICTED);

    repository.resolve_conflict("notes.txt", strategy).unwrap();

    assert_eq!(repository.read("notes.txt"), expected);
    assert!(repository.index_mut().is_empty());
}

#[rstest]
#[case("ours", ResolutionStrategy::Ours)]
#[case("THEIRS", ResolutionStrategy::Theirs)]
#[case(" both ", ResolutionStrategy::Both)]
fn strategies_parse_case_insensitively(#[case] input: &str, #[case] expected: ResolutionStrategy) {
    assert_eq!(input.parse::<ResolutionStrategy>().unwrap(), expected);
}

#[rstest]
fn unknown_strategy_is_unsupported() {
    let error = "mine".parse::<ResolutionStrategy>().unwrap_err();

    assert!(matches!(error, CitError::UnsupportedStrategy(_)));
}

#[rstest]
fn resolving_a_missing_file_fails(repository: TestRepository) {
    let error = repository
        .resolve_conflict("missing.txt", ResolutionStrategy::Ours)
        .unwrap_err();

    assert!(matches!(domain_error(&error), Some(CitError::FileNotFound(_))));
}

#[rstest]
fn conflict_status_lists_marked_files(repository: TestRepository) {
    repository.commit_files(
        &[
            ("clean.txt", "nothing to see\n"),
            ("b/conflicted.txt", CONFLICTED),
            ("a.txt", ">>>>>>> stray closing marker\n"),
        ],
        "Tracked files",
    );
    repository.write(".hidden", CONFLICTED);

    let conflicts = repository.conflict_status().unwrap();

    assert_eq!(
        conflicts,
        vec![PathBuf::from("a.txt"), PathBuf::from("b/conflicted.txt")]
    );

    repository
        .resolve_conflict("b/conflicted.txt", ResolutionStrategy::Both)
        .unwrap();
    assert_eq!(repository.conflict_status().unwrap(), vec![PathBuf::from("a.txt")]);
}

#[rstest]
fn conflict_status_ignores_untracked_files(repository: TestRepository) {
    repository.commit_files(&[("a.txt", "alpha\n")], "Initial commit");
    repository.write("notes.md", "Title\n=======\n\nbody\n");

    assert!(repository.conflict_status().unwrap().is_empty());

    repository.stage_path("notes.md").unwrap();
    assert_eq!(repository.conflict_status().unwrap(), vec![PathBuf::from("notes.md")]);
}

/// `main` and `feature` both rewrite `f.txt`, without a trailing newline, after `base`
fn conflicting_merge(repository: &TestRepository) {
    repository.commit_files(&[("f.txt", "0")], "base");
    repository.create_branch("feature").unwrap();
    repository.commit_files(&[("f.txt", "1")], "main work");
    repository.checkout_branch("feature").unwrap();
    repository.commit_files(&[("f.txt", "2")], "feature work");
    repository.checkout_branch("main").unwrap();

    let result = repository.merge("feature").unwrap();
    assert!(!result.success);
    assert_eq!(result.conflicts, vec![PathBuf::from("f.txt")]);
}

#[rstest]
#[case::ours(ResolutionStrategy::Ours, "1")]
#[case::theirs(ResolutionStrategy::Theirs, "2")]
#[case::both(ResolutionStrategy::Both, "1\n2")]
fn resolution_restores_content_without_trailing_newline(
    repository: TestRepository,
    #[case] strategy: ResolutionStrategy,
    #[case] expected: &str,
) {
    conflicting_merge(&repository);

    repository.resolve_conflict("f.txt", strategy).unwrap();

    assert_eq!(repository.read("f.txt"), expected);
    assert!(repository.conflict_status().unwrap().is_empty());
}

#[rstest]
fn resolving_ours_leaves_the_file_unmodified(repository: TestRepository) {
    conflicting_merge(&repository);
    assert_eq!(repository.conflict_status().unwrap(), vec![PathBuf::from("f.txt")]);

    repository.resolve_conflict("f.txt", ResolutionStrategy::Ours).unwrap();

    let status = repository.status().unwrap();
    assert!(status.modified.is_empty());
    assert_eq!(status.merging.map(|branch| branch.to_string()), Some("feature".to_string()));
}
