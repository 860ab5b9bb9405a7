#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use cit::artifacts::objects::commit::Author;
use cit::artifacts::objects::object::Object;
use cit::artifacts::objects::object_id::ObjectId;
use cit::{Repository, RepositoryConfig};
use rstest::fixture;
use std::ops::Deref;
use std::path::Path;

pub const AUTHOR_NAME: &str = "Ada Lovelace";
pub const AUTHOR_EMAIL: &str = "ada@example.com";
pub const AUTHOR_DATE: &str = "2024-03-01 12:00:00 +0000";

pub fn author() -> Author {
    let timestamp = chrono::DateTime::parse_from_str(AUTHOR_DATE, "%Y-%m-%d %H:%M:%S %z")
        .expect("Failed to parse the author date");

    Author::new_with_timestamp(AUTHOR_NAME.to_string(), AUTHOR_EMAIL.to_string(), timestamp)
}

pub fn config() -> RepositoryConfig {
    RepositoryConfig::default().with_author(author())
}

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A freshly initialized repository with a pinned author
pub struct TestRepository {
    pub dir: TempDir,
    pub repository: Repository,
}

impl Deref for TestRepository {
    type Target = Repository;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl TestRepository {
    pub fn write(&self, path: &str, content: &str) {
        let path = self.repository.path().join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.repository.path().join(path)).expect("Failed to read file")
    }

    pub fn exists(&self, path: &str) -> bool {
        self.repository.path().join(path).exists()
    }

    pub fn remove(&self, path: &str) {
        std::fs::remove_file(self.repository.path().join(path)).expect("Failed to remove file");
    }

    /// Write, stage and commit `files`, returning the new commit id
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> ObjectId {
        for (path, content) in files {
            self.write(path, content);
            self.repository
                .stage_path(path)
                .expect("Failed to stage file");
        }

        self.repository
            .commit(message)
            .expect("Failed to commit")
            .object_id()
            .expect("Failed to hash commit")
    }

    pub fn head(&self) -> Option<ObjectId> {
        self.repository.refs().read_head().expect("Failed to read HEAD")
    }
}

#[fixture]
pub fn repository(repository_dir: TempDir) -> TestRepository {
    let repository = Repository::init_with_config(repository_dir.path(), config())
        .expect("Failed to initialize repository");

    TestRepository {
        dir: repository_dir,
        repository,
    }
}

/// Build a `cit` invocation running inside `dir` with a pinned author
pub fn run_cit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("cit").expect("Failed to find the cit binary");
    cmd.current_dir(dir)
        .args(args)
        .env("CIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("CIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("CIT_AUTHOR_DATE", AUTHOR_DATE)
        .env("NO_COLOR", "1")
        .env_remove("CIT_LOG");

    cmd
}

pub fn cit_commit(dir: &Path, message: &str) -> Command {
    run_cit_command(dir, &["commit", "-m", message])
}
