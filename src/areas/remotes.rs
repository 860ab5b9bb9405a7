//! Remote repository registry
//!
//! Stored in `.cit/remotes`, one `<name> <url>` pair per line, sorted by name.

use crate::artifacts::remote::Remote;
use crate::errors::CitError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

pub const REMOTES_FILE_NAME: &str = "remotes";

#[derive(Debug)]
pub struct Remotes {
    /// Path to the remotes file (typically `.cit/remotes`)
    path: Box<Path>,
}

impl Remotes {
    pub fn new(path: Box<Path>) -> Self {
        Remotes { path }
    }

    pub fn add(&self, name: &str, url: &str) -> anyhow::Result<Remote> {
        let remote = Remote::try_new(name, url)?;
        let mut remotes = self.load()?;

        if remotes.contains_key(remote.name()) {
            return Err(CitError::RemoteExists(name.to_string()).into());
        }

        remotes.insert(remote.name().to_string(), remote.clone());
        self.save(&remotes)?;

        Ok(remote)
    }

    pub fn list(&self) -> anyhow::Result<Vec<Remote>> {
        Ok(self.load()?.into_values().collect())
    }

    pub fn get(&self, name: &str) -> anyhow::Result<Remote> {
        self.load()?
            .remove(name)
            .ok_or_else(|| CitError::RemoteNotFound(name.to_string()).into())
    }

    pub fn remove(&self, name: &str) -> anyhow::Result<Remote> {
        let mut remotes = self.load()?;
        let remote = remotes
            .remove(name)
            .ok_or_else(|| CitError::RemoteNotFound(name.to_string()))?;

        self.save(&remotes)?;
        Ok(remote)
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, Remote>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read remotes file at {:?}", self.path))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| -> anyhow::Result<(String, Remote)> {
                let (name, url) = line
                    .split_once(' ')
                    .with_context(|| format!("malformed remote entry: {line}"))?;
                let remote = Remote::try_new(name, url)?;
                Ok((remote.name().to_string(), remote))
            })
            .collect()
    }

    fn save(&self, remotes: &BTreeMap<String, Remote>) -> anyhow::Result<()> {
        let content = remotes
            .values()
            .map(|remote| format!("{} {}\n", remote.name(), remote.url()))
            .collect::<String>();

        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write remotes file at {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::domain_error;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn remotes(dir: &TempDir) -> Remotes {
        Remotes::new(dir.path().join(REMOTES_FILE_NAME).into_boxed_path())
    }

    #[test]
    fn test_remotes_are_listed_by_name() {
        let dir = TempDir::new().unwrap();
        let remotes = remotes(&dir);
        remotes.add("upstream", "https://example.com/up.git").unwrap();
        remotes.add("origin", "https://example.com/me.git").unwrap();

        let names = remotes
            .list()
            .unwrap()
            .into_iter()
            .map(|remote| remote.name().to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["origin", "upstream"]);
    }

    #[test]
    fn test_duplicate_remote_is_rejected() {
        let dir = TempDir::new().unwrap();
        let remotes = remotes(&dir);
        remotes.add("origin", "https://example.com/a.git").unwrap();

        let error = remotes.add("origin", "https://example.com/b.git").unwrap_err();

        assert!(matches!(domain_error(&error), Some(CitError::RemoteExists(_))));
        assert_eq!(
            remotes.get("origin").unwrap().url(),
            "https://example.com/a.git"
        );
    }

    #[test]
    fn test_removing_unknown_remote_fails() {
        let dir = TempDir::new().unwrap();

        let error = remotes(&dir).remove("origin").unwrap_err();

        assert!(matches!(
            domain_error(&error),
            Some(CitError::RemoteNotFound(_))
        ));
    }
}
