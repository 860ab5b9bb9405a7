use crate::areas::repository::Repository;
use crate::artifacts::remote::Remote;

impl Repository {
    pub fn add_remote(&self, name: &str, url: &str) -> anyhow::Result<Remote> {
        let _lock = self.lock()?;
        let remote = self.remotes().add(name, url)?;

        tracing::info!(remote = remote.name(), url = remote.url(), "added remote");
        Ok(remote)
    }

    /// Every configured remote, sorted by name
    pub fn list_remotes(&self) -> anyhow::Result<Vec<Remote>> {
        self.remotes().list()
    }

    pub fn remove_remote(&self, name: &str) -> anyhow::Result<Remote> {
        let _lock = self.lock()?;
        let remote = self.remotes().remove(name)?;

        tracing::info!(remote = remote.name(), "removed remote");
        Ok(remote)
    }
}
