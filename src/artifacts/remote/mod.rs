//! Remotes and the push hand-off
//!
//! A remote is a named URL. Pushing packages the current branch into a typed
//! [`PushRequest`](push::PushRequest) and hands it to a [`PushTransport`](push::PushTransport);
//! the transport owns the wire format, authentication and retries.

use anyhow::bail;

pub mod push;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    name: String,
    url: String,
}

impl Remote {
    pub fn try_new(name: &str, url: &str) -> anyhow::Result<Self> {
        let name = name.trim();
        let url = url.trim();

        if name.is_empty() || name.contains(char::is_whitespace) {
            bail!("invalid remote name: '{name}'");
        }
        if url.is_empty() || url.contains(char::is_whitespace) {
            bail!("invalid remote url: '{url}'");
        }

        Ok(Remote {
            name: name.to_string(),
            url: url.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
