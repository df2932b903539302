// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secret stores the credential resolver reads from.

use std::{fmt, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::config::env_optional;

/// Read-only named secret lookup.
///
/// Implementations return `None` for missing or blank secrets; lookup
/// failures are logged and reported as missing so the resolver can move on
/// to the next source.
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// Short name used in logs and `NotConfigured` errors.
    fn label(&self) -> &str;

    async fn get(&self, name: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    fn label(&self) -> &str {
        "env"
    }

    async fn get(&self, name: &str) -> Option<String> {
        env_optional(name)
    }
}

/// Directory with one file per secret, as mounted by a vault agent or an
/// orchestrator (`/run/secrets/<NAME>`).
#[derive(Debug, Clone)]
pub struct DirectorySecretStore {
    root: PathBuf,
}

impl DirectorySecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SecretStore for DirectorySecretStore {
    fn label(&self) -> &str {
        "vault"
    }

    async fn get(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            warn!(secret = %name, "Refusing to read secret with a path-like name");
            return None;
        }

        let path = self.root.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    secret = %name,
                    path = %path.display(),
                    error = %e,
                    "Failed to read secret file"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn directory_store_reads_trimmed_file_contents() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("CHANGELLY_PUBLIC_KEY"), "abc123\n").unwrap();
        std::fs::write(dir.path().join("EMPTY"), "  \n").unwrap();

        let store = DirectorySecretStore::new(dir.path());
        assert_eq!(store.get("CHANGELLY_PUBLIC_KEY").await.as_deref(), Some("abc123"));
        assert_eq!(store.get("EMPTY").await, None);
        assert_eq!(store.get("MISSING").await, None);
    }

    #[tokio::test]
    async fn directory_store_rejects_path_traversal() {
        let dir = TempDir::new().expect("temp dir");
        let store = DirectorySecretStore::new(dir.path().join("secrets"));
        assert_eq!(store.get("../etc/passwd").await, None);
        assert_eq!(store.get(".hidden").await, None);
    }
}
