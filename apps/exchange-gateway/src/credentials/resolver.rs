// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered credential lookup.

use std::sync::Arc;

use base64::{
    engine::general_purpose::{GeneralPurpose, STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use tracing::{info, warn};

use super::{
    CredentialError, CredentialPolicy, Credentials, SecretStore, COMBINED_SECRET_NAME,
    PRIVATE_KEY_NAME, PUBLIC_KEY_NAME,
};

/// One place credentials may live.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// A single base64 secret decoding to `"<public>:<private>"`.
    Combined {
        store: Arc<dyn SecretStore>,
        name: String,
    },
    /// Two independently named secrets.
    Pair {
        store: Arc<dyn SecretStore>,
        public_name: String,
        private_name: String,
    },
}

impl CredentialSource {
    pub fn combined(store: Arc<dyn SecretStore>) -> Self {
        CredentialSource::Combined {
            store,
            name: COMBINED_SECRET_NAME.to_string(),
        }
    }

    pub fn pair(store: Arc<dyn SecretStore>) -> Self {
        CredentialSource::Pair {
            store,
            public_name: PUBLIC_KEY_NAME.to_string(),
            private_name: PRIVATE_KEY_NAME.to_string(),
        }
    }

    /// `store:NAME` description used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::Combined { store, name } => format!("{}:{name}", store.label()),
            CredentialSource::Pair {
                store,
                public_name,
                private_name,
            } => format!("{}:{public_name}+{private_name}", store.label()),
        }
    }

    async fn lookup(&self) -> Option<Credentials> {
        match self {
            CredentialSource::Combined { store, name } => {
                let raw = store.get(name).await?;
                let decoded = decode_combined(&raw);
                if decoded.is_none() {
                    warn!(
                        source = %self.describe(),
                        "Combined credential secret is not base64 \"<public>:<private>\", skipping"
                    );
                }
                decoded
            }
            CredentialSource::Pair {
                store,
                public_name,
                private_name,
            } => {
                let public_key = store.get(public_name).await;
                let private_key = store.get(private_name).await;
                match (public_key, private_key) {
                    (Some(public_key), Some(private_key)) => {
                        Some(Credentials::new(public_key, private_key))
                    }
                    (None, None) => None,
                    (public_key, _) => {
                        let missing = if public_key.is_none() {
                            public_name
                        } else {
                            private_name
                        };
                        warn!(
                            source = %self.describe(),
                            missing = %missing,
                            "Only one half of the credential pair is set, skipping"
                        );
                        None
                    }
                }
            }
        }
    }
}

/// Walks its sources in order and validates the first hit.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    sources: Vec<CredentialSource>,
    policy: CredentialPolicy,
}

impl CredentialResolver {
    pub fn new(policy: CredentialPolicy) -> Self {
        Self {
            sources: Vec::new(),
            policy,
        }
    }

    /// The deployment chain: combined secret and pair from the environment,
    /// then the pair from the secret store when one is mounted.
    pub fn standard(
        env: Arc<dyn SecretStore>,
        vault: Option<Arc<dyn SecretStore>>,
        policy: CredentialPolicy,
    ) -> Self {
        let mut resolver = Self::new(policy)
            .with_source(CredentialSource::combined(Arc::clone(&env)))
            .with_source(CredentialSource::pair(env));
        if let Some(vault) = vault {
            resolver = resolver.with_source(CredentialSource::pair(vault));
        }
        resolver
    }

    pub fn with_source(mut self, source: CredentialSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    pub async fn resolve(&self) -> Result<Credentials, CredentialError> {
        for source in &self.sources {
            let Some(credentials) = source.lookup().await else {
                continue;
            };

            if let Err(e) = self.policy.validate(&credentials) {
                warn!(source = %source.describe(), error = %e, "Rejected exchange API credentials");
                return Err(e);
            }

            info!(source = %source.describe(), "Resolved exchange API credentials");
            return Ok(credentials);
        }

        Err(CredentialError::NotConfigured {
            tried: self.sources.iter().map(CredentialSource::describe).collect(),
        })
    }
}

/// Alphabets a combined secret may be encoded with, padded or not.
const COMBINED_ENGINES: [GeneralPurpose; 4] = [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD];

/// Decode `base64("<public>:<private>")`, splitting on the first `:`.
fn decode_combined(raw: &str) -> Option<Credentials> {
    let raw = raw.trim();
    let bytes = COMBINED_ENGINES
        .iter()
        .find_map(|engine| engine.decode(raw).ok())?;
    let text = String::from_utf8(bytes).ok()?;
    let (public_key, private_key) = text.trim().split_once(':')?;
    if public_key.is_empty() || private_key.is_empty() {
        return None;
    }
    Some(Credentials::new(public_key, private_key))
}
