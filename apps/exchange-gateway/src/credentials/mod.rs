// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Exchange API Credentials
//!
//! The upstream API authenticates every call with a public key (sent as a
//! header) and a private key (used only to compute the request HMAC).
//!
//! ## Sources
//!
//! Credentials are looked up through an ordered list of [`CredentialSource`]s,
//! first hit wins:
//!
//! 1. `CHANGELLY_API_CREDENTIALS` - base64 of `"<public>:<private>"`
//! 2. `CHANGELLY_PUBLIC_KEY` / `CHANGELLY_PRIVATE_KEY` in the process environment
//! 3. The same pair in the mounted secret store (`GATEWAY_SECRETS_DIR`)
//!
//! ## Validation
//!
//! Resolved values are rejected when they look like placeholders copied from
//! a template, or when they are shorter than the active [`CredentialPolicy`]
//! allows. A misconfigured deployment fails on the first call instead of
//! surfacing as an upstream 401.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

mod resolver;
mod store;
mod validation;

pub use resolver::{CredentialResolver, CredentialSource};
pub use store::{DirectorySecretStore, EnvSecretStore, SecretStore};
pub use validation::{placeholder_pattern, CredentialPolicy};

/// Combined base64 `"<public>:<private>"` secret name.
pub const COMBINED_SECRET_NAME: &str = "CHANGELLY_API_CREDENTIALS";
/// Public API key secret name.
pub const PUBLIC_KEY_NAME: &str = "CHANGELLY_PUBLIC_KEY";
/// Private signing key secret name.
pub const PRIVATE_KEY_NAME: &str = "CHANGELLY_PRIVATE_KEY";

/// One resolved API key pair.
pub struct Credentials {
    public_key: String,
    private_key: SecretString,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: SecretString::from(private_key.into()),
        }
    }

    /// Public API key, sent in the clear as the `api-key` header.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Raw bytes of the private key string, used as the HMAC key.
    pub fn private_key_bytes(&self) -> &[u8] {
        self.private_key.expose_secret().as_bytes()
    }

    pub(crate) fn private_key_str(&self) -> &str {
        self.private_key.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.public_key.chars().take(4).collect();
        f.debug_struct("Credentials")
            .field("public_key", &format_args!("{visible}…"))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Which half of the key pair a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    PublicKey,
    PrivateKey,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::PublicKey => write!(f, "public key"),
            CredentialField::PrivateKey => write!(f, "private key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("exchange API credentials are not configured (tried: {})", .tried.join(", "))]
    NotConfigured { tried: Vec<String> },

    #[error("exchange API {field} has an invalid format: {reason}")]
    InvalidFormat {
        field: CredentialField,
        reason: String,
    },

    #[error("exchange API {field} looks like a placeholder (matched `{pattern}`)")]
    PlaceholderDetected {
        field: CredentialField,
        pattern: &'static str,
    },
}

impl CredentialError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::NotConfigured { .. } => "credentials_not_configured",
            CredentialError::InvalidFormat { .. } => "credentials_invalid_format",
            CredentialError::PlaceholderDetected { .. } => "credentials_placeholder_detected",
        }
    }
}
