// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential shape checks.

use super::{CredentialError, CredentialField, Credentials};

/// Substrings that mark a value as copied from a template rather than issued
/// by the upstream. Matched case-insensitively.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your_",
    "placeholder",
    "example",
    "test_key",
    "sample",
    "demo_",
    "fake_",
    "changelly_key",
    "changelly_api_key",
    "changelly_public_key",
    "changelly_private_key",
    "changelly_secret_key",
];

/// Minimum key lengths, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub min_public_len: usize,
    pub min_private_len: usize,
}

impl CredentialPolicy {
    /// Lowest bar accepted from any source.
    pub const BASELINE: Self = Self {
        min_public_len: 8,
        min_private_len: 16,
    };

    /// Façade default: real upstream keys are well above 20 characters.
    pub const STRICT: Self = Self {
        min_public_len: 20,
        min_private_len: 20,
    };

    pub fn validate(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let fields = [
            (CredentialField::PublicKey, credentials.public_key(), self.min_public_len),
            (
                CredentialField::PrivateKey,
                credentials.private_key_str(),
                self.min_private_len,
            ),
        ];

        for (field, value, _) in fields {
            if let Some(pattern) = placeholder_pattern(value) {
                return Err(CredentialError::PlaceholderDetected { field, pattern });
            }
        }

        for (field, value, min_len) in fields {
            if value.trim().is_empty() {
                return Err(CredentialError::InvalidFormat {
                    field,
                    reason: "value is empty".to_string(),
                });
            }
            let len = value.chars().count();
            if len < min_len {
                return Err(CredentialError::InvalidFormat {
                    field,
                    reason: format!("expected at least {min_len} characters, got {len}"),
                });
            }
        }

        Ok(())
    }
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self::STRICT
    }
}

/// First placeholder pattern contained in `value`, if any.
pub fn placeholder_pattern(value: &str) -> Option<&'static str> {
    let lowered = value.to_lowercase();
    PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}
