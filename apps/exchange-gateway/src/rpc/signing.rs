// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC-SHA512 request signing.
//!
//! The upstream recomputes the HMAC over the raw POST body it receives, so
//! the body is serialized exactly once here and [`SignedRequest`] carries
//! those bytes to the transport unchanged.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use super::envelope::RequestEnvelope;
use crate::credentials::Credentials;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("failed to serialize request envelope: {0}")]
    Serialize(String),

    #[error("signing key was rejected: {0}")]
    InvalidKey(String),
}

/// An envelope together with the exact body bytes that were signed.
///
/// Fields are private: the only way to get one is [`sign`], so a signature
/// can never drift from its body.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    envelope: RequestEnvelope,
    body: String,
    api_key: String,
    signature: String,
}

impl SignedRequest {
    pub fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    /// Serialized envelope; transmitted verbatim as the POST body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Lowercase hex HMAC-SHA512 of [`Self::body`].
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Serialize `envelope` and sign the resulting bytes.
pub fn sign(envelope: RequestEnvelope, credentials: &Credentials) -> Result<SignedRequest, SignError> {
    let body =
        serde_json::to_string(&envelope).map_err(|e| SignError::Serialize(e.to_string()))?;
    let signature = hmac_sha512_hex(credentials.private_key_bytes(), body.as_bytes())?;

    Ok(SignedRequest {
        envelope,
        body,
        api_key: credentials.public_key().to_string(),
        signature,
    })
}

/// Lowercase hex HMAC-SHA512 of `message`, keyed with the raw `key` bytes.
pub fn hmac_sha512_hex(key: &[u8], message: &[u8]) -> Result<String, SignError> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
