// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Façade error and its wire form.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    credentials::CredentialError,
    rpc::{ErrorKind, SignError, TransportError},
};

/// A request parameter the gateway refuses before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Signing(#[from] SignError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl GatewayError {
    /// Upstream failure class, when the error came from the transport.
    pub fn transport_kind(&self) -> Option<ErrorKind> {
        match self {
            GatewayError::Transport(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Credentials(e) => e.code(),
            GatewayError::Signing(_) => "signing_failed",
            GatewayError::Transport(e) => e.kind.code(),
            GatewayError::Validation(_) => "validation_error",
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let mut detail = ErrorDetail {
            kind: self.code(),
            message: self.to_string(),
            http_status: None,
            raw_body: None,
            upstream_code: None,
        };
        if let GatewayError::Transport(e) = self {
            detail.http_status = e.http_status;
            detail.raw_body = e.raw_body.clone();
            detail.upstream_code = e.upstream_code;
        }
        detail
    }
}

/// Error payload returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Stable code such as `validation_error` or `auth_rejected`.
    #[schema(value_type = String)]
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_code: Option<i64>,
}

/// `{"ok": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApiResult<T> {
    Ok(T),
    Error(ErrorDetail),
}

impl<T> From<Result<T, GatewayError>> for ApiResult<T> {
    fn from(result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(value) => ApiResult::Ok(value),
            Err(e) => ApiResult::Error(e.detail()),
        }
    }
}
