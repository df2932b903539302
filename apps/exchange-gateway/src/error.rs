// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    gateway::{ErrorDetail, GatewayError},
    rpc::ErrorKind,
};

/// Body of every failed request: the `error` arm of the result envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// HTTP-surface error: a status plus the `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: ErrorDetail,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            detail: ErrorDetail {
                kind,
                message: message.into(),
                http_status: None,
                raw_body: None,
                upstream_code: None,
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

/// Status a transport failure surfaces as.
fn transport_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ApplicationError | ErrorKind::BadRequest => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::AuthRejected
        | ErrorKind::Forbidden
        | ErrorKind::NetworkError
        | ErrorKind::UpstreamServerError
        | ErrorKind::UnexpectedStatus
        | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Credentials(_) | GatewayError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Transport(e) => transport_status(e.kind),
        };
        Self {
            status,
            detail: err.detail(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.detail })).into_response()
    }
}
