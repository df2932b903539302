// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(value_type = String)]
    pub status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// `ok` or `degraded`.
    #[schema(value_type = String)]
    pub status: &'static str,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyChecks {
    #[schema(value_type = String)]
    pub service: &'static str,
    /// `ok`, or the credential error code.
    #[schema(value_type = String)]
    pub credentials: &'static str,
    pub demo_fallback: bool,
}

/// Always 200 while the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// 200 once exchange API credentials resolve, 503 otherwise.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Credentials resolve", body = ReadyResponse),
        (status = 503, description = "Credentials missing or rejected", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let credentials = match state.gateway.check_credentials().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            e.code()
        }
    };
    let ready = credentials == "ok";

    let response = ReadyResponse {
        status: if ready { "ok" } else { "degraded" },
        checks: ReadyChecks {
            service: "ok",
            credentials,
            demo_fallback: state.gateway.demo_fallback(),
        },
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
