// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DEX aggregator endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{ok, ApiJson};
use crate::{
    error::{ApiError, ErrorBody},
    gateway::{
        ApiResult, DexChain, DexQuote, DexQuoteParams, DexSwapParams, DexSwapTransaction, DexToken,
        Sourced,
    },
    state::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    pub chain_id: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/v1/dex/quote",
    tag = "Dex",
    request_body = DexQuoteParams,
    responses(
        (status = 200, description = "Swap quote", body = ApiResult<Sourced<DexQuote>>),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 422, description = "Upstream refused the quote", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<DexQuoteParams>,
) -> Result<Json<ApiResult<Sourced<DexQuote>>>, ApiError> {
    Ok(ok(state.gateway.get_dex_quote(&params).await?))
}

/// Unsigned transaction; the caller's wallet signs and broadcasts it.
#[utoipa::path(
    post,
    path = "/v1/dex/swap",
    tag = "Dex",
    request_body = DexSwapParams,
    responses(
        (status = 200, description = "Unsigned swap transaction", body = ApiResult<DexSwapTransaction>),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 422, description = "Upstream refused the swap", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn swap_transaction(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<DexSwapParams>,
) -> Result<Json<ApiResult<DexSwapTransaction>>, ApiError> {
    Ok(ok(state.gateway.get_dex_swap_transaction(&params).await?))
}

#[utoipa::path(
    get,
    path = "/v1/dex/tokens",
    tag = "Dex",
    params(TokenQuery),
    responses(
        (status = 200, description = "Tradable tokens", body = ApiResult<Sourced<Vec<DexToken>>>),
        (status = 400, description = "Invalid chain id", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn tokens(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ApiResult<Sourced<Vec<DexToken>>>>, ApiError> {
    Ok(ok(state.gateway.get_dex_tokens(query.chain_id).await?))
}

#[utoipa::path(
    get,
    path = "/v1/dex/chains",
    tag = "Dex",
    responses(
        (status = 200, description = "Supported chains", body = ApiResult<Sourced<Vec<DexChain>>>),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn chains(
    State(state): State<AppState>,
) -> Result<Json<ApiResult<Sourced<Vec<DexChain>>>>, ApiError> {
    Ok(ok(state.gateway.get_dex_chains().await?))
}
