// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crypto-to-crypto swap endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ok, ApiJson};
use crate::{
    error::{ApiError, ErrorBody},
    gateway::{
        ApiResult, CreateTransactionParams, ExchangeAmountParams, Sourced, TransactionDescriptor,
        TransactionStatusDetails,
    },
    state::AppState,
};

/// Tradable currency tickers.
#[utoipa::path(
    get,
    path = "/v1/currencies",
    tag = "Exchange",
    responses(
        (status = 200, description = "Currency tickers", body = ApiResult<Sourced<Vec<String>>>),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn currencies(
    State(state): State<AppState>,
) -> Result<Json<ApiResult<Sourced<Vec<String>>>>, ApiError> {
    Ok(ok(state.gateway.get_currencies().await?))
}

#[utoipa::path(
    post,
    path = "/v1/exchange/amount",
    tag = "Exchange",
    request_body = ExchangeAmountParams,
    responses(
        (status = 200, description = "Estimated amount received", body = ApiResult<Sourced<String>>),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 422, description = "Upstream refused the pair or amount", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn exchange_amount(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<ExchangeAmountParams>,
) -> Result<Json<ApiResult<Sourced<String>>>, ApiError> {
    let estimate = state
        .gateway
        .get_exchange_amount(&params.from, &params.to, &params.amount)
        .await?;
    Ok(ok(estimate))
}

#[utoipa::path(
    post,
    path = "/v1/exchange/transactions",
    tag = "Exchange",
    request_body = CreateTransactionParams,
    responses(
        (status = 200, description = "Transaction created", body = ApiResult<TransactionDescriptor>),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 422, description = "Upstream refused the transaction", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<CreateTransactionParams>,
) -> Result<Json<ApiResult<TransactionDescriptor>>, ApiError> {
    Ok(ok(state.gateway.create_transaction(&params).await?))
}

#[utoipa::path(
    get,
    path = "/v1/exchange/transactions/{id}",
    tag = "Exchange",
    params(
        ("id" = String, Path, description = "Exchange transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction status", body = ApiResult<TransactionStatusDetails>),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResult<TransactionStatusDetails>>, ApiError> {
    Ok(ok(state.gateway.get_transaction_status(&id).await?))
}
