// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiat on-ramp endpoints: catalog listings, quotes and orders.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{ok, ApiJson};
use crate::{
    error::{ApiError, ErrorBody},
    fiat::{FiatProvider, PaymentMethod},
    gateway::{
        ApiResult, FiatOrder, FiatOrderParams, FiatOrderStatusDetails, FiatQuote, FiatQuoteParams,
        Sourced,
    },
    state::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuery {
    /// Only providers accepting this payment method.
    pub payment_method: Option<String>,
    #[serde(default)]
    pub include_unavailable: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PaymentMethodQuery {
    /// Only methods accepting this fiat currency.
    pub currency: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/fiat/providers",
    tag = "Fiat",
    params(ProviderQuery),
    responses(
        (status = 200, description = "Fiat providers", body = ApiResult<Vec<FiatProvider>>)
    )
)]
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> Json<ApiResult<Vec<FiatProvider>>> {
    let method = query.payment_method.as_deref().map(str::trim).filter(|m| !m.is_empty());
    let providers = state
        .gateway
        .catalog()
        .providers()
        .iter()
        .filter(|p| query.include_unavailable || p.available)
        .filter(|p| method.map_or(true, |m| p.supports(m)))
        .cloned()
        .collect();
    ok(providers)
}

#[utoipa::path(
    get,
    path = "/v1/fiat/payment-methods",
    tag = "Fiat",
    params(PaymentMethodQuery),
    responses(
        (status = 200, description = "Payment methods", body = ApiResult<Vec<PaymentMethod>>)
    )
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Query(query): Query<PaymentMethodQuery>,
) -> Json<ApiResult<Vec<PaymentMethod>>> {
    let currency = query.currency.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let methods = state
        .gateway
        .catalog()
        .payment_methods()
        .iter()
        .filter(|m| currency.map_or(true, |c| m.accepts_currency(c)))
        .cloned()
        .collect();
    ok(methods)
}

#[utoipa::path(
    post,
    path = "/v1/fiat/quote",
    tag = "Fiat",
    request_body = FiatQuoteParams,
    responses(
        (status = 200, description = "Quote with provider and fees", body = ApiResult<Sourced<FiatQuote>>),
        (status = 400, description = "Invalid parameters or no matching provider", body = ErrorBody),
        (status = 422, description = "Upstream refused the quote", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<FiatQuoteParams>,
) -> Result<Json<ApiResult<Sourced<FiatQuote>>>, ApiError> {
    Ok(ok(state.gateway.get_fiat_quote(&params).await?))
}

#[utoipa::path(
    post,
    path = "/v1/fiat/orders",
    tag = "Fiat",
    request_body = FiatOrderParams,
    responses(
        (status = 200, description = "Order created", body = ApiResult<FiatOrder>),
        (status = 400, description = "Invalid parameters or no matching provider", body = ErrorBody),
        (status = 422, description = "Upstream refused the order", body = ErrorBody),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<FiatOrderParams>,
) -> Result<Json<ApiResult<FiatOrder>>, ApiError> {
    Ok(ok(state.gateway.create_fiat_order(&params).await?))
}

#[utoipa::path(
    get,
    path = "/v1/fiat/orders/{order_id}",
    tag = "Fiat",
    params(
        ("order_id" = String, Path, description = "Fiat order ID")
    ),
    responses(
        (status = 200, description = "Order status", body = ApiResult<FiatOrderStatusDetails>),
        (status = 502, description = "Upstream rejected or unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResult<FiatOrderStatusDetails>>, ApiError> {
    Ok(ok(state.gateway.get_fiat_order_status(&order_id).await?))
}
