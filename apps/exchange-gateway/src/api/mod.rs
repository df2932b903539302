// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP function surface
//!
//! JSON endpoints the website invokes. Every body is an
//! [`ApiResult`]: `{"ok": ...}` on success, `{"error": ...}` otherwise.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `GET /health` | liveness |
//! | `GET /ready` | credentials resolve |
//! | `GET /v1/currencies` | `get_currencies` |
//! | `POST /v1/exchange/amount` | `get_exchange_amount` |
//! | `POST /v1/exchange/transactions` | `create_transaction` |
//! | `GET /v1/exchange/transactions/{id}` | `get_transaction_status` |
//! | `GET /v1/fiat/providers` | provider listing |
//! | `GET /v1/fiat/payment-methods` | payment-method listing |
//! | `POST /v1/fiat/quote` | `get_fiat_quote` |
//! | `POST /v1/fiat/orders` | `create_fiat_order` |
//! | `GET /v1/fiat/orders/{order_id}` | `get_fiat_order_status` |
//! | `POST /v1/dex/quote` | `get_dex_quote` |
//! | `POST /v1/dex/swap` | `get_dex_swap_transaction` |
//! | `GET /v1/dex/tokens` | `get_dex_tokens` |
//! | `GET /v1/dex/chains` | `get_dex_chains` |
//!
//! The OpenAPI document is served at `/api-doc/openapi.json`, with Swagger UI
//! under `/docs`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest},
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorBody},
    fiat::{FeeBreakdown, FeeSpec, FiatProvider, PaymentMethod, PaymentMethodType},
    gateway::{
        ApiResult, CreateTransactionParams, DataSource, DexChain, DexQuote, DexQuoteParams,
        DexSwapParams, DexSwapTransaction, DexToken, ErrorDetail, ExchangeAmountParams, FiatOrder,
        FiatOrderParams, FiatOrderStatus, FiatOrderStatusDetails, FiatQuote, FiatQuoteParams,
        TransactionDescriptor, TransactionStatus, TransactionStatusDetails,
    },
    state::AppState,
};

pub mod dex;
pub mod exchange;
pub mod fiat;
pub mod health;

/// `Json` extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    }
}

pub(crate) fn ok<T>(value: T) -> Json<ApiResult<T>> {
    Json(ApiResult::Ok(value))
}

async fn not_found() -> ApiError {
    ApiError::not_found("no such endpoint")
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/currencies", get(exchange::currencies))
        .route("/exchange/amount", post(exchange::exchange_amount))
        .route("/exchange/transactions", post(exchange::create_transaction))
        .route("/exchange/transactions/{id}", get(exchange::transaction_status))
        .route("/fiat/providers", get(fiat::list_providers))
        .route("/fiat/payment-methods", get(fiat::list_payment_methods))
        .route("/fiat/quote", post(fiat::quote))
        .route("/fiat/orders", post(fiat::create_order))
        .route("/fiat/orders/{order_id}", get(fiat::order_status))
        .route("/dex/quote", post(dex::quote))
        .route("/dex/swap", post(dex::swap_transaction))
        .route("/dex/tokens", get(dex::tokens))
        .route("/dex/chains", get(dex::chains));

    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .fallback(not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "http",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        exchange::currencies,
        exchange::exchange_amount,
        exchange::create_transaction,
        exchange::transaction_status,
        fiat::list_providers,
        fiat::list_payment_methods,
        fiat::quote,
        fiat::create_order,
        fiat::order_status,
        dex::quote,
        dex::swap_transaction,
        dex::tokens,
        dex::chains
    ),
    components(
        schemas(
            ErrorBody,
            ErrorDetail,
            DataSource,
            ExchangeAmountParams,
            CreateTransactionParams,
            TransactionDescriptor,
            TransactionStatus,
            TransactionStatusDetails,
            FiatProvider,
            FeeSpec,
            PaymentMethod,
            PaymentMethodType,
            FeeBreakdown,
            FiatQuoteParams,
            FiatQuote,
            FiatOrderParams,
            FiatOrder,
            FiatOrderStatus,
            FiatOrderStatusDetails,
            DexQuoteParams,
            DexQuote,
            DexSwapParams,
            DexSwapTransaction,
            DexToken,
            DexChain
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Exchange", description = "Crypto-to-crypto swaps"),
        (name = "Fiat", description = "Fiat on-ramp providers, quotes and orders"),
        (name = "Dex", description = "DEX aggregator quotes and swap transactions")
    )
)]
pub struct ApiDoc;
