// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gateway Façade
//!
//! Public operation set of the exchange gateway. Every operation validates
//! its parameters, resolves credentials (once per process), signs a JSON-RPC
//! envelope, sends it to the matching upstream endpoint, and maps the result
//! into a typed value.
//!
//! | Operation | Upstream method | Endpoint |
//! |-----------|-----------------|----------|
//! | [`Gateway::get_currencies`] | `getCurrencies` | swap |
//! | [`Gateway::get_exchange_amount`] | `getExchangeAmount` | swap |
//! | [`Gateway::create_transaction`] | `createTransaction` | swap |
//! | [`Gateway::get_transaction_status`] | `getStatus` | swap |
//! | [`Gateway::get_fiat_quote`] | `getFiatQuote` | fiat |
//! | [`Gateway::create_fiat_order`] | `createFiatOrder` | fiat |
//! | [`Gateway::get_fiat_order_status`] | `getFiatOrderStatus` | fiat |
//! | [`Gateway::get_dex_quote`] | `getDexQuote` | dex |
//! | [`Gateway::get_dex_swap_transaction`] | `getDexSwapTransaction` | dex |
//! | [`Gateway::get_dex_tokens`] | `getDexTokens` | dex |
//! | [`Gateway::get_dex_chains`] | `getDexChains` | dex |
//!
//! ## Demo fallback
//!
//! When enabled, the read-only operations returning [`Sourced`] values
//! substitute labeled demo data if the upstream is unavailable (timeout,
//! network failure, 5xx). Anything that creates a transaction or an order
//! never falls back.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use url::Url;

use crate::{
    config::{ConfigError, Endpoints, GatewayConfig},
    credentials::{
        CredentialPolicy, CredentialResolver, Credentials, DirectorySecretStore, EnvSecretStore,
        SecretStore,
    },
    fiat::{compute_fees, select_provider, FeeBreakdown, FiatCatalog, FiatProvider},
    rpc::{sign, ApiTransport, RequestEnvelope, TransportError},
};

mod demo;
mod error;
mod types;
mod validate;

pub use error::{ApiResult, ErrorDetail, GatewayError, ValidationError};
pub use types::{
    map_fiat_order_status, map_transaction_status, CreateTransactionParams, DataSource, DexChain,
    DexQuote, DexQuoteParams, DexSwapParams, DexSwapTransaction, DexToken, ExchangeAmountParams,
    FiatOrder, FiatOrderParams, FiatOrderStatus, FiatOrderStatusDetails, FiatQuote,
    FiatQuoteParams, Sourced, TransactionDescriptor, TransactionStatus, TransactionStatusDetails,
};

use types::{first_entry, list_under, scalar_text, text};

/// Payment method assumed when a fiat request names none.
pub const DEFAULT_PAYMENT_METHOD: &str = "card";

/// Provider, method and fees agreed for one fiat request.
struct FiatTerms<'a> {
    from: String,
    to: String,
    amount: Decimal,
    provider: &'a FiatProvider,
    payment_method: String,
    fees: FeeBreakdown,
}

impl FiatTerms<'_> {
    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("currencyFrom".into(), json!(self.from));
        params.insert("currencyTo".into(), json!(self.to));
        params.insert("amountFrom".into(), json!(self.amount.to_string()));
        params.insert("providerCode".into(), json!(self.provider.id));
        params.insert("paymentMethod".into(), json!(self.payment_method));
        params
    }
}

pub struct Gateway {
    endpoints: Endpoints,
    resolver: CredentialResolver,
    credentials: OnceCell<Credentials>,
    transport: ApiTransport,
    catalog: Arc<FiatCatalog>,
    demo_fallback: bool,
}

impl Gateway {
    pub fn new(
        endpoints: Endpoints,
        resolver: CredentialResolver,
        transport: ApiTransport,
        catalog: Arc<FiatCatalog>,
    ) -> Self {
        Self {
            endpoints,
            resolver,
            credentials: OnceCell::new(),
            transport,
            catalog,
            demo_fallback: false,
        }
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Wire the gateway from startup configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let policy = if config.strict_credentials {
            CredentialPolicy::STRICT
        } else {
            CredentialPolicy::BASELINE
        };
        let vault = config
            .secrets_dir
            .as_ref()
            .map(|dir| Arc::new(DirectorySecretStore::new(dir)) as Arc<dyn SecretStore>);
        let resolver = CredentialResolver::standard(Arc::new(EnvSecretStore), vault, policy);

        let catalog = match &config.fiat_catalog_path {
            Some(path) => FiatCatalog::load(path)?,
            None => FiatCatalog::builtin(),
        };
        let transport = ApiTransport::new(config.request_timeout)?;

        info!(
            swap = %config.endpoints.swap,
            fiat = %config.endpoints.fiat,
            dex = %config.endpoints.dex,
            sources = resolver.sources().len(),
            providers = catalog.providers().len(),
            demo_fallback = config.demo_fallback,
            "Exchange gateway configured"
        );

        Ok(Self::new(config.endpoints.clone(), resolver, transport, Arc::new(catalog))
            .with_demo_fallback(config.demo_fallback))
    }

    pub fn catalog(&self) -> &FiatCatalog {
        &self.catalog
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    /// Resolve credentials without calling the upstream (readiness probe).
    pub async fn check_credentials(&self) -> Result<(), GatewayError> {
        self.credentials().await.map(|_| ())
    }

    /// Credentials resolve once; concurrent first callers share the same
    /// resolution. Failures are not cached.
    async fn credentials(&self) -> Result<&Credentials, GatewayError> {
        Ok(self
            .credentials
            .get_or_try_init(|| self.resolver.resolve())
            .await?)
    }

    async fn call(&self, endpoint: &Url, method: &str, params: Value) -> Result<Value, GatewayError> {
        let credentials = self.credentials().await?;
        let signed = sign(RequestEnvelope::new(method, params), credentials)?;
        Ok(self.transport.send(&signed, endpoint).await?)
    }

    /// Wrap a read-only result, substituting demo data when allowed.
    fn degrade<T>(
        &self,
        operation: &'static str,
        result: Result<T, GatewayError>,
        demo: impl FnOnce() -> Option<T>,
    ) -> Result<Sourced<T>, GatewayError> {
        match result {
            Ok(data) => Ok(Sourced::live(data)),
            Err(GatewayError::Transport(e)) if self.demo_fallback && e.kind.is_unavailability() => {
                let Some(data) = demo() else {
                    warn!(operation, kind = e.kind.code(), error = %e, "Upstream unavailable and no demo data applies");
                    return Err(e.into());
                };
                warn!(operation, kind = e.kind.code(), error = %e, "Upstream unavailable, serving demo data");
                Ok(Sourced::demo(
                    data,
                    format!(
                        "live {operation} data is unavailable ({}); showing demo values",
                        e.kind.code()
                    ),
                ))
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Crypto swaps
    // =========================================================================

    pub async fn get_currencies(&self) -> Result<Sourced<Vec<String>>, GatewayError> {
        let result = self
            .call(&self.endpoints.swap, "getCurrencies", json!({}))
            .await
            .and_then(|value| Ok(parse_currencies(&value)?));
        self.degrade("currencies", result, || Some(demo::currencies()))
    }

    /// Estimated amount of `to` received for `amount` of `from`.
    pub async fn get_exchange_amount(
        &self,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<Sourced<String>, GatewayError> {
        let from = validate::symbol("from", from)?;
        let to = validate::symbol("to", to)?;
        let amount = validate::positive_amount("amount", amount)?;

        let params = json!({ "from": from, "to": to, "amount": amount.to_string() });
        let result = self
            .call(&self.endpoints.swap, "getExchangeAmount", params)
            .await
            .and_then(|value| {
                let entry = first_entry(&value);
                let estimate = scalar_text(entry)
                    .or_else(|| text(entry, &["result", "amountTo", "amount"]))
                    .ok_or_else(|| {
                        TransportError::malformed("exchange amount result has no amount", &value)
                    })?;
                Ok(estimate)
            });
        self.degrade("exchange amount", result, || {
            demo::exchange_amount(&from, &to, amount)
        })
    }

    pub async fn create_transaction(
        &self,
        params: &CreateTransactionParams,
    ) -> Result<TransactionDescriptor, GatewayError> {
        let from = validate::symbol("from", &params.from)?;
        let to = validate::symbol("to", &params.to)?;
        let amount = validate::positive_amount("amount", &params.amount)?;
        let address = validate::required("payoutAddress", &params.payout_address)?;

        let mut upstream = Map::new();
        upstream.insert("from".into(), json!(from));
        upstream.insert("to".into(), json!(to));
        upstream.insert("amount".into(), json!(amount.to_string()));
        upstream.insert("address".into(), json!(address));
        if let Some(extra_id) = validate::optional(params.payout_extra_id.as_deref()) {
            upstream.insert("extraId".into(), json!(extra_id));
        }
        if let Some(refund) = validate::optional(params.refund_address.as_deref()) {
            upstream.insert("refundAddress".into(), json!(refund));
        }

        let value = self
            .call(&self.endpoints.swap, "createTransaction", Value::Object(upstream))
            .await?;
        let transaction = TransactionDescriptor::from_upstream(&value)?;
        info!(
            transaction_id = %transaction.id,
            from = %from,
            to = %to,
            "Created exchange transaction"
        );
        Ok(transaction)
    }

    pub async fn get_transaction_status(&self, id: &str) -> Result<TransactionStatusDetails, GatewayError> {
        let id = validate::required("id", id)?;
        let value = self
            .call(&self.endpoints.swap, "getStatus", json!({ "id": id }))
            .await?;
        let raw_status = scalar_text(&value)
            .or_else(|| text(first_entry(&value), &["status"]))
            .ok_or_else(|| TransportError::malformed("status result has no status", &value))?;

        Ok(TransactionStatusDetails {
            id: id.to_string(),
            status: map_transaction_status(&raw_status),
            raw_status,
        })
    }

    // =========================================================================
    // Fiat on-ramp
    // =========================================================================

    fn fiat_terms(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        provider: Option<&str>,
        payment_method: Option<&str>,
    ) -> Result<FiatTerms<'_>, ValidationError> {
        let from = validate::required("from", from)?.to_uppercase();
        let to = validate::symbol("to", to)?;
        let amount = validate::positive_amount("amount", amount)?;
        let payment_method = validate::optional(payment_method)
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
            .to_string();

        let provider = match validate::optional(provider) {
            Some(id) => {
                let provider = self
                    .catalog
                    .provider(id)
                    .ok_or_else(|| ValidationError::new("provider", format!("unknown provider `{id}`")))?;
                if !provider.available {
                    return Err(ValidationError::new(
                        "provider",
                        format!("provider `{}` is currently unavailable", provider.id),
                    ));
                }
                if !provider.supports(&payment_method) {
                    return Err(ValidationError::new(
                        "paymentMethod",
                        format!("provider `{}` does not accept `{payment_method}`", provider.id),
                    ));
                }
                provider
            }
            None => select_provider(&self.catalog, &payment_method, amount).ok_or_else(|| {
                ValidationError::new(
                    "paymentMethod",
                    format!("no available provider supports `{payment_method}`"),
                )
            })?,
        };

        let fees = compute_fees(amount, Some(provider), &payment_method)
            .ok_or_else(|| ValidationError::new("amount", "too large to price"))?;
        Ok(FiatTerms {
            from,
            to,
            amount,
            provider,
            payment_method,
            fees,
        })
    }

    pub async fn get_fiat_quote(&self, params: &FiatQuoteParams) -> Result<Sourced<FiatQuote>, GatewayError> {
        let terms = self.fiat_terms(
            &params.from,
            &params.to,
            &params.amount,
            params.provider.as_deref(),
            params.payment_method.as_deref(),
        )?;

        let quote = |amount_to: Option<String>, rate: Option<String>| FiatQuote {
            from: terms.from.clone(),
            to: terms.to.clone(),
            amount: terms.amount,
            provider_id: terms.provider.id.clone(),
            provider_name: terms.provider.name.clone(),
            payment_method: terms.payment_method.clone(),
            amount_to,
            rate,
            fees: terms.fees,
            kyc_required: terms.amount > terms.provider.non_kyc_limit,
        };

        let result = self
            .call(&self.endpoints.fiat, "getFiatQuote", Value::Object(terms.params()))
            .await
            .map(|value| {
                let entry = first_entry(&value);
                quote(
                    text(entry, &["amountTo", "amountExpectedTo"]),
                    text(entry, &["rate"]),
                )
            });
        self.degrade("fiat quote", result, || {
            let amount_to = demo::convert(&terms.from, &terms.to, terms.amount)?;
            let rate = demo::convert(&terms.from, &terms.to, Decimal::ONE)?;
            Some(quote(Some(amount_to.to_string()), Some(rate.to_string())))
        })
    }

    pub async fn create_fiat_order(&self, params: &FiatOrderParams) -> Result<FiatOrder, GatewayError> {
        let terms = self.fiat_terms(
            &params.from,
            &params.to,
            &params.amount,
            params.provider.as_deref(),
            params.payment_method.as_deref(),
        )?;
        let wallet = validate::required("walletAddress", &params.wallet_address)?;

        let mut upstream = terms.params();
        upstream.insert("walletAddress".into(), json!(wallet));
        if let Some(email) = validate::optional(params.email.as_deref()) {
            upstream.insert("email".into(), json!(email));
        }
        if let Some(return_url) = validate::optional(params.return_url.as_deref()) {
            upstream.insert("returnSuccessUrl".into(), json!(return_url));
        }

        let value = self
            .call(&self.endpoints.fiat, "createFiatOrder", Value::Object(upstream))
            .await?;
        let entry = first_entry(&value);
        let order_id = text(entry, &["orderId", "id"])
            .ok_or_else(|| TransportError::malformed("fiat order result has no order id", &value))?;
        let status = map_fiat_order_status(&text(entry, &["status"]).unwrap_or_else(|| "created".into()));

        info!(
            order_id = %order_id,
            provider = %terms.provider.id,
            payment_method = %terms.payment_method,
            "Created fiat order"
        );
        Ok(FiatOrder {
            order_id,
            status,
            provider_id: terms.provider.id.clone(),
            payment_method: terms.payment_method,
            redirect_url: text(entry, &["redirectUrl", "paymentUrl"]),
            fees: terms.fees,
        })
    }

    pub async fn get_fiat_order_status(&self, order_id: &str) -> Result<FiatOrderStatusDetails, GatewayError> {
        let order_id = validate::required("orderId", order_id)?;
        let value = self
            .call(&self.endpoints.fiat, "getFiatOrderStatus", json!({ "orderId": order_id }))
            .await?;
        let raw_status = scalar_text(&value)
            .or_else(|| text(first_entry(&value), &["status"]))
            .ok_or_else(|| TransportError::malformed("fiat order status result has no status", &value))?;

        Ok(FiatOrderStatusDetails {
            order_id: order_id.to_string(),
            status: map_fiat_order_status(&raw_status),
            raw_status,
        })
    }

    // =========================================================================
    // DEX aggregator
    // =========================================================================

    pub async fn get_dex_quote(&self, params: &DexQuoteParams) -> Result<Sourced<DexQuote>, GatewayError> {
        let from_token = validate::required("fromToken", &params.from_token)?.to_string();
        let to_token = validate::required("toToken", &params.to_token)?.to_string();
        let amount = validate::positive_amount("amount", &params.amount)?;
        let chain_id = validate::chain_id(params.chain_id)?;
        let slippage = validate::slippage(params.slippage)?;

        let mut upstream = Map::new();
        upstream.insert("fromToken".into(), json!(from_token));
        upstream.insert("toToken".into(), json!(to_token));
        upstream.insert("amount".into(), json!(amount.to_string()));
        upstream.insert("chainId".into(), json!(chain_id));
        upstream.insert("slippage".into(), json!(slippage.to_string()));
        if let Some(user) = validate::optional(params.user_address.as_deref()) {
            upstream.insert("userAddress".into(), json!(user));
        }

        let result = self
            .call(&self.endpoints.dex, "getDexQuote", Value::Object(upstream))
            .await
            .and_then(|value| {
                let amount_out = text(&value, &["toAmount", "amountOut"]).ok_or_else(|| {
                    TransportError::malformed("DEX quote has no output amount", &value)
                })?;
                Ok(DexQuote {
                    from_token: from_token.clone(),
                    to_token: to_token.clone(),
                    chain_id,
                    amount_in: amount.to_string(),
                    amount_out,
                    min_amount_out: text(&value, &["minToAmount", "minAmountOut"]),
                    price_impact: text(&value, &["priceImpact"]),
                    estimated_gas: text(&value, &["estimatedGas", "gas"]),
                    slippage,
                })
            });
        self.degrade("DEX quote", result, || {
            demo::dex_quote(&from_token, &to_token, chain_id, amount, slippage)
        })
    }

    pub async fn get_dex_swap_transaction(
        &self,
        params: &DexSwapParams,
    ) -> Result<DexSwapTransaction, GatewayError> {
        let from_token = validate::required("fromToken", &params.from_token)?;
        let to_token = validate::required("toToken", &params.to_token)?;
        let amount = validate::positive_amount("amount", &params.amount)?;
        let chain_id = validate::chain_id(params.chain_id)?;
        let slippage = validate::slippage(params.slippage)?;
        let user = validate::required("userAddress", &params.user_address)?;

        let upstream = json!({
            "fromToken": from_token,
            "toToken": to_token,
            "amount": amount.to_string(),
            "chainId": chain_id,
            "slippage": slippage.to_string(),
            "userAddress": user,
        });
        let value = self
            .call(&self.endpoints.dex, "getDexSwapTransaction", upstream)
            .await?;
        Ok(DexSwapTransaction::from_upstream(&value, chain_id, user)?)
    }

    pub async fn get_dex_tokens(&self, chain_id: Option<u64>) -> Result<Sourced<Vec<DexToken>>, GatewayError> {
        let chain_id = chain_id.map(validate::chain_id).transpose()?;
        let params = match chain_id {
            Some(id) => json!({ "chainId": id }),
            None => json!({}),
        };

        let result = self
            .call(&self.endpoints.dex, "getDexTokens", params)
            .await
            .and_then(|value| Ok(parse_list::<DexToken>(&value, "tokens")?));
        self.degrade("DEX tokens", result, || Some(demo::tokens(chain_id)))
    }

    pub async fn get_dex_chains(&self) -> Result<Sourced<Vec<DexChain>>, GatewayError> {
        let result = self
            .call(&self.endpoints.dex, "getDexChains", json!({}))
            .await
            .and_then(|value| Ok(parse_list::<DexChain>(&value, "chains")?));
        self.degrade("DEX chains", result, || Some(demo::chains()))
    }
}

/// Currency tickers, from a bare list of strings or of `{ticker}` objects.
fn parse_currencies(value: &Value) -> Result<Vec<String>, TransportError> {
    let items = list_under(value, "currencies")
        .ok_or_else(|| TransportError::malformed("currency list is not an array", value))?;
    Ok(items
        .iter()
        .filter_map(|item| scalar_text(item).or_else(|| text(item, &["ticker", "name"])))
        .map(|ticker| ticker.to_lowercase())
        .collect())
}

fn parse_list<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Result<Vec<T>, TransportError> {
    let items = list_under(value, key)
        .ok_or_else(|| TransportError::malformed(format!("{key} list is not an array"), value))?;
    serde_json::from_value(Value::Array(items.clone()))
        .map_err(|e| TransportError::malformed(format!("{key} list is malformed: {e}"), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credentials::{CredentialError, CredentialSource, PRIVATE_KEY_NAME, PUBLIC_KEY_NAME},
        rpc::ErrorKind,
        testing::{self, test_gateway, unreachable_url, MockReply, MockUpstream},
    };
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn rpc_result(result: Value) -> MockReply {
        MockReply::ok(json!({ "jsonrpc": "2.0", "id": "1", "result": result }).to_string())
    }

    async fn unreachable_endpoints() -> Endpoints {
        let url = unreachable_url().await;
        Endpoints::new(url.clone(), url.clone(), url)
    }

    #[tokio::test]
    async fn exchange_amount_end_to_end() {
        let upstream = MockUpstream::start(|_| rpc_result(json!("14.3"))).await;
        let gateway = test_gateway(upstream.endpoints());

        let estimate = gateway.get_exchange_amount("btc", "eth", "1").await.unwrap();
        assert_eq!(estimate.data, "14.3");
        assert_eq!(estimate.source, DataSource::Live);

        let requests = upstream.requests();
        assert_eq!(requests.len(), 1);
        let body = requests[0].json();
        assert_eq!(body["method"], "getExchangeAmount");
        assert_eq!(body["params"], json!({ "from": "btc", "to": "eth", "amount": "1" }));
        assert_eq!(requests[0].header("api-key").as_deref(), Some(testing::PUBLIC_KEY));
    }

    #[tokio::test]
    async fn application_error_message_reaches_caller() {
        let upstream = MockUpstream::start(|_| {
            MockReply::ok(r#"{"jsonrpc":"2.0","id":"1","error":{"code":-32602,"message":"pair not found"}}"#)
        })
        .await;
        let gateway = test_gateway(upstream.endpoints()).with_demo_fallback(true);

        let err = gateway.get_exchange_amount("btc", "xyz", "1").await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(ErrorKind::ApplicationError));
        assert!(err.to_string().contains("pair not found"));
    }

    #[tokio::test]
    async fn invalid_amount_never_reaches_upstream() {
        let upstream = MockUpstream::start(|_| rpc_result(json!("1"))).await;
        let gateway = test_gateway(upstream.endpoints());

        for amount in ["0", "-1", "lots"] {
            let err = gateway.get_exchange_amount("btc", "eth", amount).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "amount"));
        }
        assert!(upstream.requests().is_empty());
    }

    #[derive(Debug)]
    struct CountingStore {
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        fn label(&self) -> &str {
            "counting"
        }

        async fn get(&self, name: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            match name {
                PUBLIC_KEY_NAME => Some(testing::PUBLIC_KEY.to_string()),
                PRIVATE_KEY_NAME => Some(testing::PRIVATE_KEY.to_string()),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn credentials_resolve_once_under_concurrent_first_use() {
        let upstream = MockUpstream::start(|_| rpc_result(json!(["btc"]))).await;
        let reads = Arc::new(AtomicUsize::new(0));
        let resolver = CredentialResolver::new(CredentialPolicy::STRICT).with_source(
            CredentialSource::pair(Arc::new(CountingStore {
                reads: Arc::clone(&reads),
            })),
        );
        let gateway = Arc::new(Gateway::new(
            upstream.endpoints(),
            resolver,
            ApiTransport::new(Duration::from_secs(5)).unwrap(),
            Arc::new(FiatCatalog::builtin()),
        ));

        let calls: Vec<_> = (0..8)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move { gateway.get_currencies().await })
            })
            .collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }

        // One resolution reads the public and the private key once each.
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(upstream.requests().len(), 8);
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let upstream = MockUpstream::start(|_| rpc_result(json!([]))).await;
        let gateway = Gateway::new(
            upstream.endpoints(),
            CredentialResolver::new(CredentialPolicy::STRICT),
            ApiTransport::new(Duration::from_secs(5)).unwrap(),
            Arc::new(FiatCatalog::builtin()),
        )
        .with_demo_fallback(true);

        let err = gateway.get_currencies().await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Credentials(CredentialError::NotConfigured { .. })
        ));
        assert!(upstream.requests().is_empty());

        // Not cached: the next call resolves again and fails the same way.
        assert!(gateway.check_credentials().await.is_err());
    }

    #[tokio::test]
    async fn unreachable_upstream_serves_labeled_demo_data() {
        let gateway = test_gateway(unreachable_endpoints().await).with_demo_fallback(true);

        let currencies = gateway.get_currencies().await.unwrap();
        assert!(currencies.is_demo());
        assert!(currencies.data.contains(&"btc".to_string()));
        assert!(currencies.notice.unwrap().contains("network_error"));

        let estimate = gateway.get_exchange_amount("btc", "eth", "1").await.unwrap();
        assert!(estimate.is_demo());
        assert_eq!(estimate.data, "14.33333333");
    }

    #[tokio::test]
    async fn oversized_amounts_fail_with_validation_errors() {
        let upstream = MockUpstream::start(|_| rpc_result(json!({}))).await;
        let gateway = test_gateway(upstream.endpoints());
        let params = FiatQuoteParams {
            from: "USD".into(),
            to: "btc".into(),
            amount: Decimal::MAX.to_string(),
            provider: None,
            payment_method: Some("card".into()),
        };

        let err = gateway.get_fiat_quote(&params).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "amount"));
        assert!(upstream.requests().is_empty());

        // No demo value exists for an amount that cannot be converted, so the
        // upstream failure surfaces unchanged.
        let gateway = test_gateway(unreachable_endpoints().await).with_demo_fallback(true);
        let err = gateway
            .get_exchange_amount("btc", "usd", &Decimal::MAX.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.transport_kind(), Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn demo_fallback_is_off_by_default() {
        let gateway = test_gateway(unreachable_endpoints().await);
        let err = gateway.get_currencies().await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn writes_never_fall_back_to_demo() {
        let gateway = test_gateway(unreachable_endpoints().await).with_demo_fallback(true);
        let params = CreateTransactionParams {
            from: "btc".into(),
            to: "eth".into(),
            amount: "0.5".into(),
            payout_address: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            payout_extra_id: None,
            refund_address: None,
        };
        let err = gateway.create_transaction(&params).await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn server_errors_fall_back_but_auth_rejection_does_not() {
        let upstream = MockUpstream::start(|request| {
            if request.json()["method"] == "getDexChains" {
                MockReply::status(503, "maintenance")
            } else {
                MockReply::status(401, r#"{"error":{"message":"Unauthorized"}}"#)
            }
        })
        .await;
        let gateway = test_gateway(upstream.endpoints()).with_demo_fallback(true);

        let chains = gateway.get_dex_chains().await.unwrap();
        assert!(chains.is_demo());
        assert!(chains.notice.unwrap().contains("upstream_server_error"));

        let err = gateway.get_dex_tokens(None).await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(ErrorKind::AuthRejected));
    }

    #[tokio::test]
    async fn create_transaction_maps_descriptor() {
        let upstream = MockUpstream::start(|_| {
            rpc_result(json!({
                "id": "f5b3a1c0e9d8",
                "status": "new",
                "payinAddress": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh",
                "payoutAddress": "0x52908400098527886E0F7030069857D2E4169EE7",
                "amountExpectedFrom": "0.5",
                "amountExpectedTo": "7.1"
            }))
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());
        let params = CreateTransactionParams {
            from: "BTC".into(),
            to: "eth".into(),
            amount: "0.5".into(),
            payout_address: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            payout_extra_id: None,
            refund_address: Some("bc1qrefund".into()),
        };

        let tx = gateway.create_transaction(&params).await.unwrap();
        assert_eq!(tx.id, "f5b3a1c0e9d8");
        assert_eq!(tx.status, TransactionStatus::New);
        assert_eq!(tx.amount_expected_to.as_deref(), Some("7.1"));

        let sent = upstream.requests()[0].json();
        assert_eq!(sent["params"]["from"], "btc");
        assert_eq!(sent["params"]["refundAddress"], "bc1qrefund");
        assert!(sent["params"].get("extraId").is_none());
    }

    #[tokio::test]
    async fn transaction_status_accepts_bare_string_result() {
        let upstream = MockUpstream::start(|_| rpc_result(json!("exchanging"))).await;
        let gateway = test_gateway(upstream.endpoints());

        let status = gateway.get_transaction_status("f5b3a1c0e9d8").await.unwrap();
        assert_eq!(status.status, TransactionStatus::Exchanging);
        assert_eq!(status.raw_status, "exchanging");

        let err = gateway.get_transaction_status(" ").await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn fiat_quote_selects_provider_and_computes_fees() {
        let upstream = MockUpstream::start(|_| {
            rpc_result(json!([{ "amountTo": "0.00232558", "rate": "0.0000232558" }]))
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());
        let params = FiatQuoteParams {
            from: "usd".into(),
            to: "BTC".into(),
            amount: "100".into(),
            provider: None,
            payment_method: None,
        };

        let quote = gateway.get_fiat_quote(&params).await.unwrap();
        // Every card provider covers 100 without KYC; the highest limit wins.
        assert_eq!(quote.data.provider_id, "transak");
        assert_eq!(quote.data.payment_method, "card");
        assert_eq!(quote.data.fees.provider_fee, dec!(3.50));
        assert_eq!(quote.data.fees.platform_fee, dec!(2.00));
        assert_eq!(quote.data.fees.total, dec!(105.50));
        assert_eq!(quote.data.amount_to.as_deref(), Some("0.00232558"));
        assert!(!quote.data.kyc_required);

        let request = &upstream.requests()[0];
        assert_eq!(request.path, "/fiat");
        let sent = request.json();
        assert_eq!(sent["method"], "getFiatQuote");
        assert_eq!(sent["params"]["providerCode"], "transak");
        assert_eq!(sent["params"]["currencyFrom"], "USD");
    }

    #[tokio::test]
    async fn explicit_unknown_provider_is_rejected() {
        let upstream = MockUpstream::start(|_| rpc_result(json!({}))).await;
        let gateway = test_gateway(upstream.endpoints());
        let params = FiatQuoteParams {
            from: "USD".into(),
            to: "btc".into(),
            amount: "100".into(),
            provider: Some("nonexistent".into()),
            payment_method: None,
        };

        let err = gateway.get_fiat_quote(&params).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "provider"));

        let unavailable = FiatQuoteParams {
            provider: Some("simplex".into()),
            ..params
        };
        assert!(gateway.get_fiat_quote(&unavailable).await.is_err());
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn fiat_order_and_status_round_trip() {
        let upstream = MockUpstream::start(|request| match request.json()["method"].as_str() {
            Some("createFiatOrder") => rpc_result(json!({
                "orderId": "ord_81f2",
                "status": "pending",
                "redirectUrl": "https://buy.moonpay.com/?orderId=ord_81f2"
            })),
            _ => rpc_result(json!({ "status": "completed" })),
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());
        let params = FiatOrderParams {
            from: "EUR".into(),
            to: "eth".into(),
            amount: "120".into(),
            provider: Some("moonpay".into()),
            payment_method: Some("bank_transfer".into()),
            wallet_address: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            email: None,
            return_url: Some("https://example.org/done".into()),
        };

        let order = gateway.create_fiat_order(&params).await.unwrap();
        assert_eq!(order.order_id, "ord_81f2");
        assert_eq!(order.status, FiatOrderStatus::Pending);
        assert_eq!(order.provider_id, "moonpay");
        assert_eq!(order.fees.provider_fee, dec!(1.20));

        let status = gateway.get_fiat_order_status("ord_81f2").await.unwrap();
        assert_eq!(status.status, FiatOrderStatus::Completed);

        let sent = upstream.requests()[0].json();
        assert_eq!(sent["params"]["walletAddress"], "0x52908400098527886E0F7030069857D2E4169EE7");
        assert_eq!(sent["params"]["returnSuccessUrl"], "https://example.org/done");
    }

    #[tokio::test]
    async fn dex_quote_defaults_slippage_and_targets_dex_endpoint() {
        let upstream = MockUpstream::start(|_| {
            MockReply::ok(r#"{"toAmount":"2985.1","minToAmount":"2955.2","priceImpact":"0.02"}"#)
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());
        let params = DexQuoteParams {
            from_token: "ETH".into(),
            to_token: "USDC".into(),
            amount: "1".into(),
            chain_id: 1,
            slippage: None,
            user_address: None,
        };

        let quote = gateway.get_dex_quote(&params).await.unwrap();
        assert_eq!(quote.data.amount_out, "2985.1");
        assert_eq!(quote.data.slippage, dec!(1));

        let request = &upstream.requests()[0];
        assert_eq!(request.path, "/dex");
        assert_eq!(request.json()["params"]["slippage"], "1");

        let too_loose = DexQuoteParams {
            slippage: Some(dec!(75)),
            ..params
        };
        let err = gateway.get_dex_quote(&too_loose).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "slippage"));
    }

    #[tokio::test]
    async fn dex_swap_transaction_unwraps_tx_object() {
        let upstream = MockUpstream::start(|_| {
            MockReply::ok(
                json!({
                    "tx": {
                        "to": "0x1111111254EEB25477B68fb85Ed929f73A960582",
                        "data": "0x12aa3caf",
                        "value": "1000000000000000000",
                        "gas": 182000
                    }
                })
                .to_string(),
            )
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());
        let params = DexSwapParams {
            from_token: "ETH".into(),
            to_token: "USDC".into(),
            amount: "1".into(),
            chain_id: 1,
            slippage: Some(dec!(0.5)),
            user_address: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
        };

        let tx = gateway.get_dex_swap_transaction(&params).await.unwrap();
        assert_eq!(tx.to, "0x1111111254EEB25477B68fb85Ed929f73A960582");
        assert_eq!(tx.from, "0x52908400098527886E0F7030069857D2E4169EE7");
        assert_eq!(tx.gas.as_deref(), Some("182000"));

        let missing_user = DexSwapParams {
            user_address: String::new(),
            ..params
        };
        assert!(matches!(
            gateway.get_dex_swap_transaction(&missing_user).await,
            Err(GatewayError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn dex_tokens_accept_wrapped_list() {
        let upstream = MockUpstream::start(|_| {
            MockReply::ok(
                json!({ "tokens": [{
                    "symbol": "USDC",
                    "name": "USD Coin",
                    "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                    "decimals": 6,
                    "chainId": 1,
                    "logoURI": "https://tokens.example/usdc.png"
                }]})
                .to_string(),
            )
        })
        .await;
        let gateway = test_gateway(upstream.endpoints());

        let tokens = gateway.get_dex_tokens(Some(1)).await.unwrap();
        assert_eq!(tokens.data.len(), 1);
        assert_eq!(tokens.data[0].logo_uri.as_deref(), Some("https://tokens.example/usdc.png"));
        assert_eq!(upstream.requests()[0].json()["params"], json!({ "chainId": 1 }));
    }
}
