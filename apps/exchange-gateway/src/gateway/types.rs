// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation parameters and typed results.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{fiat::FeeBreakdown, rpc::TransportError};

// =============================================================================
// Sourced results
// =============================================================================

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Demo,
}

/// Result of a read-only operation, labeled so demo data is never mistaken
/// for a live quote.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
            notice: None,
        }
    }

    pub fn demo(data: T, notice: impl Into<String>) -> Self {
        Self {
            data,
            source: DataSource::Demo,
            notice: Some(notice.into()),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.source == DataSource::Demo
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Accept amounts as JSON strings or numbers; validation parses them later.
fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a decimal string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAmountParams {
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionParams {
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    pub payout_address: String,
    #[serde(default)]
    pub payout_extra_id: Option<String>,
    #[serde(default)]
    pub refund_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatQuoteParams {
    /// Fiat currency code, e.g. `USD`.
    pub from: String,
    /// Crypto asset, e.g. `btc`.
    pub to: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatOrderParams {
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub wallet_address: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexQuoteParams {
    pub from_token: String,
    pub to_token: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    pub chain_id: u64,
    /// Percent; defaults to 1.
    #[serde(default)]
    pub slippage: Option<Decimal>,
    #[serde(default)]
    pub user_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexSwapParams {
    pub from_token: String,
    pub to_token: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    pub chain_id: u64,
    #[serde(default)]
    pub slippage: Option<Decimal>,
    pub user_address: String,
}

// =============================================================================
// Swap results
// =============================================================================

/// Lifecycle of a crypto-to-crypto swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    New,
    Waiting,
    Confirming,
    Exchanging,
    Sending,
    Finished,
    Failed,
    Refunded,
    Hold,
    Expired,
    Unknown,
}

/// Map the upstream status string onto [`TransactionStatus`].
pub fn map_transaction_status(raw: &str) -> TransactionStatus {
    match raw.trim().to_lowercase().as_str() {
        "new" => TransactionStatus::New,
        "waiting" => TransactionStatus::Waiting,
        "confirming" => TransactionStatus::Confirming,
        "exchanging" => TransactionStatus::Exchanging,
        "sending" => TransactionStatus::Sending,
        "finished" => TransactionStatus::Finished,
        "failed" => TransactionStatus::Failed,
        "refunded" => TransactionStatus::Refunded,
        "hold" => TransactionStatus::Hold,
        "expired" | "overdue" => TransactionStatus::Expired,
        _ => TransactionStatus::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub id: String,
    pub status: TransactionStatus,
    pub payin_address: String,
    pub payout_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payin_extra_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_expected_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_expected_to: Option<String>,
}

impl TransactionDescriptor {
    pub(crate) fn from_upstream(value: &Value) -> Result<Self, TransportError> {
        let entry = first_entry(value);
        let required = |key: &str| {
            text(entry, &[key]).ok_or_else(|| {
                TransportError::malformed(format!("createTransaction result lacks `{key}`"), value)
            })
        };

        Ok(Self {
            id: required("id")?,
            status: map_transaction_status(&text(entry, &["status"]).unwrap_or_default()),
            payin_address: required("payinAddress")?,
            payout_address: required("payoutAddress")?,
            payin_extra_id: text(entry, &["payinExtraId"]),
            amount_expected_from: text(entry, &["amountExpectedFrom"]),
            amount_expected_to: text(entry, &["amountExpectedTo"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusDetails {
    pub id: String,
    pub status: TransactionStatus,
    pub raw_status: String,
}

// =============================================================================
// Fiat results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatQuote {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub provider_id: String,
    pub provider_name: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    pub fees: FeeBreakdown,
    /// The amount exceeds the provider's non-KYC limit.
    pub kyc_required: bool,
}

/// Lifecycle of a fiat on-ramp order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FiatOrderStatus {
    Created,
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Expired,
    Unknown,
}

/// Map a provider order status onto [`FiatOrderStatus`].
pub fn map_fiat_order_status(raw: &str) -> FiatOrderStatus {
    match raw.trim().to_lowercase().as_str() {
        "new" | "created" => FiatOrderStatus::Created,
        "pending" | "waiting" => FiatOrderStatus::Pending,
        "processing" | "exchanging" | "sending" => FiatOrderStatus::Processing,
        "completed" | "complete" | "finished" | "success" => FiatOrderStatus::Completed,
        "failed" | "declined" | "rejected" => FiatOrderStatus::Failed,
        "refunded" => FiatOrderStatus::Refunded,
        "expired" | "cancelled" | "canceled" => FiatOrderStatus::Expired,
        _ => FiatOrderStatus::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatOrder {
    pub order_id: String,
    pub status: FiatOrderStatus,
    pub provider_id: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub fees: FeeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatOrderStatusDetails {
    pub order_id: String,
    pub status: FiatOrderStatus,
    pub raw_status: String,
}

// =============================================================================
// DEX results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexQuote {
    pub from_token: String,
    pub to_token: String,
    pub chain_id: u64,
    pub amount_in: String,
    pub amount_out: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_gas: Option<String>,
    pub slippage: Decimal,
}

/// Unsigned transaction for the user's wallet to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexSwapTransaction {
    pub chain_id: u64,
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

impl DexSwapTransaction {
    pub(crate) fn from_upstream(value: &Value, chain_id: u64, from: &str) -> Result<Self, TransportError> {
        let tx = value.get("tx").unwrap_or(value);
        let to = text(tx, &["to"])
            .ok_or_else(|| TransportError::malformed("swap transaction lacks `to`", value))?;
        let data = text(tx, &["data"])
            .ok_or_else(|| TransportError::malformed("swap transaction lacks `data`", value))?;

        Ok(Self {
            chain_id,
            from: text(tx, &["from"]).unwrap_or_else(|| from.to_string()),
            to,
            data,
            value: text(tx, &["value"]).unwrap_or_else(|| "0".to_string()),
            gas: text(tx, &["gas", "gasLimit"]),
            gas_price: text(tx, &["gasPrice"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexToken {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    pub chain_id: u64,
    #[serde(default, alias = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DexChain {
    pub chain_id: u64,
    pub name: String,
    pub native_token: String,
}

// =============================================================================
// Upstream payload helpers
// =============================================================================

/// Some methods wrap a single result in an array.
pub(crate) fn first_entry(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        other => other,
    }
}

/// First of `keys` holding a non-empty string or a number, as text.
pub(crate) fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_text(value.get(*key)?))
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list that may arrive bare or under `key`.
pub(crate) fn list_under<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value
        .as_array()
        .or_else(|| value.get(key).and_then(Value::as_array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_statuses_map_case_insensitively() {
        assert_eq!(map_transaction_status("Finished"), TransactionStatus::Finished);
        assert_eq!(map_transaction_status("overdue"), TransactionStatus::Expired);
        assert_eq!(map_transaction_status("mystery"), TransactionStatus::Unknown);
    }

    #[test]
    fn fiat_statuses_fold_provider_vocabulary() {
        assert_eq!(map_fiat_order_status("declined"), FiatOrderStatus::Failed);
        assert_eq!(map_fiat_order_status("canceled"), FiatOrderStatus::Expired);
        assert_eq!(map_fiat_order_status("success"), FiatOrderStatus::Completed);
        assert_eq!(map_fiat_order_status(""), FiatOrderStatus::Unknown);
    }

    #[test]
    fn transaction_descriptor_accepts_numeric_amounts() {
        let value = json!({
            "id": "tx-1",
            "status": "new",
            "payinAddress": "bc1qpayin",
            "payoutAddress": "0xpayout",
            "amountExpectedFrom": 0.5,
            "amountExpectedTo": "7.15"
        });
        let tx = TransactionDescriptor::from_upstream(&value).unwrap();
        assert_eq!(tx.status, TransactionStatus::New);
        assert_eq!(tx.amount_expected_from.as_deref(), Some("0.5"));
        assert_eq!(tx.payin_extra_id, None);
    }

    #[test]
    fn transaction_descriptor_requires_payin_address() {
        let value = json!({ "id": "tx-1", "payoutAddress": "0xpayout" });
        let err = TransactionDescriptor::from_upstream(&value).unwrap_err();
        assert!(err.message.contains("payinAddress"));
    }

    #[test]
    fn params_accept_numeric_amounts() {
        let params: ExchangeAmountParams =
            serde_json::from_value(json!({ "from": "btc", "to": "eth", "amount": 1.5 })).unwrap();
        assert_eq!(params.amount, "1.5");

        let rejected = serde_json::from_value::<ExchangeAmountParams>(
            json!({ "from": "btc", "to": "eth", "amount": true }),
        );
        assert!(rejected.is_err());
    }

    #[test]
    fn sourced_serializes_source_label() {
        let demo = Sourced::demo(vec!["btc"], "upstream unavailable");
        assert_eq!(
            serde_json::to_value(&demo).unwrap(),
            json!({ "data": ["btc"], "source": "demo", "notice": "upstream unavailable" })
        );
        assert_eq!(
            serde_json::to_value(Sourced::live(1)).unwrap(),
            json!({ "data": 1, "source": "live" })
        );
    }
}
