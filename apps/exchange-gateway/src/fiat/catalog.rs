// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiat on-ramp provider and payment-method reference data.

use std::{collections::BTreeMap, path::Path};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::selector::method_matches;

/// Payment method family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Bank,
    Wallet,
    Instant,
}

/// Provider fee for one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeeSpec {
    /// Fraction of the amount (`0.025` = 2.5%).
    pub rate: Decimal,
}

/// A fiat on-ramp provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiatProvider {
    pub id: String,
    pub name: String,
    /// Largest amount accepted without identity verification.
    pub non_kyc_limit: Decimal,
    /// Keyed by payment method id.
    #[serde(default)]
    pub fees: BTreeMap<String, FeeSpec>,
    /// Free-text method labels as the provider advertises them.
    pub supported_methods: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl FiatProvider {
    pub fn supports(&self, payment_method: &str) -> bool {
        self.supported_methods
            .iter()
            .any(|label| method_matches(label, payment_method))
    }

    /// Fee rate for `payment_method`: exact id first, then the same loose
    /// label match used for selection. Unknown methods carry no provider fee.
    pub fn fee_rate(&self, payment_method: &str) -> Decimal {
        let requested = payment_method.trim();
        if requested.is_empty() {
            return Decimal::ZERO;
        }
        self.fees
            .iter()
            .find(|(method, _)| method.eq_ignore_ascii_case(requested))
            .or_else(|| {
                self.fees
                    .iter()
                    .find(|(method, _)| method_matches(method, requested))
            })
            .map(|(_, fee)| fee.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

/// A way to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PaymentMethodType,
    pub processing_time: String,
    /// Fiat currency codes accepted with this method.
    pub currencies: Vec<String>,
}

impl PaymentMethod {
    pub fn accepts_currency(&self, code: &str) -> bool {
        self.currencies.iter().any(|c| c.eq_ignore_ascii_case(code))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read fiat catalog {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("fiat catalog is invalid: {0}")]
    Invalid(String),
}

/// Immutable provider and payment-method tables, built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiatCatalog {
    providers: Vec<FiatProvider>,
    payment_methods: Vec<PaymentMethod>,
}

impl FiatCatalog {
    pub fn new(providers: Vec<FiatProvider>, payment_methods: Vec<PaymentMethod>) -> Self {
        Self {
            providers,
            payment_methods,
        }
    }

    /// Parse a catalog from JSON, rejecting duplicate ids and negative
    /// limits or rates.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: FiatCatalog =
            serde_json::from_str(json).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn providers(&self) -> &[FiatProvider] {
        &self.providers
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn provider(&self, id: &str) -> Option<&FiatProvider> {
        let id = id.trim();
        self.providers.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn payment_method(&self, id: &str) -> Option<&PaymentMethod> {
        let id = id.trim();
        self.payment_methods
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(id))
    }

    fn check(&self) -> Result<(), CatalogError> {
        for (index, provider) in self.providers.iter().enumerate() {
            if provider.id.trim().is_empty() {
                return Err(CatalogError::Invalid(format!("provider #{index} has an empty id")));
            }
            if self.providers[..index]
                .iter()
                .any(|p| p.id.eq_ignore_ascii_case(&provider.id))
            {
                return Err(CatalogError::Invalid(format!(
                    "duplicate provider id `{}`",
                    provider.id
                )));
            }
            if provider.non_kyc_limit.is_sign_negative() {
                return Err(CatalogError::Invalid(format!(
                    "provider `{}` has a negative non-KYC limit",
                    provider.id
                )));
            }
            if let Some((method, _)) = provider
                .fees
                .iter()
                .find(|(_, fee)| fee.rate.is_sign_negative() || fee.rate >= Decimal::ONE)
            {
                return Err(CatalogError::Invalid(format!(
                    "provider `{}` has an out-of-range fee rate for `{method}`",
                    provider.id
                )));
            }
        }

        for (index, method) in self.payment_methods.iter().enumerate() {
            if self.payment_methods[..index]
                .iter()
                .any(|m| m.id.eq_ignore_ascii_case(&method.id))
            {
                return Err(CatalogError::Invalid(format!(
                    "duplicate payment method id `{}`",
                    method.id
                )));
            }
        }
        Ok(())
    }

    /// Providers and payment methods offered on the website.
    pub fn builtin() -> Self {
        Self::new(builtin_providers(), builtin_payment_methods())
    }
}

impl Default for FiatCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn fees(entries: &[(&str, Decimal)]) -> BTreeMap<String, FeeSpec> {
    entries
        .iter()
        .map(|(method, rate)| (method.to_string(), FeeSpec { rate: *rate }))
        .collect()
}

fn labels(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

fn builtin_providers() -> Vec<FiatProvider> {
    vec![
        FiatProvider {
            id: "moonpay".to_string(),
            name: "MoonPay".to_string(),
            non_kyc_limit: dec!(150),
            fees: fees(&[
                ("card", dec!(0.045)),
                ("bank_transfer", dec!(0.01)),
                ("apple_pay", dec!(0.045)),
                ("google_pay", dec!(0.045)),
            ]),
            supported_methods: labels(&["card", "bank transfer", "apple pay", "google pay"]),
            available: true,
        },
        FiatProvider {
            id: "mercuryo".to_string(),
            name: "Mercuryo".to_string(),
            non_kyc_limit: dec!(700),
            fees: fees(&[
                ("card", dec!(0.0395)),
                ("apple_pay", dec!(0.0395)),
                ("google_pay", dec!(0.0395)),
            ]),
            supported_methods: labels(&["card", "apple pay", "google pay"]),
            available: true,
        },
        FiatProvider {
            id: "transak".to_string(),
            name: "Transak".to_string(),
            non_kyc_limit: dec!(1000),
            fees: fees(&[
                ("card", dec!(0.035)),
                ("bank_transfer", dec!(0.01)),
                ("sepa_instant", dec!(0.01)),
            ]),
            supported_methods: labels(&["card", "bank transfer", "sepa instant"]),
            available: true,
        },
        FiatProvider {
            id: "banxa".to_string(),
            name: "Banxa".to_string(),
            non_kyc_limit: dec!(500),
            fees: fees(&[("card", dec!(0.0199)), ("bank_transfer", dec!(0.005))]),
            supported_methods: labels(&["card", "bank transfer"]),
            available: true,
        },
        FiatProvider {
            id: "simplex".to_string(),
            name: "Simplex".to_string(),
            non_kyc_limit: dec!(0),
            fees: fees(&[("card", dec!(0.05))]),
            supported_methods: labels(&["card", "apple pay"]),
            available: false,
        },
    ]
}

fn builtin_payment_methods() -> Vec<PaymentMethod> {
    let major = labels(&["USD", "EUR", "GBP"]);
    vec![
        PaymentMethod {
            id: "card".to_string(),
            name: "Credit/Debit Card".to_string(),
            kind: PaymentMethodType::Card,
            processing_time: "Instant".to_string(),
            currencies: major.clone(),
        },
        PaymentMethod {
            id: "bank_transfer".to_string(),
            name: "Bank Transfer".to_string(),
            kind: PaymentMethodType::Bank,
            processing_time: "1-3 business days".to_string(),
            currencies: major.clone(),
        },
        PaymentMethod {
            id: "apple_pay".to_string(),
            name: "Apple Pay".to_string(),
            kind: PaymentMethodType::Wallet,
            processing_time: "Instant".to_string(),
            currencies: major.clone(),
        },
        PaymentMethod {
            id: "google_pay".to_string(),
            name: "Google Pay".to_string(),
            kind: PaymentMethodType::Wallet,
            processing_time: "Instant".to_string(),
            currencies: major,
        },
        PaymentMethod {
            id: "sepa_instant".to_string(),
            name: "SEPA Instant".to_string(),
            kind: PaymentMethodType::Instant,
            processing_time: "Under 10 seconds".to_string(),
            currencies: labels(&["EUR"]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_passes_its_own_checks() {
        let catalog = FiatCatalog::builtin();
        catalog.check().unwrap();
        assert!(catalog.provider("MOONPAY").is_some());
        assert_eq!(
            catalog.payment_method("sepa_instant").map(|m| m.kind),
            Some(PaymentMethodType::Instant)
        );
    }

    #[test]
    fn fee_rate_prefers_exact_method_id() {
        let catalog = FiatCatalog::builtin();
        let moonpay = catalog.provider("moonpay").unwrap();
        assert_eq!(moonpay.fee_rate("bank_transfer"), dec!(0.01));
        assert_eq!(moonpay.fee_rate("Credit/Debit Card"), dec!(0.045));
        assert_eq!(moonpay.fee_rate("crypto voucher"), Decimal::ZERO);
    }

    #[test]
    fn catalog_loads_from_json() {
        let json = r#"{
            "providers": [{
                "id": "acme",
                "name": "Acme Ramp",
                "nonKycLimit": "250",
                "fees": { "card": { "rate": "0.03" } },
                "supportedMethods": ["card"]
            }],
            "paymentMethods": [{
                "id": "card",
                "name": "Card",
                "type": "card",
                "processingTime": "Instant",
                "currencies": ["EUR"]
            }]
        }"#;
        let catalog = FiatCatalog::from_json(json).unwrap();
        let acme = catalog.provider("acme").unwrap();
        assert!(acme.available);
        assert_eq!(acme.non_kyc_limit, dec!(250));
        assert_eq!(acme.fee_rate("card"), dec!(0.03));
        assert!(catalog.payment_method("card").unwrap().accepts_currency("eur"));
    }

    #[test]
    fn duplicate_provider_ids_are_rejected() {
        let json = r#"{
            "providers": [
                { "id": "a", "name": "A", "nonKycLimit": 1, "supportedMethods": [] },
                { "id": "A", "name": "A again", "nonKycLimit": 1, "supportedMethods": [] }
            ],
            "paymentMethods": []
        }"#;
        assert!(matches!(
            FiatCatalog::from_json(json),
            Err(CatalogError::Invalid(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn missing_catalog_file_is_a_read_error() {
        let err = FiatCatalog::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
