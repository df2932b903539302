// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Best-provider selection for a fiat purchase.

use rust_decimal::Decimal;

use super::catalog::{FiatCatalog, FiatProvider};

/// Case-insensitive substring match in either direction, so `"card"`
/// matches `"Credit/Debit Card"` and vice versa. `_` and `-` compare as
/// spaces, so catalog ids like `bank_transfer` match `"Bank Transfer"`.
///
/// Loose on purpose to accept free-text provider labels. It also lets
/// short inputs such as `"a"` match almost anything; callers that care
/// should pass catalog method ids.
pub fn method_matches(label: &str, requested: &str) -> bool {
    let label = normalize(label);
    let requested = normalize(requested);
    if label.is_empty() || requested.is_empty() {
        return false;
    }
    label.contains(&requested) || requested.contains(&label)
}

/// Pick the provider for `payment_method` and `amount`.
///
/// Providers that can take the whole amount without KYC rank first; within
/// each group the higher non-KYC limit wins. Ties keep catalog order.
pub fn select_provider<'a>(
    catalog: &'a FiatCatalog,
    payment_method: &str,
    amount: Decimal,
) -> Option<&'a FiatProvider> {
    catalog
        .providers()
        .iter()
        .filter(|p| p.available && p.supports(payment_method))
        .min_by(|a, b| rank(b, amount).cmp(&rank(a, amount)))
}

fn normalize(method: &str) -> String {
    method.trim().to_lowercase().replace(['_', '-'], " ")
}

fn rank(provider: &FiatProvider, amount: Decimal) -> (bool, Decimal) {
    (provider.non_kyc_limit >= amount, provider.non_kyc_limit)
}
