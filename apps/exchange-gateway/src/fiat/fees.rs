// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee breakdown for a fiat purchase.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use super::catalog::FiatProvider;

/// Platform fee charged on top of the provider fee.
pub const PLATFORM_FEE_RATE: Decimal = dec!(0.02);

/// Fee components are rounded to cents.
const FEE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub provider_fee: Decimal,
    pub platform_fee: Decimal,
    /// `amount + provider_fee + platform_fee`
    pub total: Decimal,
}

/// `None` when the amount is too large for the fee arithmetic.
pub fn compute_fees(
    amount: Decimal,
    provider: Option<&FiatProvider>,
    payment_method: &str,
) -> Option<FeeBreakdown> {
    let rate = provider.map_or(Decimal::ZERO, |p| p.fee_rate(payment_method));
    let provider_fee = round_fee(amount.checked_mul(rate)?);
    let platform_fee = round_fee(amount.checked_mul(PLATFORM_FEE_RATE)?);
    let total = amount.checked_add(provider_fee)?.checked_add(platform_fee)?;

    Some(FeeBreakdown {
        provider_fee,
        platform_fee,
        total,
    })
}

fn round_fee(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FEE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiat::catalog::FeeSpec;
    use std::collections::BTreeMap;

    fn provider_with_card_rate(rate: Decimal) -> FiatProvider {
        FiatProvider {
            id: "b".to_string(),
            name: "B".to_string(),
            non_kyc_limit: dec!(1000),
            fees: BTreeMap::from([("card".to_string(), FeeSpec { rate })]),
            supported_methods: vec!["card".to_string()],
            available: true,
        }
    }

    #[test]
    fn breakdown_for_thousand_at_two_and_a_half_percent() {
        let provider = provider_with_card_rate(dec!(0.025));
        let fees = compute_fees(dec!(1000), Some(&provider), "card").unwrap();
        assert_eq!(fees.platform_fee, dec!(20.00));
        assert_eq!(fees.provider_fee, dec!(25.00));
        assert_eq!(fees.total, dec!(1045.00));
    }

    #[test]
    fn no_provider_means_platform_fee_only() {
        let fees = compute_fees(dec!(50), None, "card").unwrap();
        assert_eq!(fees.provider_fee, Decimal::ZERO);
        assert_eq!(fees.platform_fee, dec!(1.00));
        assert_eq!(fees.total, dec!(51.00));
    }

    #[test]
    fn fees_round_half_away_from_zero() {
        // 10.25 * 0.02 = 0.205 -> 0.21
        let fees = compute_fees(dec!(10.25), None, "card").unwrap();
        assert_eq!(fees.platform_fee, dec!(0.21));
    }

    #[test]
    fn decimal_math_has_no_float_drift() {
        let provider = provider_with_card_rate(dec!(0.1));
        let fees = compute_fees(dec!(0.3), Some(&provider), "card").unwrap();
        assert_eq!(fees.provider_fee, dec!(0.03));
        assert_eq!(fees.total, dec!(0.3) + dec!(0.03) + dec!(0.01));
    }

    #[test]
    fn amounts_beyond_decimal_range_have_no_breakdown() {
        let provider = provider_with_card_rate(dec!(0.035));
        assert_eq!(compute_fees(Decimal::MAX, Some(&provider), "card"), None);
        assert_eq!(compute_fees(Decimal::MAX, None, "card"), None);
    }
}
