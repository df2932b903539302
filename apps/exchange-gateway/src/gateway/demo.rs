// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Indicative data served when the upstream is unreachable and demo
//! fallback is enabled. Never used for anything that moves funds.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::types::{DexChain, DexQuote, DexToken};

const AMOUNT_SCALE: u32 = 8;

pub(crate) const CURRENCIES: &[&str] = &[
    "btc", "eth", "usdt", "usdc", "bnb", "sol", "xrp", "ltc", "doge", "trx",
];

/// Indicative USD prices.
const USD_PRICES: &[(&str, Decimal)] = &[
    ("usd", dec!(1)),
    ("eur", dec!(1.08)),
    ("gbp", dec!(1.27)),
    ("btc", dec!(43000)),
    ("wbtc", dec!(43000)),
    ("eth", dec!(3000)),
    ("weth", dec!(3000)),
    ("usdt", dec!(1)),
    ("usdc", dec!(1)),
    ("dai", dec!(1)),
    ("bnb", dec!(310)),
    ("sol", dec!(100)),
    ("xrp", dec!(0.6)),
    ("ltc", dec!(70)),
    ("doge", dec!(0.08)),
    ("trx", dec!(0.11)),
    ("matic", dec!(0.8)),
];

const NATIVE: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// `(chain_id, symbol, name, address, decimals)`
const TOKENS: &[(u64, &str, &str, &str, u8)] = &[
    (1, "ETH", "Ether", NATIVE, 18),
    (1, "USDT", "Tether USD", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
    (1, "USDC", "USD Coin", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
    (1, "WBTC", "Wrapped BTC", "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", 8),
    (1, "DAI", "Dai Stablecoin", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
    (56, "BNB", "BNB", NATIVE, 18),
    (56, "USDT", "Tether USD", "0x55d398326f99059fF775485246999027B3197955", 18),
    (137, "MATIC", "Polygon", NATIVE, 18),
    (137, "USDC", "USD Coin", "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359", 6),
    (42161, "ETH", "Ether", NATIVE, 18),
];

const CHAINS: &[(u64, &str, &str)] = &[
    (1, "Ethereum", "ETH"),
    (56, "BNB Smart Chain", "BNB"),
    (137, "Polygon", "MATIC"),
    (42161, "Arbitrum One", "ETH"),
];

pub(crate) fn currencies() -> Vec<String> {
    CURRENCIES.iter().map(|c| c.to_string()).collect()
}

fn usd_price(symbol: &str) -> Option<Decimal> {
    let symbol = symbol.trim();
    USD_PRICES
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, price)| *price)
}

/// `amount` of `from` expressed in `to`, or `None` for unpriced assets and
/// amounts outside the decimal range.
pub(crate) fn convert(from: &str, to: &str, amount: Decimal) -> Option<Decimal> {
    let from_price = usd_price(from)?;
    let to_price = usd_price(to)?;
    let converted = amount.checked_mul(from_price)?.checked_div(to_price)?;
    Some(
        converted
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero)
            .normalize(),
    )
}

pub(crate) fn exchange_amount(from: &str, to: &str, amount: Decimal) -> Option<String> {
    convert(from, to, amount).map(|a| a.to_string())
}

pub(crate) fn dex_quote(
    from_token: &str,
    to_token: &str,
    chain_id: u64,
    amount: Decimal,
    slippage: Decimal,
) -> Option<DexQuote> {
    let amount_out = convert(from_token, to_token, amount)?;
    let min_out = amount_out
        .checked_mul(Decimal::ONE_HUNDRED - slippage)?
        .checked_div(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero)
        .normalize();

    Some(DexQuote {
        from_token: from_token.to_string(),
        to_token: to_token.to_string(),
        chain_id,
        amount_in: amount.to_string(),
        amount_out: amount_out.to_string(),
        min_amount_out: Some(min_out.to_string()),
        price_impact: Some("0.1".to_string()),
        estimated_gas: Some("150000".to_string()),
        slippage,
    })
}

pub(crate) fn tokens(chain_id: Option<u64>) -> Vec<DexToken> {
    TOKENS
        .iter()
        .filter(|(chain, ..)| chain_id.map_or(true, |id| id == *chain))
        .map(|(chain, symbol, name, address, decimals)| DexToken {
            symbol: symbol.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            decimals: *decimals,
            chain_id: *chain,
            logo_uri: None,
        })
        .collect()
}

pub(crate) fn chains() -> Vec<DexChain> {
    CHAINS
        .iter()
        .map(|(chain_id, name, native)| DexChain {
            chain_id: *chain_id,
            name: name.to_string(),
            native_token: native.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_uses_usd_cross_rate() {
        assert_eq!(convert("BTC", "eth", dec!(1)), Some(dec!(14.33333333)));
        assert_eq!(convert("usd", "usdt", dec!(250)), Some(dec!(250)));
        assert_eq!(convert("btc", "unlisted", dec!(1)), None);
    }

    #[test]
    fn out_of_range_amounts_have_no_demo_value() {
        assert_eq!(convert("btc", "usd", Decimal::MAX), None);
        assert!(dex_quote("wbtc", "usdc", 1, Decimal::MAX, dec!(1)).is_none());
    }

    #[test]
    fn dex_quote_applies_slippage_floor() {
        let quote = dex_quote("usdc", "dai", 1, dec!(100), dec!(1)).unwrap();
        assert_eq!(quote.amount_out, "100");
        assert_eq!(quote.min_amount_out.as_deref(), Some("99"));
    }

    #[test]
    fn tokens_filter_by_chain() {
        assert!(tokens(Some(56)).iter().all(|t| t.chain_id == 56));
        assert_eq!(tokens(None).len(), TOKENS.len());
        assert!(tokens(Some(999)).is_empty());
    }
}
