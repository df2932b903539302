// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Fiat on-ramp
//!
//! Static provider and payment-method tables, provider selection and fee
//! computation for fiat quotes.
//!
//! | Piece | Purpose |
//! |-------|---------|
//! | [`FiatCatalog`] | Immutable provider and payment-method tables |
//! | [`select_provider`] | Best available provider for a method and amount |
//! | [`compute_fees`] | Provider fee, 2% platform fee, total |

mod catalog;
mod fees;
mod selector;

pub use catalog::{CatalogError, FeeSpec, FiatCatalog, FiatProvider, PaymentMethod, PaymentMethodType};
pub use fees::{compute_fees, FeeBreakdown, PLATFORM_FEE_RATE};
pub use selector::{method_matches, select_provider};
