// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exchange Gateway - signed client for a crypto exchange aggregator
//!
//! This crate talks to a third-party exchange aggregator (fiat on-ramp, DEX
//! aggregator and crypto-swap JSON-RPC APIs) on behalf of a trading website:
//! it resolves API credentials, signs every request with HMAC-SHA512, picks
//! fiat providers and computes fees, and serves the operations as JSON
//! endpoints.
//!
//! ## Modules
//!
//! - `credentials` - Credential sources, resolution and validation
//! - `rpc` - JSON-RPC envelope, request signing, HTTP transport
//! - `fiat` - Provider catalog, provider selection, fee computation
//! - `gateway` - Public operation set
//! - `api` - HTTP handlers (Axum)

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fiat;
pub mod gateway;
pub mod rpc;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod testing;
