// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Upstream RPC
//!
//! Every upstream call is a JSON-RPC 2.0 envelope POSTed to one of the
//! aggregator endpoints:
//!
//! 1. [`RequestEnvelope`] - method + params with a fresh UUID
//! 2. [`sign`] - serialize once, HMAC-SHA512 the bytes with the private key
//! 3. [`ApiTransport::send`] - POST with `api-key` / `sign` headers, bounded
//!    by a hard timeout, response classified into [`ErrorKind`]s

pub mod envelope;
pub mod signing;
pub mod transport;

pub use envelope::{RequestEnvelope, JSONRPC_VERSION};
pub use signing::{sign, SignError, SignedRequest};
pub use transport::{
    classify_response, ApiTransport, ErrorKind, TransportError, API_KEY_HEADER, SIGNATURE_HEADER,
};
