// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC 2.0 request envelope.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const JSONRPC_VERSION: &str = "2.0";

/// Upstream request body. Every envelope gets a fresh id, used to correlate
/// gateway logs with upstream support tickets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    id: Uuid,
    jsonrpc: &'static str,
    method: String,
    params: Value,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Value {
        &self.params
    }
}
