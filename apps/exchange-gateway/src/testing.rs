// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test helpers: a local mock of the upstream API and in-memory secrets.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Router,
};
use async_trait::async_trait;
use tokio::net::TcpListener;
use url::Url;

use crate::{
    config::Endpoints,
    credentials::{
        CredentialPolicy, CredentialResolver, CredentialSource, SecretStore, PRIVATE_KEY_NAME,
        PUBLIC_KEY_NAME,
    },
    fiat::FiatCatalog,
    gateway::Gateway,
    rpc::ApiTransport,
};

pub const PUBLIC_KEY: &str = "pk_live_9f3b2c71d04e4a8b";
pub const PRIVATE_KEY: &str = "sk_live_5e8a1d6c0b7f42e39a4d";

/// Canned reply for one upstream request.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// What the mock received.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

type Responder = Arc<dyn Fn(&CapturedRequest) -> MockReply + Send + Sync>;

#[derive(Clone)]
struct MockState {
    responder: Responder,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Upstream stand-in listening on an ephemeral localhost port.
pub struct MockUpstream {
    base: Url,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockUpstream {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&CapturedRequest) -> MockReply + Send + Sync + 'static,
    {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            responder: Arc::new(responder),
            captured: Arc::clone(&captured),
        };
        let app = Router::new().fallback(handle).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream server");
        });

        Self {
            base: Url::parse(&format!("http://{addr}/")).expect("mock upstream url"),
            captured,
        }
    }

    /// Swap endpoint (`/`).
    pub fn url(&self) -> Url {
        self.base.clone()
    }

    /// All three endpoint families, distinguished by path.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            self.base.clone(),
            self.base.join("fiat").expect("fiat url"),
            self.base.join("dex").expect("dex url"),
        )
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().expect("captured lock").clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let request = CapturedRequest {
        path: uri.path().to_string(),
        headers,
        body,
    };
    let reply = (state.responder)(&request);
    state.captured.lock().expect("captured lock").push(request);

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(reply.status).expect("valid status");
    (status, reply.body)
}

/// A localhost URL nothing is listening on.
pub async fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("url")
}

/// Secrets held in memory.
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    label: String,
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("MemorySecretStore")
            .field("label", &self.label)
            .field("names", &names)
            .finish()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn get(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Resolver backed by in-memory secrets holding the test key pair.
pub fn test_resolver() -> CredentialResolver {
    let store = MemorySecretStore::new("mem")
        .with(PUBLIC_KEY_NAME, PUBLIC_KEY)
        .with(PRIVATE_KEY_NAME, PRIVATE_KEY);
    CredentialResolver::new(CredentialPolicy::STRICT)
        .with_source(CredentialSource::pair(Arc::new(store)))
}

/// Gateway wired to `endpoints` with the test credentials and built-in catalog.
pub fn test_gateway(endpoints: Endpoints) -> Gateway {
    let transport = ApiTransport::new(Duration::from_secs(5)).expect("transport");
    Gateway::new(
        endpoints,
        test_resolver(),
        transport,
        Arc::new(FiatCatalog::builtin()),
    )
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_treats_blank_values_as_missing() {
        let store = MemorySecretStore::new("test")
            .with("A", " value ")
            .with("B", "   ");
        assert_eq!(store.get("A").await.as_deref(), Some("value"));
        assert_eq!(store.get("B").await, None);
        assert_eq!(store.label(), "test");
    }
}
