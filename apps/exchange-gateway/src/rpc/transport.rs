// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed HTTP transport and response classification.

use std::time::{Duration, Instant};

use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::signing::SignedRequest;

/// Header carrying the public API key. Fixed by the upstream.
pub const API_KEY_HEADER: &str = "api-key";
/// Header carrying the hex HMAC of the body. Fixed by the upstream.
pub const SIGNATURE_HEADER: &str = "sign";

/// Why an upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    NetworkError,
    AuthRejected,
    Forbidden,
    BadRequest,
    RateLimited,
    UpstreamServerError,
    UnexpectedStatus,
    ApplicationError,
    MalformedResponse,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::AuthRejected => "auth_rejected",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamServerError => "upstream_server_error",
            ErrorKind::UnexpectedStatus => "unexpected_status",
            ErrorKind::ApplicationError => "application_error",
            ErrorKind::MalformedResponse => "malformed_response",
        }
    }

    /// The upstream was unreachable or broken rather than refusing the
    /// request; read-only callers may substitute demo data.
    pub fn is_unavailability(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::NetworkError | ErrorKind::UpstreamServerError
        )
    }

    fn for_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::AuthRejected,
            403 => ErrorKind::Forbidden,
            429 => ErrorKind::RateLimited,
            s if s >= 500 => ErrorKind::UpstreamServerError,
            _ => ErrorKind::UnexpectedStatus,
        }
    }
}

/// A classified upstream failure.
///
/// `message` is written for people; the upstream's own text stays in
/// `upstream_message` and `raw_body`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
    pub upstream_code: Option<i64>,
    pub upstream_message: Option<String>,
    pub raw_body: Option<String>,
}

impl TransportError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            upstream_code: None,
            upstream_message: None,
            raw_body: None,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("upstream did not respond within {}s", after.as_secs_f32()),
        )
    }

    pub fn network(reason: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::NetworkError, format!("could not reach upstream: {reason}"))
    }

    /// A 2xx payload that does not have the shape an operation expects.
    pub fn malformed(reason: impl Into<String>, raw: &Value) -> Self {
        let mut err = Self::new(ErrorKind::MalformedResponse, reason);
        err.raw_body = Some(raw.to_string());
        err
    }

    fn from_status(status: u16, body: &str, parsed: Option<&Value>) -> Self {
        let kind = ErrorKind::for_status(status);
        let (upstream_code, upstream_message) = parsed
            .and_then(|v| v.get("error"))
            .map(upstream_error_fields)
            .unwrap_or_default();

        let message = match kind {
            ErrorKind::AuthRejected => {
                "upstream rejected the API credentials (invalid keys or sandbox/production mismatch)"
                    .to_string()
            }
            ErrorKind::Forbidden => "upstream refused access to this operation".to_string(),
            ErrorKind::BadRequest => match &upstream_message {
                Some(msg) => format!("upstream reported a bad request: {msg}"),
                None => "upstream reported a bad request".to_string(),
            },
            ErrorKind::RateLimited => "upstream rate limit exceeded".to_string(),
            ErrorKind::UpstreamServerError => format!("upstream service error (HTTP {status})"),
            _ => format!("unexpected upstream response status {status}"),
        };

        Self {
            kind,
            message,
            http_status: Some(status),
            upstream_code,
            upstream_message,
            raw_body: Some(body.to_string()),
        }
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout(timeout)
        } else {
            Self::network(err)
        }
    }
}

/// Classify an upstream response and unwrap its payload.
///
/// The body is taken as text so that parse failures keep the raw content.
pub fn classify_response(status: u16, body: &str) -> Result<Value, TransportError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        return Err(TransportError::from_status(status, body, parsed.as_ref()));
    }

    let Some(value) = parsed else {
        let mut err = TransportError::new(
            ErrorKind::MalformedResponse,
            "upstream returned a response that is not valid JSON",
        );
        err.http_status = Some(status);
        err.raw_body = Some(body.to_string());
        return Err(err);
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let (upstream_code, upstream_message) = upstream_error_fields(error);
        let message = format!(
            "upstream rejected the request: {}",
            upstream_message.as_deref().unwrap_or("no message given")
        );
        return Err(TransportError {
            kind: ErrorKind::ApplicationError,
            message,
            http_status: Some(status),
            upstream_code,
            upstream_message,
            raw_body: Some(body.to_string()),
        });
    }

    match value {
        Value::Object(mut map) => match map.remove("result") {
            Some(result) => Ok(result),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

fn upstream_error_fields(error: &Value) -> (Option<i64>, Option<String>) {
    match error {
        Value::String(message) => (None, Some(message.clone())),
        Value::Object(fields) => (
            fields.get("code").and_then(Value::as_i64),
            fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        _ => (None, None),
    }
}

/// Sends signed requests. One POST per call, never retried here.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    http: Client,
    timeout: Duration,
}

impl ApiTransport {
    /// Fails only when the HTTP client cannot be built (TLS backend setup).
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().build()?;
        Ok(Self::with_client(http, timeout))
    }

    pub fn with_client(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `request` to `endpoint` and classify the outcome.
    ///
    /// The whole exchange (connect, send, read body) is bounded by the
    /// transport timeout; on expiry the in-flight future is dropped.
    pub async fn send(&self, request: &SignedRequest, endpoint: &Url) -> Result<Value, TransportError> {
        let started = Instant::now();
        let request_id = request.envelope().id();
        let method = request.envelope().method();

        let exchanged = match tokio::time::timeout(self.timeout, self.exchange(request, endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout(self.timeout)),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        let outcome = exchanged.and_then(|(status, body)| {
            info!(
                request_id = %request_id,
                method = %method,
                endpoint = %endpoint,
                status,
                latency_ms,
                "Upstream call completed"
            );
            classify_response(status, &body)
        });

        if let Err(e) = &outcome {
            warn!(
                request_id = %request_id,
                method = %method,
                endpoint = %endpoint,
                kind = e.kind.code(),
                status = e.http_status,
                upstream_code = e.upstream_code,
                latency_ms,
                error = %e,
                "Upstream call failed"
            );
        }

        outcome
    }

    async fn exchange(
        &self,
        request: &SignedRequest,
        endpoint: &Url,
    ) -> Result<(u16, String), TransportError> {
        let response = self
            .http
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, request.api_key())
            .header(SIGNATURE_HEADER, request.signature())
            .body(request.body().to_string())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::rpc::{sign, signing::hmac_sha512_hex, RequestEnvelope};
    use crate::testing::{self, MockReply, MockUpstream};
    use serde_json::json;

    #[test]
    fn status_codes_map_to_kinds() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::AuthRejected),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::UnexpectedStatus),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::UpstreamServerError),
            (503, ErrorKind::UpstreamServerError),
            (302, ErrorKind::UnexpectedStatus),
        ];
        for (status, kind) in cases {
            let err = classify_response(status, "oops").unwrap_err();
            assert_eq!(err.kind, kind, "status {status}");
            assert_eq!(err.http_status, Some(status));
            assert_eq!(err.raw_body.as_deref(), Some("oops"));
        }
    }

    #[test]
    fn unauthorized_message_is_distinct_from_raw_body() {
        let err = classify_response(401, r#"{"error":{"code":-32600,"message":"Unauthorized"}}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthRejected);
        assert!(err.message.contains("sandbox/production"));
        assert_eq!(err.upstream_message.as_deref(), Some("Unauthorized"));
        assert_eq!(err.upstream_code, Some(-32600));
    }

    #[test]
    fn error_object_in_ok_response_is_application_error() {
        let err = classify_response(200, r#"{"error":{"message":"x"}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ApplicationError);
        assert_eq!(err.upstream_message.as_deref(), Some("x"));
        assert!(err.to_string().contains('x'));
        assert!(!err.kind.is_unavailability());
    }

    #[test]
    fn null_error_is_ignored() {
        let value = classify_response(200, r#"{"id":"1","jsonrpc":"2.0","result":["btc"],"error":null}"#)
            .unwrap();
        assert_eq!(value, json!(["btc"]));
    }

    #[test]
    fn result_wrapper_is_unwrapped() {
        let value = classify_response(200, r#"{"id":"1","jsonrpc":"2.0","result":"14.3"}"#).unwrap();
        assert_eq!(value, json!("14.3"));
    }

    #[test]
    fn unwrapped_payload_is_returned_whole() {
        let value = classify_response(200, r#"{"amountOut":"10","priceImpact":"0.1"}"#).unwrap();
        assert_eq!(value, json!({ "amountOut": "10", "priceImpact": "0.1" }));
    }

    #[test]
    fn non_json_success_keeps_raw_body() {
        let err = classify_response(200, "<html>maintenance</html>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
        assert_eq!(err.raw_body.as_deref(), Some("<html>maintenance</html>"));
    }

    #[test]
    fn unavailability_kinds() {
        assert!(ErrorKind::Timeout.is_unavailability());
        assert!(ErrorKind::NetworkError.is_unavailability());
        assert!(ErrorKind::UpstreamServerError.is_unavailability());
        assert!(!ErrorKind::AuthRejected.is_unavailability());
        assert!(!ErrorKind::RateLimited.is_unavailability());
    }

    fn signed(method: &str) -> SignedRequest {
        let credentials = Credentials::new(testing::PUBLIC_KEY, testing::PRIVATE_KEY);
        sign(RequestEnvelope::new(method, json!({ "from": "btc" })), &credentials).unwrap()
    }

    #[tokio::test]
    async fn transmitted_body_and_signature_match_what_was_signed() {
        let upstream = MockUpstream::start(|_| MockReply::ok(r#"{"result":true}"#)).await;
        let transport = ApiTransport::new(Duration::from_secs(5)).unwrap();
        let request = signed("getCurrencies");

        transport.send(&request, &upstream.url()).await.unwrap();

        let captured = upstream.requests();
        assert_eq!(captured.len(), 1);
        let received = &captured[0];
        assert_eq!(received.body, request.body());
        assert_eq!(received.header(API_KEY_HEADER).as_deref(), Some(testing::PUBLIC_KEY));
        assert_eq!(
            received.header(CONTENT_TYPE.as_str()).as_deref(),
            Some("application/json")
        );

        let rederived =
            hmac_sha512_hex(testing::PRIVATE_KEY.as_bytes(), received.body.as_bytes()).unwrap();
        assert_eq!(received.header(SIGNATURE_HEADER), Some(rederived));
    }

    #[tokio::test]
    async fn http_401_is_auth_rejected() {
        let upstream = MockUpstream::start(|_| MockReply::status(401, "Unauthorized")).await;
        let transport = ApiTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport
            .send(&signed("getCurrencies"), &upstream.url())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthRejected);
        assert_eq!(err.raw_body.as_deref(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let upstream = MockUpstream::start(|_| {
            MockReply::ok(r#"{"result":"late"}"#).delayed(Duration::from_secs(5))
        })
        .await;
        let transport = ApiTransport::new(Duration::from_millis(200)).unwrap();

        let started = Instant::now();
        let err = transport
            .send(&signed("getCurrencies"), &upstream.url())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let url = testing::unreachable_url().await;
        let transport = ApiTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport.send(&signed("getCurrencies"), &url).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert!(err.http_status.is_none());
    }
}
