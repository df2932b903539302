// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the gateway. Configuration is loaded from the environment once
//! at startup into a [`GatewayConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CHANGELLY_API_URL` | Crypto-swap JSON-RPC endpoint | `https://api.changelly.com` |
//! | `CHANGELLY_FIAT_API_URL` | Fiat ramp JSON-RPC endpoint | `https://fiat-api.changelly.com/v1` |
//! | `CHANGELLY_DEX_API_URL` | DEX aggregator JSON-RPC endpoint | `https://dex-api.changelly.com/v1` |
//! | `GATEWAY_REQUEST_TIMEOUT_SECS` | Hard timeout per upstream call | `30` |
//! | `GATEWAY_DEMO_FALLBACK` | Serve labeled demo data when upstream is unreachable | `false` |
//! | `GATEWAY_STRICT_CREDENTIALS` | Require 20+ character API keys | `true` |
//! | `GATEWAY_SECRETS_DIR` | Directory of mounted secret files (vault) | Optional |
//! | `FIAT_CATALOG_PATH` | JSON file replacing the built-in provider catalog | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Credential variable names are listed in [`crate::credentials`].

use std::{path::PathBuf, time::Duration};

use url::Url;

use crate::fiat::CatalogError;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const API_URL_ENV: &str = "CHANGELLY_API_URL";
pub const FIAT_API_URL_ENV: &str = "CHANGELLY_FIAT_API_URL";
pub const DEX_API_URL_ENV: &str = "CHANGELLY_DEX_API_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "GATEWAY_REQUEST_TIMEOUT_SECS";
pub const DEMO_FALLBACK_ENV: &str = "GATEWAY_DEMO_FALLBACK";
pub const STRICT_CREDENTIALS_ENV: &str = "GATEWAY_STRICT_CREDENTIALS";

/// Directory holding one file per secret (file name = secret name).
///
/// Typically a vault or orchestrator secret mount such as `/run/secrets`.
pub const SECRETS_DIR_ENV: &str = "GATEWAY_SECRETS_DIR";

pub const FIAT_CATALOG_PATH_ENV: &str = "FIAT_CATALOG_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_URL: &str = "https://api.changelly.com";
const DEFAULT_FIAT_API_URL: &str = "https://fiat-api.changelly.com/v1";
const DEFAULT_DEX_API_URL: &str = "https://dex-api.changelly.com/v1";

/// Upstream calls are cancelled after this long unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} has an invalid value `{value}`: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything other than `json` means pretty output.
    pub fn from_env() -> Self {
        match env_optional(LOG_FORMAT_ENV).as_deref().map(str::to_ascii_lowercase) {
            Some(value) if value == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Upstream JSON-RPC endpoints, one per API family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub swap: Url,
    pub fiat: Url,
    pub dex: Url,
}

impl Endpoints {
    pub fn new(swap: Url, fiat: Url, dex: Url) -> Self {
        Self { swap, fiat, dex }
    }
}

/// Gateway configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    pub demo_fallback: bool,
    pub strict_credentials: bool,
    pub secrets_dir: Option<PathBuf>,
    pub fiat_catalog_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_optional)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// The lookup returns `None` for unset or blank variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV,
                value: raw.clone(),
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let endpoints = Endpoints {
            swap: parse_url(API_URL_ENV, lookup(API_URL_ENV), DEFAULT_API_URL)?,
            fiat: parse_url(FIAT_API_URL_ENV, lookup(FIAT_API_URL_ENV), DEFAULT_FIAT_API_URL)?,
            dex: parse_url(DEX_API_URL_ENV, lookup(DEX_API_URL_ENV), DEFAULT_DEX_API_URL)?,
        };

        let request_timeout = match lookup(REQUEST_TIMEOUT_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: REQUEST_TIMEOUT_ENV,
                        value: raw,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            host,
            port,
            endpoints,
            request_timeout,
            demo_fallback: parse_flag(DEMO_FALLBACK_ENV, lookup(DEMO_FALLBACK_ENV), false)?,
            strict_credentials: parse_flag(
                STRICT_CREDENTIALS_ENV,
                lookup(STRICT_CREDENTIALS_ENV),
                true,
            )?,
            secrets_dir: lookup(SECRETS_DIR_ENV).map(PathBuf::from),
            fiat_catalog_path: lookup(FIAT_CATALOG_PATH_ENV).map(PathBuf::from),
        })
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read an environment variable, treating blank values as unset.
pub fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(name: &'static str, raw: Option<String>, default: &str) -> Result<Url, ConfigError> {
    let value = raw.unwrap_or_else(|| default.to_string());
    let url = Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            name,
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

fn parse_flag(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw,
            reason: "expected true or false",
        }),
    }
}
