// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP transport.
//!
//! The signing core hands a fully signed [`HttpRequest`] to a [`Transport`]
//! and reads back a [`RawResponse`]. [`HttpTransport`] is the reqwest-based
//! implementation; tests substitute a scripted transport.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::debug;

use crate::params::Params;
use crate::tls::ClientIdentity;

/// Timeout used when a request does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {host} timed out after {timeout_ms} ms")]
    Timeout { host: String, timeout_ms: u64 },

    #[error("request to {host} failed: {message}")]
    Request { host: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A signed request ready to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub params: Params,
    pub headers: Vec<(String, String)>,
    /// Client certificate for the TLS handshake (mTLS mode).
    pub identity: Option<Arc<ClientIdentity>>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status, headers (lower-cased names) and body of a response.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Sends signed requests.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// reqwest transport: form-encoded POST over rustls.
///
/// Clients carrying a client certificate are built once per leaf fingerprint
/// and reused. A proxy, when set, applies to every client.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    proxy: Option<Proxy>,
    mtls_clients: Mutex<HashMap<String, Client>>,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::build(None)
    }

    /// Route all requests through an HTTP(S) proxy, e.g. `http://proxy:3128`.
    pub fn with_proxy(proxy_url: &str) -> Result<Self, TransportError> {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| TransportError::Client(format!("invalid proxy URL: {e}")))?;
        Self::build(Some(proxy))
    }

    fn build(proxy: Option<Proxy>) -> Result<Self, TransportError> {
        let client = client_builder(proxy.as_ref())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            proxy,
            mtls_clients: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, identity: Option<&ClientIdentity>) -> Result<Client, TransportError> {
        let Some(identity) = identity else {
            return Ok(self.client.clone());
        };

        if let Some(client) = self
            .mtls_clients
            .lock()
            .ok()
            .and_then(|clients| clients.get(identity.fingerprint()).cloned())
        {
            return Ok(client);
        }

        let reqwest_identity = reqwest::Identity::from_pem(identity.to_pem().as_bytes())
            .map_err(|e| TransportError::Client(format!("client certificate rejected: {e}")))?;
        let client = client_builder(self.proxy.as_ref())
            .identity(reqwest_identity)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        if let Ok(mut clients) = self.mtls_clients.lock() {
            clients.insert(identity.fingerprint().to_string(), client.clone());
        }
        debug!(fingerprint = %identity.fingerprint(), "Built mTLS HTTP client");
        Ok(client)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let client = self.client_for(request.identity.as_deref())?;
        let form: Vec<(&str, String)> = request.params.signing_pairs().collect();

        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TransportError::Request {
                host: request.host.clone(),
                message: format!("invalid HTTP method: {e}"),
            }
        })?;

        let mut builder = client
            .request(method, request.url())
            .timeout(request.timeout)
            .form(&form);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| map_error(request, e))?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| map_error(request, e))?;

        Ok(RawResponse {
            status_code,
            headers,
            body,
        })
    }
}

fn client_builder(proxy: Option<&Proxy>) -> ClientBuilder {
    let builder = Client::builder().use_rustls_tls().timeout(DEFAULT_TIMEOUT);
    match proxy {
        Some(proxy) => builder.proxy(proxy.clone()),
        None => builder,
    }
}

fn map_error(request: &HttpRequest, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            host: request.host.clone(),
            timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        TransportError::Request {
            host: request.host.clone(),
            message: err.to_string(),
        }
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        self.as_ref().send(request)
    }
}
