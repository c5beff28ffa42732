// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API client: routing, signing, sending and the stale-signature retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::signer::SIGNATURE_PARAM;
use crate::auth::{AuthMode, Credentials, SigningStrategy, TokenVerifier};
use crate::context::SigningContext;
use crate::error::{SdkError, SIGNATURE_EXPIRED_CODE};
use crate::params::Params;
use crate::response::ApiResponse;
use crate::transport::{HttpRequest, HttpTransport, Transport, DEFAULT_TIMEOUT};

/// Data center used when none is configured.
pub const DEFAULT_API_DOMAIN: &str = "us1.gigya.com";

/// Value of the `sdk` parameter sent with every request.
pub const SDK_VERSION: &str = concat!("rust_", env!("CARGO_PKG_VERSION"));

/// Parameter that overrides the request host. Never sent.
pub const HOST_OVERRIDE_PARAM: &str = "_host";

const HTTP_METHOD: &str = "POST";

/// Host and path for an API method on a data center.
///
/// `getUserInfo` goes to `socialize.<domain>/socialize.getUserInfo`;
/// `accounts.login` goes to `accounts.<domain>/accounts.login`.
pub fn route(api_method: &str, domain: &str) -> (String, String) {
    match api_method.split_once('.') {
        None => (
            format!("socialize.{domain}"),
            format!("/socialize.{api_method}"),
        ),
        Some((namespace, _)) => (format!("{namespace}.{domain}"), format!("/{api_method}")),
    }
}

/// Client for one set of credentials on one data center.
pub struct ApiClient<T: Transport = HttpTransport> {
    strategy: SigningStrategy,
    api_key: Option<String>,
    domain: String,
    use_https: bool,
    timeout: Duration,
    headers: Vec<(String, String)>,
    context: Arc<SigningContext>,
    transport: Arc<T>,
}

impl ApiClient<HttpTransport> {
    /// Client with its own reqwest transport and a fresh signing context.
    pub fn new(credentials: &Credentials, domain: impl Into<String>) -> Result<Self, SdkError> {
        let transport = Arc::new(HttpTransport::new()?);
        Self::with_transport(credentials, domain, transport, SigningContext::shared())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(
        credentials: &Credentials,
        domain: impl Into<String>,
        transport: Arc<T>,
        context: Arc<SigningContext>,
    ) -> Result<Self, SdkError> {
        let strategy = SigningStrategy::from_credentials(credentials)?;
        let domain = domain.into();
        let domain = if domain.trim().is_empty() {
            DEFAULT_API_DOMAIN.to_string()
        } else {
            domain
        };
        Ok(Self {
            strategy,
            api_key: credentials.api_key().map(str::to_string),
            domain,
            use_https: true,
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            context,
            transport,
        })
    }

    /// Plain HTTP is only used when this is off and the mode allows it.
    pub fn use_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra header sent with every request, after the signer's headers.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the credentials and re-resolve the mode.
    pub fn set_credentials(&mut self, credentials: &Credentials) -> Result<(), SdkError> {
        self.strategy = SigningStrategy::from_credentials(credentials)?;
        self.api_key = credentials.api_key().map(str::to_string);
        Ok(())
    }

    pub fn mode(&self) -> AuthMode {
        self.strategy.mode()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn context(&self) -> &Arc<SigningContext> {
        &self.context
    }

    fn scheme(&self) -> &'static str {
        if self.use_https || self.strategy.mode().requires_https() {
            "https"
        } else {
            "http"
        }
    }

    /// Route, apply default parameters and sign.
    pub fn prepare(&self, api_method: &str, params: &mut Params) -> Result<HttpRequest, SdkError> {
        let (default_host, path) = route(api_method, &self.domain);
        let host = params
            .remove(HOST_OVERRIDE_PARAM)
            .and_then(|v| v.signing_value())
            .unwrap_or(default_host);

        if !params.contains_key("format") {
            params.set("format", "json");
        }
        if !params.contains_key("httpStatusCodes") {
            params.set("httpStatusCodes", false);
        }
        if !params.contains_key("sdk") {
            params.set("sdk", SDK_VERSION);
        }

        let scheme = self.scheme();
        let resource_url = format!("{scheme}://{host}{path}");
        let signed = self
            .strategy
            .sign(params, HTTP_METHOD, &resource_url, self.context.clock())?;

        let mut headers = signed.headers;
        headers.extend(self.headers.iter().cloned());

        Ok(HttpRequest {
            method: HTTP_METHOD.to_string(),
            scheme: scheme.to_string(),
            host,
            path,
            params: params.clone(),
            headers,
            identity: signed.identity,
            timeout: self.timeout,
        })
    }

    /// Send an API method call.
    ///
    /// A 403002 (stale timestamp) response is retried exactly once with a
    /// fresh timestamp and nonce, after the clock offset has been updated
    /// from that response. A second 403002 is returned to the caller.
    pub async fn send(&self, api_method: &str, params: Params) -> Result<ApiResponse, SdkError> {
        let mut params = params;
        let mut retried = false;

        loop {
            let request = self.prepare(api_method, &mut params)?;
            info!(
                api_method,
                host = %request.host,
                mode = %self.strategy.mode(),
                retry = retried,
                "Sending API request"
            );

            let raw = self.transport.send(&request).await?;
            if let Some(date) = raw.header("date") {
                self.context.clock().observe_date_header(date);
            }

            let response = ApiResponse::from_raw(raw);
            if response.error_code == SIGNATURE_EXPIRED_CODE && !retried {
                warn!(
                    api_method,
                    offset_secs = self.context.clock().offset_secs(),
                    "Request signature expired; retrying once"
                );
                retried = true;
                params.remove(SIGNATURE_PARAM);
                continue;
            }

            if !response.is_success() {
                info!(api_method, error_code = response.error_code, "API request returned an error");
            }
            return Ok(response);
        }
    }

    /// Verify a platform-issued token against this client's API key and
    /// data center.
    pub async fn verify_token(&self, token: &str) -> Result<String, SdkError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SdkError::InsufficientCredentials("apiKey is required to verify tokens".into())
        })?;
        let uid = TokenVerifier::new(self.context.clone(), self.transport.clone())
            .verify(token, api_key, &self.domain)
            .await?;
        Ok(uid)
    }
}
