//! Authenticated transport wrapped around every outbound request.
//!
//! Each call runs through three explicit stages:
//! 1. `enrich_outbound` attaches the current credential, if any
//! 2. the `Dispatch` implementation performs the call under a fixed timeout
//! 3. `inspect_inbound` reacts to a 401 by ending the session
//!
//! Credentials are read at dispatch time. Clearing the session later does not
//! touch requests already on the wire.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::SessionStore;

// ============================================================================
// Constants
// ============================================================================

/// Ceiling on how long a single request may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed entry point for the forced navigation after a rejected credential.
/// Not configurable: the router state may be unusable at that point.
pub const HARD_REDIRECT_PATH: &str = "/login";

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the dispatcher's base address, e.g. `/conversations/`
    pub target: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.headers.get(header::AUTHORIZATION)
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct InboundResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl InboundResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-success status into a classified error
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.text()))
        }
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Performs the actual network call
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, request: OutboundRequest) -> BoxFuture<'_, Result<InboundResponse, ApiError>>;
}

/// Full navigation that bypasses the in-app router
pub trait HardNavigator: Send + Sync {
    fn hard_redirect(&self, location: &str);
}

/// reqwest-backed dispatcher bound to a single base address.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDispatcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid base address '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidRequest(format!(
                "Unsupported scheme for base address '{}'",
                base_url
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a target against the base address. Only relative paths are
    /// accepted so no call can leave the configured host.
    fn url_for(&self, request: &OutboundRequest) -> Result<Url, ApiError> {
        if !request.target.starts_with('/') || request.target.starts_with("//") {
            return Err(ApiError::InvalidRequest(format!(
                "Target must be a path relative to the base address: {}",
                request.target
            )));
        }
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.target))
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", request.target, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

impl Dispatch for HttpDispatcher {
    fn dispatch(&self, request: OutboundRequest) -> BoxFuture<'_, Result<InboundResponse, ApiError>> {
        async move {
            let url = self.url_for(&request)?;
            let mut builder = self
                .client
                .request(request.method, url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

            Ok(InboundResponse::new(status, body.to_vec()))
        }
        .boxed()
    }
}

// ============================================================================
// Transport
// ============================================================================

pub struct AuthTransport<D = HttpDispatcher> {
    dispatcher: D,
    session: SessionStore,
    navigator: Arc<dyn HardNavigator>,
    timeout: Duration,
}

impl AuthTransport<HttpDispatcher> {
    /// Transport over HTTP against `base_url` with the given ceiling
    pub fn http(
        base_url: &str,
        timeout: Duration,
        session: SessionStore,
        navigator: Arc<dyn HardNavigator>,
    ) -> Result<Self, ApiError> {
        let dispatcher = HttpDispatcher::new(base_url, timeout)?;
        Ok(Self::new(dispatcher, session, navigator).with_timeout(timeout))
    }
}

impl<D: Dispatch> AuthTransport<D> {
    pub fn new(dispatcher: D, session: SessionStore, navigator: Arc<dyn HardNavigator>) -> Self {
        Self {
            dispatcher,
            session,
            navigator,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attach the current credential verbatim. Headers are left alone when
    /// there is none. Never fails.
    pub fn enrich_outbound(&self, request: &mut OutboundRequest) {
        let Some(credential) = self.session.get() else {
            return;
        };
        match HeaderValue::from_str(credential.as_str()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                warn!(path = %request.target, "Credential is not a valid header value, sending without it");
            }
        }
    }

    /// React to the server's verdict. A 401 clears the session and forces a
    /// hard redirect before the failure, with the server's body, is handed
    /// back to the caller.
    pub fn inspect_inbound(&self, response: InboundResponse) -> Result<InboundResponse, ApiError> {
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let had_session = self.session.clear();
        warn!(had_session, location = HARD_REDIRECT_PATH, "Credential rejected by server, ending session");
        self.navigator.hard_redirect(HARD_REDIRECT_PATH);
        Err(ApiError::from_status(response.status, &response.text()))
    }

    /// Send a request through the full pipeline.
    ///
    /// Statuses other than 401 come back as `Ok` untouched; use
    /// `InboundResponse::error_for_status` to classify them.
    pub async fn send(&self, mut request: OutboundRequest) -> Result<InboundResponse, ApiError> {
        self.enrich_outbound(&mut request);

        let method = request.method.clone();
        let path = request.target.clone();
        let authorized = request.authorization().is_some();
        debug!(%method, %path, authorized, "Dispatching request");

        // Dropping the dispatch future on timeout discards any late response.
        let response = match tokio::time::timeout(self.timeout, self.dispatcher.dispatch(request)).await {
            Ok(result) => result.inspect_err(|e| warn!(%method, %path, error = %e, "Request failed"))?,
            Err(_) => {
                warn!(%method, %path, timeout_secs = self.timeout.as_secs_f32(), "Request timed out");
                return Err(ApiError::Timeout(self.timeout));
            }
        };

        debug!(%method, %path, status = response.status.as_u16(), "Response received");
        self.inspect_inbound(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
