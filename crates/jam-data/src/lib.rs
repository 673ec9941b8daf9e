//! HTTP client utilities for the jamjar backend.
//!
//! Provides a small builder API over `reqwest` with a base URL, default
//! headers, bearer authentication, timeouts, retries and fully buffered
//! responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use jam_data::FetchClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Zone {
//!     zona_id: String,
//!     nombre: String,
//! }
//!
//! let client = FetchClient::new()?.with_base_url("https://api.example.com/api");
//!
//! let body = client.get("/zonas/activas").send().await?.error_for_status()?;
//! let zones: Vec<Zone> = serde_json::from_slice(body.bytes())?;
//!
//! let report = client
//!     .post("/carrito/validar-stock")
//!     .json(&body)?
//!     .send()
//!     .await?
//!     .error_for_status()?;
//! ```

mod error;
mod request;
mod response;
mod retry;
mod timeout;

use std::collections::HashMap;

pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;
pub use retry::{BackoffStrategy, RetryCondition, RetryPolicy};
pub use timeout::TimeoutConfig;

/// HTTP client for making outbound requests.
///
/// Cheap to clone: the connection pool is shared.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    retry: RetryPolicy,
}

impl FetchClient {
    /// Create a client with the default timeouts.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(TimeoutConfig::default())
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(timeout: TimeoutConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout.connect)
            .timeout(timeout.total)
            .build()
            .map_err(|e| FetchError::RequestError(format!("failed to build client: {}", e)))?;

        Ok(Self {
            http,
            base_url: None,
            default_headers: HashMap::new(),
            retry: RetryPolicy::default(),
        })
    }

    /// Set a base URL that will be prepended to relative request paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate every request with a bearer token.
    pub fn with_bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_default_header("Authorization", value)
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Post, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        let builder = RequestBuilder::new(method, self.resolve_url(url.into()))
            .headers(self.default_headers.clone());
        ClientRequestBuilder {
            client: self,
            builder,
        }
    }

    fn resolve_url(&self, url: String) -> String {
        match &self.base_url {
            Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
            _ => url,
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder<'a> {
    client: &'a FetchClient,
    builder: RequestBuilder,
}

impl ClientRequestBuilder<'_> {
    /// Append a query parameter. Empty values are skipped.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// The resolved request URL.
    pub fn url(&self) -> &str {
        self.builder.url()
    }

    /// Send the request, retrying according to the client's policy.
    ///
    /// A 5xx response that exhausts the retries is returned as-is; use
    /// [`Response::error_for_status`] to turn it into an error.
    pub async fn send(self) -> Result<Response, FetchError> {
        let policy = &self.client.retry;
        let mut attempt = 0;

        loop {
            let outcome = self.send_once().await;
            let retry = match &outcome {
                Ok(resp) => policy.should_retry_status(resp.status, attempt),
                Err(FetchError::Timeout) => policy.should_retry_timeout(attempt),
                Err(FetchError::RequestError(_)) => policy.should_retry_connection(attempt),
                Err(_) => false,
            };

            if !retry {
                return outcome;
            }

            let delay = policy.backoff.delay_for_attempt(attempt);
            match &outcome {
                Ok(resp) => tracing::warn!(
                    method = self.builder.method.as_str(),
                    url = %self.builder.url,
                    status = resp.status,
                    attempt,
                    ?delay,
                    "retrying request"
                ),
                Err(e) => tracing::warn!(
                    method = self.builder.method.as_str(),
                    url = %self.builder.url,
                    error = %e,
                    attempt,
                    ?delay,
                    "retrying request"
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(&self) -> Result<Response, FetchError> {
        let b = &self.builder;
        let mut url = reqwest::Url::parse(&b.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", b.url, e)))?;
        if !b.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&b.query);
        }

        let mut request = self.client.http.request(b.method.to_reqwest(), url);
        for (key, value) in &b.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &b.body {
            request = request.body(body.clone());
        }

        let started = std::time::Instant::now();
        let response = request.send().await?;
        let response = Response::read(response).await?;

        tracing::debug!(
            method = b.method.as_str(),
            url = %b.url,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(response)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Method, Response, RetryPolicy, TimeoutConfig};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_resolve_url() {
        let client = FetchClient::new().unwrap().with_base_url("https://api.test/api/");
        assert_eq!(
            client.get("/carrito/calcular").url(),
            "https://api.test/api/carrito/calcular"
        );
        assert_eq!(client.get("zonas").url(), "https://api.test/api/zonas");
        assert_eq!(client.get("http://other/x").url(), "http://other/x");
    }

    #[test]
    fn test_default_headers_applied() {
        let client = FetchClient::new().unwrap().with_bearer_token("secret");
        let req = client.get("http://x");
        assert_eq!(
            req.builder.headers.get("Authorization").map(String::as_str),
            Some("Bearer secret")
        );
    }

    #[tokio::test]
    async fn test_post_json_round_trip() {
        let app = Router::new().route(
            "/echo",
            post(|Json(body): Json<serde_json::Value>| async move { Json(body) }),
        );
        let base = serve(app).await;
        let client = FetchClient::new().unwrap().with_base_url(base);

        let resp = client
            .post("/echo")
            .json(&serde_json::json!({"items": [{"producto_id": "jam-1", "cantidad": 2}]}))
            .unwrap()
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap();
        let echoed: serde_json::Value = serde_json::from_slice(resp.bytes()).unwrap();
        assert_eq!(echoed["items"][0]["cantidad"], 2);
    }

    #[tokio::test]
    async fn test_query_parameters_sent() {
        let app = Router::new().route(
            "/envio",
            get(|axum::extract::RawQuery(q): axum::extract::RawQuery| async move {
                q.unwrap_or_default()
            }),
        );
        let base = serve(app).await;
        let client = FetchClient::new().unwrap().with_base_url(base);

        let resp = client
            .get("/envio")
            .query("subtotal", 40)
            .query("zona_id", "Z1")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.text().unwrap(), "subtotal=40&zona_id=Z1");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/flaky",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy")
                    } else {
                        (StatusCode::OK, "ok")
                    }
                }
            }),
        );
        let base = serve(app).await;
        let client = FetchClient::new()
            .unwrap()
            .with_base_url(base)
            .with_retry_policy(RetryPolicy::new(2).with_backoff(BackoffStrategy::None));

        let resp = client.get("/flaky").send().await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/missing",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (StatusCode::NOT_FOUND, r#"{"detail":"no existe"}"#) }
            }),
        );
        let base = serve(app).await;
        let client = FetchClient::new()
            .unwrap()
            .with_base_url(base)
            .with_retry_policy(RetryPolicy::new(3).with_backoff(BackoffStrategy::None));

        let resp = client.get("/missing").send().await.unwrap();
        let err = resp.error_for_status().unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FetchClient::new()
            .unwrap()
            .with_retry_policy(RetryPolicy::none());
        let err = client.get(format!("http://{}/x", addr)).send().await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err:?}");
    }
}
