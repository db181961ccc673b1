//! Request dispatch: resolve a request against the registry and replay the
//! stored mock.

use crate::config::GlobalSettings;
use crate::error::{MockNotFound, RenderError};
use crate::mock::{MockDefinition, ResponseBody};
use crate::registry::Registry;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Body sent when a stored mock cannot be turned into a response.
const RENDER_FAILED_BODY: &str = "Failed to render mock response";

/// Resolves incoming requests to stored mocks.
pub struct Dispatcher {
    registry: Arc<Registry>,
    settings: GlobalSettings,
    /// Total requests dispatched.
    requests_total: AtomicU64,
    /// Requests answered by a mock.
    requests_matched: AtomicU64,
    /// Requests that matched nothing.
    requests_unmatched: AtomicU64,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, settings: GlobalSettings) -> Self {
        Self {
            registry,
            settings,
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
        }
    }

    /// Get total requests dispatched.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get total requests answered by a mock.
    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    /// Get total requests that matched nothing.
    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }

    /// Answer a request with the mock registered for `(path, method)`.
    ///
    /// The mock's delay is awaited before any part of the response is built,
    /// and the full delay is waited out even if the client has gone away.
    /// A mock that cannot be rendered is logged at `error` and answered with
    /// a 500.
    ///
    /// Writing the returned response happens in hyper's connection task after
    /// this returns. A failed write, e.g. a client that disconnected during
    /// the delay, closes only that connection; axum reports it at `trace`
    /// level, so it is invisible at the default `info` level.
    pub async fn dispatch(&self, method: &str, path: &str) -> Result<Response, MockNotFound> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let Some(mock) = self.registry.get(path, method).await else {
            self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
            if self.settings.log_unmatched {
                warn!(method = %method, path = %path, "No mock endpoint registered");
            }
            return Err(MockNotFound {
                method: method.to_string(),
                path: path.to_string(),
            });
        };

        self.requests_matched.fetch_add(1, Ordering::Relaxed);
        if self.settings.log_matches {
            info!(
                method = %mock.method,
                path = %mock.path,
                status = mock.status_code,
                "Request matched mock endpoint"
            );
        }

        if mock.delay_ms > 0 {
            debug!(path = %mock.path, delay_ms = mock.delay_ms, "Applying delay");
            tokio::time::sleep(Duration::from_millis(mock.delay_ms)).await;
        }

        match render(&mock) {
            Ok(response) => Ok(response),
            Err(err) => {
                error!(
                    method = %mock.method,
                    path = %mock.path,
                    error = %err,
                    "Failed to render mock response"
                );
                let response = (StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED_BODY);
                Ok(response.into_response())
            }
        }
    }
}

/// Build the HTTP response described by a mock.
///
/// Text bodies are written verbatim with no content type added. Structured
/// bodies are serialized as JSON and get `application/json` unless the mock
/// already sets a content type.
pub fn render(mock: &MockDefinition) -> Result<Response, RenderError> {
    let status = StatusCode::from_u16(mock.status_code)
        .map_err(|_| RenderError::InvalidStatus(mock.status_code))?;

    let mut headers = HeaderMap::with_capacity(mock.response_headers.len() + 1);
    for (name, value) in &mock.response_headers {
        let invalid = || RenderError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(header_name, header_value);
    }

    let body = match &mock.response_body {
        None | Some(ResponseBody::Json(serde_json::Value::Null)) => Body::empty(),
        Some(ResponseBody::Text(text)) => Body::from(text.clone()),
        Some(ResponseBody::Json(value)) => {
            let bytes = serde_json::to_vec(value)?;
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Body::from(bytes)
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
