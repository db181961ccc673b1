//! Mock endpoint definitions.
//!
//! A [`MockDefinition`] is what the registry stores and what the dispatcher
//! replays. New definitions are never built field by field from client input;
//! they go through [`MockPayload`] (JSON) or [`MockForm`] (form fields), which
//! apply defaults, clamp the delay and validate everything the dispatcher will
//! later need to render.

use crate::error::AdminError;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest artificial delay a mock may carry, in milliseconds.
pub const MAX_DELAY_MS: u64 = 2000;

/// Method used when a definition does not name one.
pub const DEFAULT_METHOD: &str = "GET";

/// Status used when a definition does not name one.
pub const DEFAULT_STATUS: u16 = 200;

/// A stored response definition, keyed by `(path, method)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDefinition {
    /// Exact request path this mock answers
    pub path: String,
    /// Exact request method this mock answers
    pub method: String,
    /// Body to replay, if any
    #[serde(default)]
    pub response_body: Option<ResponseBody>,
    /// Headers to replay
    #[serde(default)]
    pub response_headers: HashMap<String, String>,
    /// Status code to replay
    pub status_code: u16,
    /// Artificial latency before responding
    pub delay_ms: u64,
}

/// Response body of a mock.
///
/// Strings are replayed byte for byte; anything else is serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Raw text, written as-is
    Text(String),
    /// Structured value, written as JSON
    Json(serde_json::Value),
}

impl ResponseBody {
    /// Interpret a free-form string: valid JSON becomes a structured body,
    /// everything else (and JSON strings) stays raw text.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Null) => None,
            Ok(serde_json::Value::String(text)) => Some(ResponseBody::Text(text)),
            Ok(value) => Some(ResponseBody::Json(value)),
            Err(_) => Some(ResponseBody::Text(raw.to_string())),
        }
    }
}

/// A validated definition ready to be added to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMock {
    pub definition: MockDefinition,
    /// Whether the requested delay exceeded [`MAX_DELAY_MS`]
    pub delay_clamped: bool,
}

impl NewMock {
    /// Human-readable confirmation for the admin API.
    pub fn message(&self) -> String {
        let mut message = format!(
            "Mock endpoint created: {} {}",
            self.definition.method, self.definition.path
        );
        if self.delay_clamped {
            message.push_str(&format!(
                ". Your delay is set to: {}ms, as the maximum value",
                self.definition.delay_ms
            ));
        }
        message
    }
}

/// Creation payload accepted as JSON by the admin API.
///
/// Field names match the listing output. Unknown keys are ignored here;
/// configuration files go through the stricter `config::MockEntry`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockPayload {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub response_body: Option<ResponseBody>,
    #[serde(default)]
    pub response_headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub delay_ms: i64,
}

impl MockPayload {
    /// Apply defaults and clamping, then validate.
    pub fn into_mock(self) -> Result<NewMock, AdminError> {
        if self.path.is_empty() {
            return Err(AdminError::validation("Path is required"));
        }

        let method = if self.method.is_empty() {
            DEFAULT_METHOD.to_string()
        } else {
            self.method
        };
        Method::from_bytes(method.as_bytes())
            .map_err(|_| AdminError::validation(format!("Invalid method: {method:?}")))?;

        let status_code = match self.status_code {
            0 => DEFAULT_STATUS,
            // 1xx codes are interim and cannot end an exchange
            code @ 200..=599 => code as u16,
            other => {
                return Err(AdminError::validation(format!(
                    "Invalid status code: {other}"
                )))
            }
        };

        let response_headers = self.response_headers.unwrap_or_default();
        for (name, value) in &response_headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| AdminError::validation(format!("Invalid header name: {name:?}")))?;
            HeaderValue::from_str(value).map_err(|_| {
                AdminError::validation(format!("Invalid value for header {name:?}"))
            })?;
        }

        let (delay_ms, delay_clamped) = clamp_delay(self.delay_ms);

        let response_body = match self.response_body {
            Some(ResponseBody::Json(serde_json::Value::Null)) => None,
            body => body,
        };

        Ok(NewMock {
            definition: MockDefinition {
                path: self.path,
                method,
                response_body,
                response_headers,
                status_code,
                delay_ms,
            },
            delay_clamped,
        })
    }
}

/// Creation payload submitted as `application/x-www-form-urlencoded` fields.
///
/// Every field arrives as a string; `response_headers` carries a JSON object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockForm {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub delay_ms: String,
    #[serde(default)]
    pub response_headers: String,
    #[serde(default)]
    pub response_body: String,
}

impl MockForm {
    /// Convert form fields to a payload.
    ///
    /// Unparsable numbers fall back to their defaults; malformed header JSON
    /// is rejected.
    pub fn into_payload(self) -> Result<MockPayload, AdminError> {
        let response_headers = if self.response_headers.trim().is_empty() {
            None
        } else {
            let headers: HashMap<String, String> = serde_json::from_str(&self.response_headers)
                .map_err(|_| {
                    AdminError::validation(
                        "Invalid response_headers: expected a JSON object of strings",
                    )
                })?;
            Some(headers)
        };

        let response_body = if self.response_body.is_empty() {
            None
        } else {
            ResponseBody::parse_lenient(&self.response_body)
        };

        Ok(MockPayload {
            path: self.path,
            method: self.method,
            response_body,
            response_headers,
            status_code: self.status_code.trim().parse().unwrap_or(0),
            delay_ms: self.delay_ms.trim().parse().unwrap_or(0),
        })
    }
}

/// Clamp a requested delay into `[0, MAX_DELAY_MS]`.
///
/// Returns the stored delay and whether the upper bound was applied.
pub fn clamp_delay(requested: i64) -> (u64, bool) {
    if requested <= 0 {
        (0, false)
    } else if requested as u64 > MAX_DELAY_MS {
        (MAX_DELAY_MS, true)
    } else {
        (requested as u64, false)
    }
}
