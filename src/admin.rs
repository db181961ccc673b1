//! Admin API for managing mocks at runtime.
//!
//! - `GET    /admin/mocks` lists every mock as JSON
//! - `POST   /admin/mocks` registers a mock from a JSON body or form fields
//! - `DELETE /admin/mocks?path=..&method=..` removes a mock

use crate::error::AdminError;
use crate::mock::{MockDefinition, MockForm, MockPayload};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Route of the admin API.
pub const MOCKS_PATH: &str = "/admin/mocks";

/// Confirmation body for successful mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters identifying the mock to delete.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// List every registered mock.
pub async fn list_mocks(State(state): State<AppState>) -> Json<Vec<MockDefinition>> {
    let mocks = state.registry.list().await;
    debug!(count = mocks.len(), "Listing mock endpoints");
    Json(mocks)
}

/// Register a mock, replacing any existing one for the same route.
pub async fn create_mock(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), AdminError> {
    let payload = if is_form(&headers) {
        parse_form(&body)?
    } else {
        parse_json(&body)?
    };

    let new_mock = payload.into_mock()?;
    let message = new_mock.message();
    let mock = new_mock.definition;

    info!(
        method = %mock.method,
        path = %mock.path,
        status = mock.status_code,
        delay_ms = mock.delay_ms,
        clamped = new_mock.delay_clamped,
        "Mock endpoint added"
    );
    state.registry.add(mock).await;

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Remove the mock named by the `path` and `method` query parameters.
pub async fn delete_mock(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<MessageResponse>, AdminError> {
    let path = params.path.filter(|p| !p.is_empty());
    let method = params.method.filter(|m| !m.is_empty());
    let (Some(path), Some(method)) = (path, method) else {
        return Err(AdminError::validation(
            "Path and method parameters are required",
        ));
    };

    if !state.registry.delete(&path, &method).await {
        return Err(AdminError::not_found(format!(
            "Endpoint not found: {method} {path}"
        )));
    }

    info!(method = %method, path = %path, "Mock endpoint deleted");
    Ok(Json(MessageResponse {
        message: format!("Mock endpoint deleted: {method} {path}"),
    }))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn parse_json(body: &[u8]) -> Result<MockPayload, AdminError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected mock payload");
        AdminError::validation("Invalid JSON format")
    })
}

fn parse_form(body: &[u8]) -> Result<MockPayload, AdminError> {
    let form: MockForm = serde_urlencoded::from_bytes(body)
        .map_err(|_| AdminError::validation("Failed to parse form"))?;
    form.into_payload()
}
