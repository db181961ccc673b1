//! HTTP server wiring: admin routes plus the mock-serving fallback.

use crate::admin::{self, MOCKS_PATH};
use crate::config::GlobalSettings;
use crate::dispatcher::Dispatcher;
use crate::error::MockNotFound;
use crate::registry::Registry;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, settings: GlobalSettings) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), settings));
        Self {
            registry,
            dispatcher,
        }
    }
}

/// Build the router. Every request outside the admin API is answered from
/// the registry.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            MOCKS_PATH,
            get(admin::list_mocks)
                .post(admin::create_mock)
                .delete(admin::delete_mock),
        )
        .fallback(serve_mock)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn serve_mock(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, MockNotFound> {
    state.dispatcher.dispatch(method.as_str(), uri.path()).await
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Mock server listening");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_summary(&state).await;
    Ok(())
}

/// Log request totals and the number of registered mocks.
async fn log_summary(state: &AppState) {
    let dispatcher = &state.dispatcher;
    info!(
        requests = dispatcher.total_requests(),
        matched = dispatcher.total_matched(),
        unmatched = dispatcher.total_unmatched(),
        mocks = state.registry.len().await,
        "Mock server stopped"
    );
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::MessageResponse;
    use crate::config::MockServerConfig;
    use crate::error::NOT_FOUND_BODY;
    use crate::mock::MockDefinition;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Arc::new(Registry::new()), GlobalSettings::default())
    }

    async fn send(
        state: &AppState,
        request: Request<Body>,
    ) -> (StatusCode, HeaderSnapshot, Vec<u8>) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, HeaderSnapshot { content_type }, body)
    }

    struct HeaderSnapshot {
        content_type: Option<String>,
    }

    fn post_json(value: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(MOCKS_PATH)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_serve_text() {
        let state = test_state();

        let (status, _, body) = send(
            &state,
            post_json(json!({
                "path": "/x",
                "method": "GET",
                "status_code": 201,
                "response_body": "hello"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let message: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.message, "Mock endpoint created: GET /x");

        let (status, headers, body) = send(&state, request("GET", "/x")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers.content_type, None);
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_create_then_serve_json() {
        let state = test_state();
        send(
            &state,
            post_json(json!({"path": "/y", "method": "POST", "response_body": {"a": 1}})),
        )
        .await;

        let (status, headers, body) = send(&state, request("POST", "/y")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.content_type.as_deref(), Some("application/json"));
        assert_eq!(body, br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_unregistered_route() {
        let state = test_state();
        let (status, _, body) = send(&state, request("GET", "/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_query_string_ignored_for_matching() {
        let state = test_state();
        let create = post_json(json!({"path": "/q", "response_body": "q"}));
        send(&state, create).await;

        let (status, _, body) = send(&state, request("GET", "/q?page=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"q");
    }

    #[tokio::test]
    async fn test_create_clamps_delay() {
        let state = test_state();
        let (status, _, body) = send(
            &state,
            post_json(json!({"path": "/slow", "delay_ms": 5000})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let message: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert!(message.message.contains("2000ms"));

        let mock = state.registry.get("/slow", "GET").await.unwrap();
        assert_eq!(mock.delay_ms, 2000);
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let state = test_state();

        let invalid_json = Request::builder()
            .method("POST")
            .uri(MOCKS_PATH)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let (status, _, body) = send(&state, invalid_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Invalid JSON format");

        let (status, _, body) = send(&state, post_json(json!({"method": "GET"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Path is required");

        assert_eq!(state.registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_informational_status_not_registered() {
        let state = test_state();
        let create = post_json(json!({"path": "/cont", "status_code": 100}));

        let (status, _, body) = send(&state, create).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Invalid status code: 100");

        let (status, _, _) = send(&state, request("GET", "/cont")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_counters_track_routed_requests() {
        let state = test_state();
        let create = post_json(json!({"path": "/counted"}));
        send(&state, create).await;
        send(&state, request("GET", MOCKS_PATH)).await;

        send(&state, request("GET", "/counted")).await;
        send(&state, request("GET", "/missing")).await;

        let dispatcher = &state.dispatcher;
        assert_eq!(dispatcher.total_requests(), 2);
        assert_eq!(dispatcher.total_matched(), 1);
        assert_eq!(dispatcher.total_unmatched(), 1);
    }

    #[tokio::test]
    async fn test_create_from_form() {
        let state = test_state();
        let form = Request::builder()
            .method("POST")
            .uri(MOCKS_PATH)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "path=%2Fform&method=PUT&status_code=202&response_body=%7B%22ok%22%3Atrue%7D",
            ))
            .unwrap();
        let (status, _, _) = send(&state, form).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, headers, body) = send(&state, request("PUT", "/form")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(headers.content_type.as_deref(), Some("application/json"));
        assert_eq!(body, br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_list_mocks() {
        let state = test_state();
        MockServerConfig::builtin()
            .unwrap()
            .seed(&state.registry)
            .await
            .unwrap();

        let (status, headers, body) = send(&state, request("GET", MOCKS_PATH)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.content_type.as_deref(), Some("application/json"));

        let mocks: Vec<MockDefinition> = serde_json::from_slice(&body).unwrap();
        assert_eq!(mocks.len(), 3);

        let listed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let first = &listed[0];
        assert_eq!(first["path"], "/api/v1/health");
        assert_eq!(first["status_code"], 200);
        assert_eq!(first["delay_ms"], 0);
        assert_eq!(first["response_body"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_delete_mock() {
        let state = test_state();
        let create = post_json(json!({"path": "/gone", "method": "DELETE"}));
        send(&state, create).await;

        let (status, _, body) = send(
            &state,
            request("DELETE", "/admin/mocks?path=/gone&method=DELETE"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let message: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.message, "Mock endpoint deleted: DELETE /gone");

        let (status, _, _) = send(&state, request("DELETE", "/gone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_errors() {
        let state = test_state();

        let (status, _, body) = send(&state, request("DELETE", "/admin/mocks?path=/x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Path and method parameters are required");

        let (status, _, body) = send(
            &state,
            request("DELETE", "/admin/mocks?path=/never&method=GET"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint not found: GET /never");
    }

    #[tokio::test]
    async fn test_admin_rejects_other_methods() {
        let state = test_state();
        let (status, _, _) = send(&state, request("PUT", MOCKS_PATH)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
