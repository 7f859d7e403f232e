//! `crucible serve` -- HTTP JSON API for hosting test instances.
//!
//! Exposes instance creation, sequence runs, result aggregation, and the
//! resume-callback endpoint the authorization server redirects back to.
//! Built on `axum` + `tokio` with permissive CORS for local development.
//!
//! Endpoints:
//! - GET  /health                              - Server status
//! - GET  /sequences                           - Registered sequences
//! - POST /instances                           - Create a test instance
//! - POST /instances/{id}/sequences/{name}     - Run a sequence
//! - POST /results/{id}/cancel                 - Cancel a running/waiting result
//! - GET  /instances/{id}/results              - Latest results + rollup
//! - GET  /callback/{endpoint}                 - Resume callback (redirect target)
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod state;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_callback, handle_cancel, handle_create_instance, handle_health,
    handle_instance_results, handle_list_sequences, handle_not_found, handle_run_sequence,
};
use self::state::AppState;

/// Construct a JSON error response with the given status code and message.
pub(crate) fn json_error(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Start the HTTP server on the given port.
pub(crate) async fn start_server(port: u16) {
    let state = match AppState::new() {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("error building sequence registry: {}", e);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/sequences", get(handle_list_sequences))
        .route("/instances", post(handle_create_instance))
        .route(
            "/instances/{id}/sequences/{name}",
            post(handle_run_sequence),
        )
        .route("/results/{id}/cancel", post(handle_cancel))
        .route("/instances/{id}/results", get(handle_instance_results))
        .route("/callback/{endpoint}", get(handle_callback))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    eprintln!("Crucible listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("server error: {}", e);
        std::process::exit(1);
    }
}
