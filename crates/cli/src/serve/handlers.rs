//! HTTP route handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crucible_core::{group_status, instance_passed, latest_results, summarize, Context};
use crucible_runner::RunnerError;
use crucible_storage::Repository;

use super::json_error;
use super::state::AppState;

fn runner_error_response(error: RunnerError) -> Response {
    match &error {
        RunnerError::NoPendingWait { .. } => {
            json_error(StatusCode::CONFLICT, &error.to_string())
        }
        RunnerError::ResultNotFound { .. } | RunnerError::UnknownSequence { .. } => {
            json_error(StatusCode::NOT_FOUND, &error.to_string())
        }
        RunnerError::Token(_) => json_error(StatusCode::BAD_REQUEST, &error.to_string()),
        RunnerError::Storage(_) => {
            log::error!("storage failure: {}", error);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /sequences
pub(crate) async fn handle_list_sequences(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sequences: Vec<serde_json::Value> = state
        .registry
        .sequences()
        .map(|sequence| {
            serde_json::json!({
                "name": sequence.name,
                "title": sequence.title,
                "description": sequence.description,
                "required": sequence.required,
                "test_case": sequence.test_case,
                "requires": sequence.requires,
                "defines": sequence.defines,
                "test_count": sequence.total_tests(),
            })
        })
        .collect();
    Json(serde_json::json!({"sequences": sequences}))
}

/// POST /instances
///
/// Body: a JSON object of context parameters to seed (server URL,
/// credentials, patient id, ...). Returns the new instance id.
pub(crate) async fn handle_create_instance(
    State(state): State<Arc<AppState>>,
    Json(params): Json<serde_json::Value>,
) -> Response {
    let object = match params {
        serde_json::Value::Object(object) => object,
        serde_json::Value::Null => serde_json::Map::new(),
        _ => return json_error(StatusCode::BAD_REQUEST, "expected a JSON object"),
    };

    let instance_id = AppState::new_instance_id();
    let mut context = Context::new();
    for (key, value) in object {
        context.seed(key, value);
    }
    if let Err(e) = state.repository.save_context(&instance_id, &context).await {
        log::error!("failed to save context: {}", e);
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure");
    }
    (
        StatusCode::CREATED,
        Json(serde_json::json!({"instance_id": instance_id})),
    )
        .into_response()
}

/// POST /instances/{id}/sequences/{name}
pub(crate) async fn handle_run_sequence(
    State(state): State<Arc<AppState>>,
    Path((instance_id, sequence_name)): Path<(String, String)>,
) -> Response {
    match state.runner.start(&instance_id, &sequence_name).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => runner_error_response(e),
    }
}

#[derive(serde::Deserialize)]
pub(crate) struct CancelBody {
    reason: Option<String>,
}

/// POST /results/{id}/cancel
pub(crate) async fn handle_cancel(
    State(state): State<Arc<AppState>>,
    Path(result_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Response {
    let reason = body
        .as_ref()
        .and_then(|b| b.reason.as_deref())
        .unwrap_or("cancelled by operator");
    match state.runner.cancel(&result_id, reason).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => runner_error_response(e),
    }
}

/// GET /instances/{id}/results
///
/// Latest result per sequence, group rollups, and the instance's overall
/// outcome.
pub(crate) async fn handle_instance_results(
    State(state): State<Arc<AppState>>,
    Path(instance_id): Path<String>,
) -> Response {
    let all = match state.repository.list(&instance_id).await {
        Ok(all) => all,
        Err(e) => {
            log::error!("failed to list results: {}", e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure");
        }
    };
    let latest = latest_results(&all);

    let sequences: Vec<serde_json::Value> = state
        .registry
        .sequences()
        .map(|sequence| {
            let result = latest.get(sequence.name.as_str());
            serde_json::json!({
                "name": sequence.name,
                "required": sequence.required,
                "test_case": sequence.test_case,
                "status": result.map(|r| r.status.as_str()),
                "result_id": result.map(|r| r.id.clone()),
                "created_at": result.map(|r| r.created_at.clone()),
                "summary": result.map(|r| summarize(&r.results)),
            })
        })
        .collect();

    // Grouped view keyed by logical test case, in registration order.
    let mut test_cases: Vec<&str> = Vec::new();
    for sequence in state.registry.sequences() {
        if let Some(test_case) = sequence.test_case.as_deref() {
            if !test_cases.contains(&test_case) {
                test_cases.push(test_case);
            }
        }
    }
    let groups: Vec<serde_json::Value> = test_cases
        .into_iter()
        .map(|test_case| {
            let statuses = state
                .registry
                .sequences()
                .filter(|s| s.test_case.as_deref() == Some(test_case))
                .map(|s| latest.get(s.name.as_str()).map(|r| r.status));
            serde_json::json!({
                "test_case": test_case,
                "status": group_status(statuses),
            })
        })
        .collect();

    Json(serde_json::json!({
        "instance_id": instance_id,
        "passed": instance_passed(&state.registry, &all),
        "sequences": sequences,
        "groups": groups,
    }))
    .into_response()
}

/// GET /callback/{endpoint}
///
/// The redirect target the authorization server sends the end user back
/// to. The signed `state` parameter correlates the callback with the
/// suspended sequence result; all query parameters are merged into the
/// instance context before the run resumes.
pub(crate) async fn handle_callback(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let token = match params.get("state") {
        Some(token) => token.clone(),
        None => return json_error(StatusCode::BAD_REQUEST, "missing state parameter"),
    };

    let claims = match state.runner.verify_token(&token) {
        Ok(claims) => claims,
        Err(e) => return runner_error_response(e),
    };
    if claims.endpoint != endpoint {
        return json_error(
            StatusCode::BAD_REQUEST,
            &format!(
                "token was issued for endpoint '{}', not '{}'",
                claims.endpoint, endpoint
            ),
        );
    }

    match state.runner.resume(&claims.result_id, params).await {
        Ok(result) => Json(serde_json::json!({
            "message": "callback received; sequence resumed",
            "sequence_name": result.sequence_name,
            "status": result.status.as_str(),
        }))
        .into_response(),
        Err(e) => runner_error_response(e),
    }
}
