//! Request handlers
//!
//! Thin layer: validate the body, consult the analyzer, hand approved code
//! to the sandbox, shape the response. Anything past input validation
//! answers with the uniform `{stdout, stderr}` pair -- a safety rejection
//! renders exactly like a snippet that ran and printed an error, which is
//! what the editor frontend expects.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::state::AppState;

type JsonBody = Result<Json<Value>, JsonRejection>;

/// POST /execute/python
pub async fn execute_python(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> (StatusCode, Json<Value>) {
    let Ok(Json(body)) = body else {
        return client_error("Request body must be JSON");
    };
    let code = match extract_code(&body) {
        Ok(code) => code,
        Err(message) => return client_error(message),
    };

    let verdict = state.policy.check(code);
    if !verdict.approved {
        debug!(reason = %verdict.reason(), "snippet rejected by analyzer");
        // Deliberately 200: the caller renders this like any runtime error
        return (
            StatusCode::OK,
            Json(json!({
                "stdout": "",
                "stderr": format!("Security error: {}. Execution aborted.", verdict.reason()),
            })),
        );
    }

    let output = state.sandbox.run(code).await;
    (
        StatusCode::OK,
        Json(json!({
            "stdout": output.stdout,
            "stderr": output.stderr,
        })),
    )
}

/// GET /filesystem
pub async fn load_filesystem(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.store.load() {
        Ok(entries) => (StatusCode::OK, Json(Value::Array(entries))),
        Err(e) => {
            warn!(error = %e, "failed to load filesystem data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

/// POST /filesystem
pub async fn save_filesystem(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> (StatusCode, Json<Value>) {
    let Ok(Json(body)) = body else {
        return client_error("Request body must be JSON");
    };
    let Some(entries) = body.as_array() else {
        return client_error("Invalid data format. Expected a list.");
    };

    match state.store.save(entries) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => {
            warn!(error = %e, "failed to save filesystem data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

/// Pull the required `code` string out of the request body.
///
/// Absence or a wrong type is a client-input error, reported before the
/// analyzer ever sees the text.
fn extract_code(body: &Value) -> Result<&str, &'static str> {
    match body.get("code") {
        None => Err("Missing 'code' in request body"),
        Some(value) => value.as_str().ok_or("'code' must be a string"),
    }
}

fn client_error(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
