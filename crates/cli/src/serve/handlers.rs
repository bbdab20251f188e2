//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use trace_contract::{
    dispatch, lifecycle, ContractError, Failure, Response as ContractResponse, StaticIdentity,
};

use super::identity::caller_from_headers;
use super::json_error;
use super::state::AppState;

/// Body of `POST /invoke/{function}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct InvokeRequest {
    #[serde(default)]
    pub(crate) args: Vec<String>,
}

/// HTTP status for a contract failure kind.
pub(crate) fn status_for(failure: &Failure) -> StatusCode {
    if failure.invariant_violation {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    match failure.kind.as_str() {
        "ArityError" | "InvalidArgument" | "UnknownTransition" | "MissingOperation"
        | "UnrecognizedOperation" => StatusCode::BAD_REQUEST,
        "Unauthorized" => StatusCode::FORBIDDEN,
        "ProductNotFound" | "NotFound" => StatusCode::NOT_FOUND,
        "DuplicateProduct" | "IllegalTransition" | "ConcurrentConflict" | "IndexNotInitialized" => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure_response(failure: &Failure) -> Response {
    let body = serde_json::json!({
        "error": failure.message,
        "kind": failure.kind,
        "invariantViolation": failure.invariant_violation,
    });
    (status_for(failure), Json(body)).into_response()
}

fn contract_response(response: ContractResponse) -> Response {
    match response {
        ContractResponse::Success(bytes) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], bytes).into_response()
        }
        ContractResponse::Failure(failure) => failure_response(&failure),
    }
}

fn error_response(err: &ContractError) -> Response {
    failure_response(&Failure::from(err))
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /lifecycle
pub(crate) async fn handle_lifecycle() -> impl IntoResponse {
    let response = serde_json::json!({
        "initial": lifecycle::initial_state(),
        "edges": lifecycle::edges(),
    });
    (StatusCode::OK, Json(response))
}

/// POST /init
pub(crate) async fn handle_init(State(state): State<Arc<AppState>>) -> Response {
    match dispatch::init(&state.engine, &[]).await {
        ContractResponse::Success(_) => {
            (StatusCode::OK, Json(serde_json::json!({ "initialized": true }))).into_response()
        }
        ContractResponse::Failure(failure) => failure_response(&failure),
    }
}

/// POST /invoke/{function}
pub(crate) async fn handle_invoke(
    State(state): State<Arc<AppState>>,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(request): Json<InvokeRequest>,
) -> Response {
    let caller = caller_from_headers(&headers);
    contract_response(dispatch::invoke(&state.engine, &caller, &function, &request.args).await)
}

/// GET /query/{key}
pub(crate) async fn handle_query(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let caller = StaticIdentity::anonymous();
    contract_response(dispatch::invoke(&state.engine, &caller, "query", &[key]).await)
}

/// GET /products
pub(crate) async fn handle_list_products(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.product_index().await {
        Ok(index) => (StatusCode::OK, Json(serde_json::json!({ "products": index }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /products/{productId}
pub(crate) async fn handle_get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Response {
    match state.engine.product(&product_id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(&e),
    }
}
