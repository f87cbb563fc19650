// SPDX-License-Identifier: Apache-2.0

use crate::engine::AdjustEngine;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, error, info};

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

pub(crate) async fn adjust_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    // The body carries no parameters; it is logged for operator
    // visibility and otherwise ignored.
    debug!(request_id = %request_id, body_bytes = body.len(), "adjust request received");

    let result = match state.paths.ensure_inputs() {
        Ok(()) => state.engine.adjust(&state.paths).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(table) => {
            debug!(request_id = %request_id, shape = ?table.shape(), "adjusted table ready");
            let preview = table.preview(state.api.preview_rows);
            info!(
                request_id = %request_id,
                rows = preview.len(),
                engine = state.engine.engine_tag(),
                "adjustment served"
            );
            let resp = Json(preview).into_response();
            state
                .metrics
                .observe_request("/adjust", StatusCode::OK, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "adjustment request failed");
            let resp = error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
            state
                .metrics
                .observe_request("/adjust", StatusCode::INTERNAL_SERVER_ERROR, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
    }
}

pub(crate) async fn landing_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = (
        StatusCode::OK,
        "Welcome to the perilgrid year-loss-table adjustment API. \
POST /adjust to run an adjustment; GET /get-image/:filename to fetch a generated chart.",
    )
        .into_response();
    state
        .metrics
        .observe_request("/", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.render_text().await;
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    resp
}
