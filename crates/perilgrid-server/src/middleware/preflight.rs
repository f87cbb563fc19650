// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Browser preflight requests must pass the access-control check with an
/// HTTP ok status before any route-specific logic runs, on every route.
pub(crate) async fn preflight_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
