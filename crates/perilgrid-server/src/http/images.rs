// SPDX-License-Identifier: Apache-2.0

use crate::http::handlers::{propagated_request_id, with_request_id};
use crate::AppState;
use axum::body::Body;
use axum::extract::{Path as RoutePath, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Reduces a client-supplied filename to ASCII letters, digits and
/// `.`/`_`/`-`, then drops leading dots. Separators, parent-directory
/// tokens and root markers cannot survive. `None` means the name has no
/// safe remainder and must be treated as not-found.
pub(crate) fn sanitize_filename(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let name = kept.trim_start_matches('.');
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// Capability-scoped resolver: the only way a request-controlled name
/// becomes a filesystem path. The joined path's parent chain must stay
/// under the save directory, checked on canonicalized paths, and the
/// target must be a regular file. Every other outcome is `None`; callers
/// must not distinguish traversal from absence.
pub(crate) fn resolve_image(save_dir: &Path, raw: &str) -> Option<PathBuf> {
    let name = sanitize_filename(raw)?;
    let candidate = save_dir.join(&name);
    let root = save_dir.canonicalize().ok()?;
    let canonical_parent = candidate.parent()?.canonicalize().ok()?;
    if !canonical_parent.starts_with(&root) {
        return None;
    }
    if candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

pub(crate) async fn image_handler(
    State(state): State<AppState>,
    RoutePath(filename): RoutePath<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let resolved = resolve_image(&state.paths.save_dir, &filename);
    let resp = match resolved {
        Some(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(request_id = %request_id, file = %path.display(), "image found, sending");
                let mut resp = Response::new(Body::from(bytes));
                resp.headers_mut()
                    .insert("content-type", HeaderValue::from_static("image/png"));
                state
                    .metrics
                    .observe_request("/get-image/:filename", StatusCode::OK, started.elapsed())
                    .await;
                return with_request_id(resp, &request_id);
            }
            Err(_) => not_found(),
        },
        None => not_found(),
    };

    debug!(request_id = %request_id, "image not found");
    state
        .metrics
        .observe_request(
            "/get-image/:filename",
            StatusCode::NOT_FOUND,
            started.elapsed(),
        )
        .await;
    with_request_id(resp, &request_id)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "resource not found").into_response()
}
