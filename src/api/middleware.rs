//! axum middleware that applies the access gate to every request.

use axum::{
    extract::{Request, State},
    http::{uri::PathAndQuery, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::gate::{routes::canonical_path, AccessGate, Decision};

/// Run the gate and either pass the request on or answer with a `307` redirect.
///
/// The request URI is rewritten to its canonical path first, so the proxy
/// forwards exactly the path the gate classified.
pub async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = canonical_path(request.uri().path());

    if path != request.uri().path() {
        match with_path(request.uri(), &path) {
            Ok(uri) => *request.uri_mut() = uri,
            Err(err) => {
                debug!(path, "failed to rewrite request path: {err}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    }

    match gate.evaluate(&path, request.headers()).await {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => {
            debug!(path, target = target.path(), "access gate redirect");
            Redirect::temporary(target.path()).into_response()
        }
    }
}

fn with_path(uri: &Uri, path: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_path_keeps_query() {
        let uri: Uri = "/_next/../fir?station=HWH".parse().unwrap();
        let rewritten = with_path(&uri, "/fir").unwrap();
        assert_eq!(rewritten.to_string(), "/fir?station=HWH");
    }

    #[test]
    fn with_path_keeps_authority() {
        let uri: Uri = "http://portal.local/static/%2e%2e/bail".parse().unwrap();
        let rewritten = with_path(&uri, "/bail").unwrap();
        assert_eq!(rewritten.to_string(), "http://portal.local/bail");
    }
}
