use crate::gate::AccessGate;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware::from_fn_with_state,
    routing::get,
    Extension, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
pub mod middleware;
mod openapi;

pub use self::handlers::Upstream;
pub use self::openapi::openapi;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the gated application: gate-owned routes plus the upstream proxy fallback.
pub fn router(gate: Arc<AccessGate>, upstream: Arc<Upstream>, pool: PgPool) -> Router {
    let routes = Router::new()
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .route("/openapi.json", get(openapi::openapi_json))
        .fallback(handlers::proxy::proxy)
        .layer(Extension(upstream))
        .layer(Extension(pool));

    gated(routes, gate)
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                ))),
        )
}

/// Put any router behind the access gate.
pub fn gated(router: Router, gate: Arc<AccessGate>) -> Router {
    router.layer(from_fn_with_state(gate, middleware::access_gate))
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(
    port: u16,
    gate: Arc<AccessGate>,
    upstream: Arc<Upstream>,
    pool: PgPool,
) -> Result<()> {
    let app = router(gate, upstream, pool);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
