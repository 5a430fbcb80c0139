//! Forward requests that passed the gate to the portal frontend.

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::{redirect, Client};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, instrument};
use url::Url;

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Clone, Debug)]
pub struct Upstream {
    client: Client,
    base: Url,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { client, base })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Map an incoming URI onto the upstream base, keeping any base path prefix.
    #[must_use]
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        let base_path = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{}", uri.path()));
        url.set_query(uri.query());
        url
    }

    #[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
    async fn forward(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let url = self.target_url(&parts.uri);

        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .context("Failed to read request body")?;

        let mut headers = parts.headers;
        let original_host = headers.remove(header::HOST);
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);
        if let Some(host) = original_host {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host);
        }

        debug!(%url, "forwarding to upstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .context("Upstream request failed")?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        let bytes = upstream
            .bytes()
            .await
            .context("Failed to read upstream body")?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop as well.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(named.iter()) {
        headers.remove(name);
    }
}

// axum fallback handler for everything the gate lets through
pub async fn proxy(upstream: Extension<Arc<Upstream>>, request: Request) -> Response {
    match upstream.forward(request).await {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to proxy request: {err:#}");

            (
                StatusCode::BAD_GATEWAY,
                [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            )
                .into_response()
        }
    }
}
