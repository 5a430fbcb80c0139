//! Session resolution.
//!
//! Flow Overview: pull a token from the request (bearer header first, then
//! the session cookie), then ask the auth service who it belongs to. A
//! missing or rejected token is "no session"; anything else that goes wrong
//! is an error the gate handles as a failed evaluation.

use async_trait::async_trait;
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, StatusCode,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::error::GateError;

pub const DEFAULT_SESSION_COOKIE: &str = "sb-access-token";

/// Authenticated identity for the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Resolves a session token into a session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns `Ok(None)` when the token is not recognized.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, GateError>;
}

/// Extract the session token, preferring a bearer header over the cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == cookie_name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[derive(Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Session provider backed by the hosted auth service (`/auth/v1/user`).
#[derive(Clone, Debug)]
pub struct RemoteSessionProvider {
    client: Client,
    user_url: Url,
    anon_key: SecretString,
}

impl RemoteSessionProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the URL cannot be joined.
    pub fn new(auth_url: &Url, anon_key: SecretString) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(5))
            .build()?;
        let user_url = auth_url.join("auth/v1/user")?;

        Ok(Self {
            client,
            user_url,
            anon_key,
        })
    }

    #[must_use]
    pub fn user_url(&self) -> &Url {
        &self.user_url
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    #[instrument(skip_all, fields(url = %self.user_url))]
    async fn resolve(&self, token: &str) -> Result<Option<Session>, GateError> {
        let response = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(token)
            .header("apikey", self.anon_key.expose_secret())
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("auth service rejected session token");
                Ok(None)
            }
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                }))
            }
            status => Err(GateError::SessionStatus(status.as_u16())),
        }
    }
}
