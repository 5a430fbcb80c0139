use thiserror::Error;

/// Failures raised by the gate's injected capabilities.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("session lookup failed: {0}")]
    SessionLookup(String),
    #[error("auth service returned unexpected status {0}")]
    SessionStatus(u16),
    #[error("profile lookup failed: {0}")]
    ProfileLookup(String),
}

impl From<reqwest::Error> for GateError {
    fn from(err: reqwest::Error) -> Self {
        Self::SessionLookup(err.to_string())
    }
}

impl From<sqlx::Error> for GateError {
    fn from(err: sqlx::Error) -> Self {
        Self::ProfileLookup(err.to_string())
    }
}
