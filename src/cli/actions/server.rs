use crate::{
    api::{self, Upstream},
    gate::{AccessGate, PgUserRepository, RemoteSessionProvider, RouteTable},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub auth_url: Url,
    pub auth_anon_key: SecretString,
    pub upstream_url: Url,
    pub session_cookie: String,
    pub public_prefixes: Vec<String>,
    pub allowed_roles: Vec<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database pool, auth client, or server cannot be set up.
pub async fn execute(args: Args) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    let sessions = RemoteSessionProvider::new(&args.auth_url, args.auth_anon_key)
        .context("Failed to build auth service client")?;
    let users = PgUserRepository::new(pool.clone());

    let routes = RouteTable::default().with_public_prefixes(&args.public_prefixes);
    debug!("Public prefixes: {:?}", routes.public_prefixes());

    let gate = AccessGate::new(Arc::new(sessions), Arc::new(users))
        .with_routes(routes)
        .with_cookie_name(args.session_cookie)
        .with_allowed_roles(args.allowed_roles);

    let upstream = Upstream::new(args.upstream_url)?;
    info!("Proxying allowed requests to {}", upstream.base());

    api::new(args.port, Arc::new(gate), Arc::new(upstream), pool).await
}
