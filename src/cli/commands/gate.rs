use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use url::Url;

use crate::gate::{DEFAULT_ALLOWED_ROLES, DEFAULT_SESSION_COOKIE};

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_SESSION_COOKIE: &str = "session-cookie";
pub const ARG_PUBLIC_PREFIX: &str = "public-prefix";
pub const ARG_ALLOWED_ROLE: &str = "allowed-role";

#[derive(Debug)]
pub struct Options {
    pub upstream_url: Url,
    pub session_cookie: String,
    pub public_prefixes: Vec<String>,
    pub allowed_roles: Vec<String>,
}

impl Options {
    /// Parse gate arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the upstream URL is invalid or a public prefix does not start with `/`.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let upstream_url = matches
            .get_one::<String>(ARG_UPSTREAM_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_UPSTREAM_URL}"))?;
        let upstream_url =
            super::backend::base_url(upstream_url).context("invalid RAILGATE_UPSTREAM_URL")?;

        let session_cookie = matches
            .get_one::<String>(ARG_SESSION_COOKIE)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());

        let public_prefixes = collect_values(matches, ARG_PUBLIC_PREFIX);
        if let Some(bad) = public_prefixes.iter().find(|p| !p.starts_with('/')) {
            anyhow::bail!("public prefix must start with '/': {bad}");
        }

        Ok(Self {
            upstream_url,
            session_cookie,
            public_prefixes,
            allowed_roles: collect_values(matches, ARG_ALLOWED_ROLE),
        })
    }
}

fn collect_values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| {
            values
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .long(ARG_UPSTREAM_URL)
                .help("Portal frontend that receives requests allowed by the gate")
                .env("RAILGATE_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE)
                .long(ARG_SESSION_COOKIE)
                .help("Cookie holding the session access token")
                .env("RAILGATE_SESSION_COOKIE")
                .default_value(DEFAULT_SESSION_COOKIE),
        )
        .arg(
            Arg::new(ARG_PUBLIC_PREFIX)
                .long(ARG_PUBLIC_PREFIX)
                .help("Extra path prefix reachable without a session (repeatable)")
                .env("RAILGATE_PUBLIC_PREFIXES")
                .action(ArgAction::Append)
                .value_delimiter(','),
        )
        .arg(
            Arg::new(ARG_ALLOWED_ROLE)
                .long(ARG_ALLOWED_ROLE)
                .help("Role expected on the portal; others are logged, not blocked (repeatable)")
                .env("RAILGATE_ALLOWED_ROLES")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(DEFAULT_ALLOWED_ROLES),
        )
}
