use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_AUTH_ANON_KEY: &str = "auth-anon-key";

#[derive(Debug)]
pub struct Options {
    pub auth_url: Url,
    pub anon_key: SecretString,
}

impl Options {
    /// Parse auth backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if arguments are missing or the URL is not http(s).
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        let auth_url = read_required(ARG_AUTH_URL)?;
        let auth_url = base_url(&auth_url).context("invalid RAILGATE_AUTH_URL")?;

        Ok(Self {
            auth_url,
            anon_key: SecretString::from(read_required(ARG_AUTH_ANON_KEY)?),
        })
    }
}

/// Parse an http(s) base URL, making sure it ends with `/` so joins append.
///
/// # Errors
/// Returns an error for unparsable URLs or non-http schemes.
pub fn base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("unsupported scheme {}", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long(ARG_AUTH_URL)
                .help("Base URL of the hosted auth service, example: https://project.backend.example")
                .env("RAILGATE_AUTH_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_AUTH_ANON_KEY)
                .long(ARG_AUTH_ANON_KEY)
                .help("Public (anon) API key sent as the apikey header")
                .env("RAILGATE_AUTH_ANON_KEY")
                .hide_env_values(true)
                .required(true),
        )
}
