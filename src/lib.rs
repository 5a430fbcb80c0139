//! # Railgate (Records Portal Access Gate)
//!
//! `railgate` sits in front of the Railway Police records portal and decides,
//! per request, whether the caller may reach the page they asked for.
//!
//! ## Decision table
//!
//! - No session on a public or auth page: allow.
//! - No session anywhere else: redirect to `/login`.
//! - Session on an auth page: consult the user profile. First-login users are
//!   pushed to `/change-password`; onboarded users leaving `/change-password`
//!   go to `/dashboard`. Profile lookup failures fail open.
//! - Session on any other page: allow. The destination page enforces roles.
//! - Session lookup failure: redirect to `/login`, unless already on `/login`
//!   or `/`.
//!
//! Session and profile lookups are injected through the [`gate::SessionProvider`]
//! and [`gate::UserRepository`] traits so the table can run without a backend.

pub mod api;
pub mod cli;
pub mod gate;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
