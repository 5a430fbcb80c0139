//! HTTP handlers served by the gate itself; everything else is proxied.

pub mod health;
pub mod proxy;

pub use self::proxy::Upstream;
