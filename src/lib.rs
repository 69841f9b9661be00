//! # Twitch Token Relay
//!
//! Fetches, caches and vends a Twitch OAuth2 client-credentials token so
//! browser-side callers never hold the client secret.
//!
//! Modules:
//! - `config` — service settings sourced from flags and environment
//! - `cache` — the cached token and its refresh lifecycle
//! - `sources` — the upstream OAuth2 client-credentials source
//! - `server` — axum routes, CORS stamp and the serve loop
//! - `observability` — Prometheus registry, scrape route, process gauges

pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod sources;
pub mod tests;
pub mod utils;

pub use crate::cache::token_cache::TokenCache;
pub use crate::config::settings::Settings;
