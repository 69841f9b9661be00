// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;

use reqwest::Client;

use crate::cache::token_cache::TokenCache;
use crate::sources::oauth2::{Credentials, OAuth2Source};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Token cache wired to a stand-in OAuth2 token endpoint.
pub fn cache_for(token_url: String, credentials: Option<Credentials>) -> TokenCache {
    TokenCache::new(OAuth2Source::new(build_reqwest_client(), token_url, credentials))
}

pub fn test_credentials() -> Option<Credentials> {
    Credentials::from_parts(
        Some("test-client-id".to_owned()),
        Some("test-client-secret".to_owned()),
    )
}
