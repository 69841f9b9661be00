use anyhow::{bail, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::cache::token::Token;
use crate::helpers::time::now_i64;
use crate::utils::constants::GRANT_CLIENT_CREDENTIALS;

/// Fixed client identity of the relay, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Both halves must be non-empty; an env var set to "" counts as unset.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Self { client_id, client_secret })
            }
            _ => None,
        }
    }
}

/// Fields consumed from the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct OAuth2Source {
    client: Client,
    token_url: String,
    credentials: Option<Credentials>,
}

impl OAuth2Source {
    pub fn new(client: Client, token_url: String, credentials: Option<Credentials>) -> Self {
        Self { client, token_url, credentials }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Single POST of the client-credentials grant. Twitch takes the client
    /// identity as query parameters on this endpoint.
    pub async fn fetch_token(&self, credentials: &Credentials) -> Result<Token> {
        let response = self
            .client
            .post(&self.token_url)
            .query(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", GRANT_CLIENT_CREDENTIALS),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("OAuth2 token request failed: {}", response.status());
        }

        let fetched_at = now_i64();
        let body: TokenResponse = response.json().await?;
        if body.access_token.is_empty() {
            bail!("OAuth2 token response carried an empty access_token");
        }

        Ok(Token::from_declared_lifetime(
            body.access_token,
            fetched_at,
            body.expires_in,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_both_halves() {
        assert!(Credentials::from_parts(Some("id".into()), Some("secret".into())).is_some());
        assert!(Credentials::from_parts(Some("id".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("secret".into())).is_none());
        assert!(Credentials::from_parts(None, None).is_none());
    }

    #[test]
    fn empty_env_values_count_as_unset() {
        assert!(Credentials::from_parts(Some("".into()), Some("secret".into())).is_none());
        assert!(Credentials::from_parts(Some("id".into()), Some("".into())).is_none());
    }
}
