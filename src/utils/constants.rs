//! Shared constants and invariants

/// Inbound path the browser extension polls.
pub const GET_TOKEN_PATH: &str = "/get-token";

/// OAuth2 grant this relay performs against Twitch.
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Public body served whenever no valid token is available. Deployed clients
/// match on this exact string.
pub const TOKEN_ERROR_MESSAGE: &str = "Could not get a valid token from Twitch.";
