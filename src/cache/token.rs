/// Seconds shaved off the upstream-declared lifetime so a token is never
/// served moments before Twitch invalidates it (in-flight use, clock skew).
pub const EXPIRY_SAFETY_MARGIN_SECONDS: i64 = 120;

#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub expires_at_unix_ts: i64, // UNIX TIMESTAMP
}

impl Token {
    pub fn new(value: String, expires_at_unix_ts: i64) -> Self {
        Self { value, expires_at_unix_ts }
    }

    /// Build a token from the lifetime Twitch declared at fetch time.
    /// Saturating arithmetic keeps a pathological `expires_in` from wrapping.
    pub fn from_declared_lifetime(
        value: String,
        fetched_at_unix_ts: i64,
        expires_in_seconds: i64,
    ) -> Self {
        Self::new(
            value,
            fetched_at_unix_ts
                .saturating_add(expires_in_seconds)
                .saturating_sub(EXPIRY_SAFETY_MARGIN_SECONDS),
        )
    }

    /// A token is valid up to and including its recorded expiry second.
    pub fn is_expired_at(&self, now_unix_ts: i64) -> bool {
        now_unix_ts > self.expires_at_unix_ts
    }
}
