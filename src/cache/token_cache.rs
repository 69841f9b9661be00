use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::cache::token::Token;
use crate::helpers::time::{get_instant, now_i64};
use crate::observability::metrics::get_metrics;
use crate::sources::oauth2::OAuth2Source;

static MISSING_CREDENTIALS_MSG: &'static str = "missing_credentials";
static UPSTREAM_MSG: &'static str = "upstream";

/// Owns the single cached Twitch token and the refresh that replaces it.
///
/// The slot sits behind one async mutex held across the refresh await, so
/// concurrent callers that all observe a stale token line up here and share
/// the one upstream call instead of stampeding Twitch. Clones share the slot.
#[derive(Clone)]
pub struct TokenCache {
    source: OAuth2Source,
    slot: Arc<Mutex<Option<Token>>>,
}

impl TokenCache {
    /// Starts empty, which forces a refresh on first use.
    pub fn new(source: OAuth2Source) -> Self {
        Self {
            source,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Serve the cached token while it is fresh, otherwise refresh once and
    /// return whatever state that left behind. `None` is the failure signal;
    /// nothing on this path raises.
    pub async fn ensure_valid_token(&self) -> Option<Token> {
        let mut slot = self.slot.lock().await;
        let now = now_i64();

        if let Some(token) = slot.as_ref() {
            if !token.is_expired_at(now) {
                debug!(expires_at = token.expires_at_unix_ts, "serving cached token");
                get_metrics().await.token_cache_hits.inc();
                return Some(token.clone());
            }
            debug!(
                expires_at = token.expires_at_unix_ts,
                "cached token expired, refreshing"
            );
        }

        self.refresh_locked(&mut slot).await;
        slot.clone()
    }

    /// One refresh attempt against Twitch. Failures are absorbed here: the
    /// slot is cleared and the reason logged, never propagated. A missing
    /// credential pair short-circuits before any network call and leaves the
    /// slot untouched.
    async fn refresh_locked(&self, slot: &mut Option<Token>) {
        let metrics = get_metrics().await;

        let Some(credentials) = self.source.credentials() else {
            error!("TWITCH_CLIENT_ID / TWITCH_CLIENT_SECRET are not set, refusing to call Twitch");
            metrics
                .token_refresh_failures
                .with_label_values(&[MISSING_CREDENTIALS_MSG])
                .inc();
            return;
        };

        metrics.token_refresh_requests.inc();
        let start = get_instant();
        match self.source.fetch_token(credentials).await {
            Ok(token) => {
                info!(expires_at = token.expires_at_unix_ts, "new Twitch token generated");
                metrics.token_expiry_unix.set(token.expires_at_unix_ts);
                *slot = Some(token);
            }
            Err(err) => {
                error!("fetching token failed: {err:#}");
                metrics
                    .token_refresh_failures
                    .with_label_values(&[UPSTREAM_MSG])
                    .inc();
                // no token, no advertised expiry
                metrics.token_expiry_unix.set(0);
                *slot = None;
            }
        }
        metrics
            .token_refresh_duration
            .observe(start.elapsed().as_secs_f64());
    }
}
