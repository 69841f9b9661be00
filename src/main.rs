use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use tracing::info;

use twitch_token_relay::cache::token_cache::TokenCache;
use twitch_token_relay::config::settings::{
    LogFormat, LoggingConfig, MetricsConfig, Settings, DEFAULT_PORT, DEFAULT_TOKEN_URL,
};
use twitch_token_relay::observability::service_resources_metrics::collect_process_metrics;
use twitch_token_relay::server;
use twitch_token_relay::sources::oauth2::{Credentials, OAuth2Source};
use twitch_token_relay::utils::logging::{self, LogLevel};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port the relay listens on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Twitch application client id.
    #[arg(long, env = "TWITCH_CLIENT_ID", hide_env_values = true)]
    twitch_client_id: Option<String>,

    /// Twitch application client secret.
    #[arg(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true)]
    twitch_client_secret: Option<String>,

    /// Upstream OAuth2 token endpoint.
    #[arg(long, env = "TWITCH_TOKEN_URL", default_value = DEFAULT_TOKEN_URL)]
    token_url: String,

    /// Overrides the configured log level.
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,

    /// Serve Prometheus metrics on /metrics.
    #[arg(long, env = "METRICS_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    metrics_enabled: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read flags and environment
    // -------------------------------

    let args = Args::parse();

    // -------------------------------
    // 2. Assemble settings, init logging
    // -------------------------------

    let settings = Settings {
        port: args.port,
        token_url: args.token_url,
        credentials: Credentials::from_parts(args.twitch_client_id, args.twitch_client_secret),
        metrics: MetricsConfig {
            is_enabled: args.metrics_enabled,
            ..MetricsConfig::default()
        },
        logging: LoggingConfig::new("info".to_owned(), LogFormat::from_env()),
    };

    logging::run(&settings, args.log_level)?;
    info!("Service starting...");

    // -------------------------------
    // 3. Create request client
    // -------------------------------

    let client = Client::new();

    // -------------------------------
    // 4. Token source and cache
    // -------------------------------

    let source = OAuth2Source::new(
        client,
        settings.token_url.clone(),
        settings.credentials.clone(),
    );
    let token_cache = TokenCache::new(source);

    // -------------------------------
    // 5. Start http server and resource metrics collector
    // -------------------------------

    let http_server = server::server::start(&settings, token_cache);
    let service_metrics = collect_process_metrics(settings.metrics.is_enabled);

    tokio::try_join!(http_server, service_metrics)?;

    Ok(())
}
