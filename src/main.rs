use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bfhl::config::{RateLimitConfig, ServerConfig, WindowPolicy};
use bfhl::consts::{
    DEFAULT_AI_TIMEOUT_SECS, DEFAULT_BODY_LIMIT, DEFAULT_OFFICIAL_EMAIL, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW_SECS,
};
use bfhl::oracle::Oracle;
use bfhl::oracle::anthropic::AnthropicOracle;
use bfhl::oracle::gemini::GeminiOracle;
use bfhl::server::rate_limit::RateLimiter;
use bfhl::server::{self, AppState};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    Gemini,
    Anthropic,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RatePolicy {
    Fixed,
    Sliding,
}

impl From<RatePolicy> for WindowPolicy {
    fn from(policy: RatePolicy) -> Self {
        match policy {
            RatePolicy::Fixed => WindowPolicy::Fixed,
            RatePolicy::Sliding => WindowPolicy::Sliding,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "bfhl",
    version,
    about = "Fibonacci, primes, lcm, hcf and one-word AI answers behind one endpoint."
)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "BFHL_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// AI provider answering the `AI` operation
    #[arg(long, value_enum, env = "BFHL_PROVIDER", default_value_t = Provider::Gemini)]
    provider: Provider,

    /// Model name (provider-specific)
    #[arg(long, env = "BFHL_MODEL")]
    model: Option<String>,

    /// Email echoed in every response
    #[arg(long, env = "OFFICIAL_EMAIL", default_value = DEFAULT_OFFICIAL_EMAIL)]
    official_email: String,

    /// Requests allowed per client per window
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT)]
    rate_limit: u32,

    /// Rate limit window in seconds
    #[arg(long, default_value_t = DEFAULT_RATE_WINDOW_SECS)]
    rate_window: u64,

    /// How request counts age out
    #[arg(long, value_enum, default_value_t = RatePolicy::Fixed)]
    rate_policy: RatePolicy,

    /// Maximum request body in bytes
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,

    /// AI call timeout in seconds (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_AI_TIMEOUT_SECS)]
    ai_timeout: u64,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            official_email: self.official_email.clone(),
            body_limit: self.body_limit,
            ai_timeout: (self.ai_timeout > 0).then(|| Duration::from_secs(self.ai_timeout)),
            rate_limit: RateLimitConfig {
                max_requests: self.rate_limit,
                window: Duration::from_secs(self.rate_window),
                policy: self.rate_policy.into(),
            },
        }
    }

    fn oracle(&self) -> Arc<dyn Oracle> {
        match self.provider {
            Provider::Gemini => Arc::new(GeminiOracle::from_env(self.model.clone())),
            Provider::Anthropic => Arc::new(AnthropicOracle::from_env(self.model.clone())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load before logging and flags so RUST_LOG and clap's env fallbacks see it
    let dotenv = bfhl::config::load_env_file(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(true) => info!("loaded environment from .env"),
        Ok(false) => {}
        Err(e) => warn!("{:#}", e),
    }

    let cli = Cli::parse();
    let config = cli.server_config();
    config.validate()?;

    let oracle = cli.oracle();
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    let state = Arc::new(AppState::new(&config, Arc::clone(&oracle)));
    let app = server::router(&config, state, Arc::clone(&limiter));

    let addr = SocketAddr::new(cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("bfhl v{} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);
    info!(
        provider = oracle.name(),
        rate_limit = config.rate_limit.max_requests,
        window = ?config.rate_limit.window,
        policy = ?config.rate_limit.policy,
        body_limit = config.body_limit,
        "configuration"
    );

    let sweeper = limiter.start();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_on(tokio::signal::ctrl_c()))
    .await
    .context("server error")?;

    sweeper.stop().await;
    Ok(())
}

