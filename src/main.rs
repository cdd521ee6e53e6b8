// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact form submissions and relays them to the site owner with
//! provider failover.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (an optional `.env`
//! file is read first):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `CONTACT_RATE_LIMIT`: Max submissions per client per window (default: 3)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 3600)
//! - `RATE_LIMIT_SWEEP_SECS`: Expired window sweep interval (default: 60)
//! - `TO_EMAIL`: Owner address receiving submissions
//! - `PROVIDER_TIMEOUT_MS`: Per-call provider bound (default: 10000)
//! - `AUTO_REPLY_ENABLED`: Send confirmations to submitters (default: true)
//! - `RESEND_API_KEY`, `RESEND_API_URL`, `FROM_EMAIL`: Primary provider
//! - `GMAIL_USER`, `GMAIL_APP_PASSWORD`, `SMTP_HOST`, `SMTP_PORT`: Fallback provider
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated origins allowed to post
//! - `REDIS_URL`: Shared rate store (requires the `redis-store` feature)

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    classifier::ResponseClassifier,
    clock::{Clock, SystemClock},
    composer::PlainTextComposer,
    config::{Config, RateLimitConfig, ResendConfig, SmtpConfig},
    dispatcher::DeliveryDispatcher,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::ContactMetrics,
    pipeline::ContactPipeline,
    provider::{Provider, ResendProvider, SmtpProvider},
    store::{MemoryRateStore, RateStore},
    validator::SubmissionValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {e}");
        }
    }

    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        resend_configured = config.providers.resend.is_some(),
        smtp_configured = config.providers.smtp.is_some(),
        "Starting contact relay"
    );
    if config.providers.resend.is_none() && config.providers.smtp.is_none() {
        warn!("No email provider configured, every submission will degrade to a compose link");
    }

    // Create application state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = rate_store(&config)?;
    let limiter = RateLimiter::new(config.rate_limit.clone(), store, clock.clone());
    let validator = SubmissionValidator::new(config.validation.clone());

    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(ResendProvider::new(config.providers.resend.clone())) as Arc<dyn Provider>,
        Arc::new(SmtpProvider::new(config.providers.smtp.clone())),
    ];
    let dispatcher = DeliveryDispatcher::new(
        providers,
        Arc::new(PlainTextComposer),
        config.delivery.clone(),
    );

    let mut pipeline = ContactPipeline::new(
        limiter,
        validator,
        dispatcher,
        ResponseClassifier::new(clock),
    );
    let metrics = if config.metrics.enabled {
        let metrics = ContactMetrics::new()?;
        pipeline = pipeline.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let state = Arc::new(AppState {
        pipeline,
        metrics,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_state.pipeline.limiter().cleanup().await {
                error!(error = %e, "Rate window sweep failed");
            }
        }
    });

    // Start server
    let app = router(state);
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn rate_store(config: &Config) -> anyhow::Result<Arc<dyn RateStore>> {
    match &config.redis_url {
        #[cfg(feature = "redis-store")]
        Some(url) => {
            info!("Using Redis rate store");
            Ok(Arc::new(contact_relay::store::RedisRateStore::new(url)?))
        }
        #[cfg(not(feature = "redis-store"))]
        Some(_) => {
            warn!("REDIS_URL set but the redis-store feature is disabled, using in-memory store");
            Ok(Arc::new(MemoryRateStore::new()))
        }
        None => Ok(Arc::new(MemoryRateStore::new())),
    }
}

/// Read and parse an environment variable, ignoring unparseable values.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a non-empty environment variable.
fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read `RATE_LIMIT_WINDOW_SECS`, dropping values outside the accepted range.
fn window_secs() -> Option<u64> {
    let secs = env_parse::<u64>("RATE_LIMIT_WINDOW_SECS")?;
    if RateLimitConfig::window_secs_in_range(secs) {
        Some(secs)
    } else {
        warn!(
            window_secs = secs,
            max = RateLimitConfig::MAX_WINDOW_SECS,
            "RATE_LIMIT_WINDOW_SECS out of range, using default"
        );
        None
    }
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = Config::default();

    let resend = env_string("RESEND_API_KEY").map(|api_key| {
        let mut resend = ResendConfig::new(api_key);
        if let Some(from) = env_string("FROM_EMAIL") {
            resend.from = from;
        }
        if let Some(api_url) = env_string("RESEND_API_URL") {
            resend.api_url = api_url;
        }
        resend
    });

    let smtp = match (env_string("GMAIL_USER"), env_string("GMAIL_APP_PASSWORD")) {
        (Some(user), Some(password)) => {
            let mut smtp = SmtpConfig::new(user, password);
            if let Some(host) = env_string("SMTP_HOST") {
                smtp.host = host;
            }
            if let Some(port) = env_parse("SMTP_PORT") {
                smtp.port = port;
            }
            Some(smtp)
        }
        _ => None,
    };

    Config {
        bind_addr: env_string("BIND_ADDR").unwrap_or(defaults.bind_addr),
        rate_limit: RateLimitConfig {
            max_requests: env_parse("CONTACT_RATE_LIMIT")
                .unwrap_or(defaults.rate_limit.max_requests),
            window_secs: window_secs().unwrap_or(defaults.rate_limit.window_secs),
            sweep_interval_secs: env_parse("RATE_LIMIT_SWEEP_SECS")
                .unwrap_or(defaults.rate_limit.sweep_interval_secs),
        },
        delivery: contact_relay::config::DeliveryConfig {
            owner_address: env_string("TO_EMAIL").unwrap_or(defaults.delivery.owner_address),
            provider_timeout_ms: env_parse("PROVIDER_TIMEOUT_MS")
                .unwrap_or(defaults.delivery.provider_timeout_ms),
            auto_reply_enabled: env_parse("AUTO_REPLY_ENABLED")
                .unwrap_or(defaults.delivery.auto_reply_enabled),
        },
        providers: contact_relay::config::ProvidersConfig { resend, smtp },
        metrics: contact_relay::config::MetricsConfig {
            enabled: env_parse("METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
            ..defaults.metrics
        },
        cors: contact_relay::config::CorsConfig {
            allowed_origins: env_string("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        },
        redis_url: env_string("REDIS_URL"),
        ..defaults
    }
}
