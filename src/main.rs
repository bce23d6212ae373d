// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact-form submissions from the website, validates and rate
//! limits them, routes them to the right business mailbox and relays them
//! through an outbound email transport.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! honored in development):
//!
//! - `PORT`: Listening port (default: 3001)
//! - `APP_ENV`: `production` hides transport error detail from clients
//! - `MAIL_TRANSPORT`: `resend` (default) or `smtp`
//! - `RESEND_API_KEY`: API key for the email API transport
//! - `SMTP_HOST` / `SMTP_PORT`: relay for the SMTP transport
//! - `CONTACT_SMTP_USER` / `CONTACT_SMTP_PASSWORD`: contact identity
//! - `SERVICE_SMTP_USER` / `SERVICE_SMTP_PASSWORD`: service identity
//! - `EMAIL_USER`: contact mailbox (default: contact@eternatech.net)
//! - `SERVICE_EMAIL_USER`: service mailbox (default: service@eternatech.net)
//! - `MAIL_FROM`: from display on relayed messages
//! - `ALLOWED_ORIGINS`: comma-separated origin allow-list
//! - `MAX_REQUESTS_PER_WINDOW` / `RATE_WINDOW_SECS`: rate limit tuning
//! - `DISPATCH_TIMEOUT_SECS`: bound on a single delivery attempt

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::{Config, CorsConfig, MailConfig, RateLimitConfig, ResendConfig, SmtpConfig, SmtpCredentials},
    dispatcher::{self, Dispatcher},
    handlers::{self, AppState},
    limiter::{InMemoryRateStore, RateLimiter},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    dotenvy::dotenv().ok();

    // Load configuration
    let config = load_config();
    info!(
        port = config.port,
        production = config.production,
        transport = %config.mail.transport,
        contact_mailbox = %config.mail.contact_mailbox,
        service_mailbox = %config.mail.service_mailbox,
        "Starting contact relay"
    );

    // Build the outbound transport and check its credentials. A failed
    // check is a warning, not a startup failure; deliveries will surface
    // the problem per request.
    let transport = dispatcher::build_transport(&config.mail)?;
    let dispatcher = Dispatcher::new(transport, config.mail.dispatch_timeout());
    match dispatcher.verify().await {
        Ok(()) => info!("Mail transport verified"),
        Err(e) => warn!(error = %e, "Mail transport verification failed, deliveries may fail"),
    }

    // Create application state
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone(), Arc::new(InMemoryRateStore::new())),
        dispatcher,
        config: config.clone(),
    });

    // Build router
    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = MailConfig::default();

    Config {
        port: env_parsed("PORT").unwrap_or(3001),
        production: std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false),
        rate_limit: RateLimitConfig {
            max_requests: env_parsed("MAX_REQUESTS_PER_WINDOW").unwrap_or(10),
            window_secs: env_parsed("RATE_WINDOW_SECS").unwrap_or(60),
        },
        mail: MailConfig {
            transport: std::env::var("MAIL_TRANSPORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            from_display: env_or("MAIL_FROM", &defaults.from_display),
            contact_mailbox: env_or("EMAIL_USER", &defaults.contact_mailbox),
            service_mailbox: env_or("SERVICE_EMAIL_USER", &defaults.service_mailbox),
            resend: ResendConfig {
                api_key: env_or("RESEND_API_KEY", ""),
                ..Default::default()
            },
            smtp: SmtpConfig {
                host: env_or("SMTP_HOST", ""),
                port: env_parsed("SMTP_PORT").unwrap_or(0),
                contact: SmtpCredentials {
                    user: env_or("CONTACT_SMTP_USER", ""),
                    password: env_or("CONTACT_SMTP_PASSWORD", ""),
                },
                service: SmtpCredentials {
                    user: env_or("SERVICE_SMTP_USER", ""),
                    password: env_or("SERVICE_SMTP_PASSWORD", ""),
                },
            },
            dispatch_timeout_secs: env_parsed("DISPATCH_TIMEOUT_SECS").unwrap_or(30),
        },
        cors: match std::env::var("ALLOWED_ORIGINS") {
            Ok(list) => CorsConfig {
                allowed_origins: list
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            Err(_) => CorsConfig::default(),
        },
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
