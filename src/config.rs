// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay service.
//!
//! Defaults match the deployed site; every value can be overridden from the
//! environment (see `load_config` in `main.rs`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listening port (default: 3001)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Production mode: hides transport error detail from clients
    #[serde(default)]
    pub production: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Cross-origin configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Fixed-window rate limiting, keyed by client IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per source (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window duration in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Outbound mail transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Transactional email HTTP API
    Resend,
    /// Direct SMTP relay
    Smtp,
}

impl Default for TransportKind {
    fn default() -> Self {
        TransportKind::Resend
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resend" => Ok(TransportKind::Resend),
            "smtp" => Ok(TransportKind::Smtp),
            other => Err(format!("unknown mail transport: {other}")),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Resend => write!(f, "resend"),
            TransportKind::Smtp => write!(f, "smtp"),
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Which transport delivers mail (default: resend)
    #[serde(default)]
    pub transport: TransportKind,

    /// From display used on relayed messages
    #[serde(default = "default_from_display")]
    pub from_display: String,

    /// Destination mailbox for general contact messages
    #[serde(default = "default_contact_mailbox")]
    pub contact_mailbox: String,

    /// Destination mailbox for quote/service requests
    #[serde(default = "default_service_mailbox")]
    pub service_mailbox: String,

    /// Email API credentials
    #[serde(default)]
    pub resend: ResendConfig,

    /// SMTP relay credentials
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Bound on a single delivery attempt in seconds (default: 30)
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

/// Transactional email API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendConfig {
    /// API key (empty means unconfigured)
    #[serde(default)]
    pub api_key: String,

    /// API base URL; overridable for tests
    #[serde(default = "default_resend_base_url")]
    pub base_url: String,
}

/// SMTP relay configuration with per-mailbox credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay hostname (empty means unconfigured)
    #[serde(default)]
    pub host: String,

    /// Relay port; 0 keeps the transport's default submissions port
    #[serde(default)]
    pub port: u16,

    /// Credentials for the contact mailbox identity
    #[serde(default)]
    pub contact: SmtpCredentials,

    /// Credentials for the service mailbox identity
    #[serde(default)]
    pub service: SmtpCredentials,
}

/// A single SMTP login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpCredentials {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

/// Cross-origin allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API; requests without an Origin header
    /// (non-browser clients) always pass.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_port() -> u16 {
    3001
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_from_display() -> String {
    "Eterna Tech <onboarding@resend.dev>".to_string()
}

fn default_contact_mailbox() -> String {
    "contact@eternatech.net".to_string()
}

fn default_service_mailbox() -> String {
    "service@eternatech.net".to_string()
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
        "https://eternatech.net".to_string(),
        "https://www.eternatech.net".to_string(),
        "https://eternatech-web-site-v2.onrender.com".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            production: false,
            rate_limit: RateLimitConfig::default(),
            mail: MailConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            from_display: default_from_display(),
            contact_mailbox: default_contact_mailbox(),
            service_mailbox: default_service_mailbox(),
            resend: ResendConfig::default(),
            smtp: SmtpConfig::default(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
        }
    }
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_resend_base_url(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl MailConfig {
    /// Get the delivery timeout
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}
