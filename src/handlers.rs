// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! One request, one task, one response. A submission flows through the
//! rate limiter, the validator, the router and the dispatcher in order;
//! the first stage that fails terminates the request with its own status
//! (429, 400 or 500). Nothing is retried server-side.

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::message::OutboundMessage;
use crate::router;
use crate::validator::{self, ContactForm, FieldError};
use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

/// JSON bodies are capped at 10 KB.
const MAX_BODY_BYTES: usize = 10 * 1024;

// User-facing strings match the site copy.
const MSG_SENT: &str = "Email envoyé avec succès";
const MSG_SEND_FAILED: &str = "Erreur lors de l'envoi de l'email";
const MSG_RATE_LIMITED: &str = "Trop de requêtes. Veuillez réessayer plus tard.";
const MSG_ORIGIN_REJECTED: &str = "Non autorisé par CORS";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub dispatcher: Dispatcher,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Successful dispatch response.
#[derive(Debug, Serialize)]
pub struct DispatchSuccess {
    pub success: bool,
    pub message: &'static str,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Generic failure body for 429/500/403 responses.
#[derive(Debug, Serialize)]
pub struct RequestFailure {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated validation failure body.
#[derive(Debug, Serialize)]
pub struct ValidationFailure {
    pub success: bool,
    pub errors: Vec<FieldError>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Backend API is running",
    })
}

/// Contact form intake endpoint.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(form): Json<ContactForm>,
) -> Response {
    let source = addr.ip().to_string();

    match state.limiter.check(&source, Instant::now()).await {
        RateLimitResult::Limited { retry_after } => {
            info!(
                ip = %source,
                retry_after_secs = retry_after.as_secs(),
                "Submission rate limited"
            );
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after.as_secs().to_string())],
                Json(RequestFailure {
                    success: false,
                    message: MSG_RATE_LIMITED,
                    error: None,
                }),
            )
                .into_response();
        }
        RateLimitResult::Allowed { remaining } => {
            debug!(ip = %source, remaining, "Submission within rate limit");
        }
    }

    let submission = match validator::validate(&form) {
        Ok(submission) => submission,
        Err(errors) => {
            info!(ip = %source, error_count = errors.len(), "Submission failed validation");
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidationFailure {
                    success: false,
                    errors,
                }),
            )
                .into_response();
        }
    };

    let decision = router::route(&submission, &state.config.mail);
    debug!(mailbox = %decision.kind, destination = %decision.destination, "Submission routed");

    let message = OutboundMessage::build(&submission, &decision, &state.config.mail.from_display);

    match state.dispatcher.dispatch(&message).await {
        Ok(message_id) => (
            StatusCode::OK,
            Json(DispatchSuccess {
                success: true,
                message: MSG_SENT,
                message_id,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(ip = %source, mailbox = %decision.kind, error = %e, "Delivery failed");
            let error = if state.config.production {
                None
            } else {
                Some(e.to_string())
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RequestFailure {
                    success: false,
                    message: MSG_SEND_FAILED,
                    error,
                }),
            )
                .into_response()
        }
    }
}

/// Rejects browser requests from origins outside the allow-list before any
/// handler runs. Requests without an Origin header (curl, mobile apps,
/// health probes) pass through.
pub async fn origin_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match origin {
        None => next.run(request).await,
        Some(origin)
            if state
                .config
                .cors
                .allowed_origins
                .iter()
                .any(|allowed| allowed == &origin) =>
        {
            next.run(request).await
        }
        Some(origin) => {
            warn!(origin = %origin, "Origin not in allow-list");
            (
                StatusCode::FORBIDDEN,
                Json(RequestFailure {
                    success: false,
                    message: MSG_ORIGIN_REJECTED,
                    error: None,
                }),
            )
                .into_response()
        }
    }
}

/// Build the service router with CORS, origin guard and body limit applied.
pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/contact", post(contact))
        .layer(middleware::from_fn_with_state(state.clone(), origin_guard))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
