// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate relays contact-form submissions from the eternatech.net
//! website to the business mailboxes:
//!
//! - Per-IP fixed-window rate limiting (10 req/min default)
//! - Aggregated field validation with HTML escaping
//! - Subject-based routing (quote requests vs general contact)
//! - Outbound delivery via a transactional email API or direct SMTP
//! - Origin allow-list enforced before the handlers

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod limiter;
pub mod message;
pub mod router;
pub mod validator;

pub use config::Config;
pub use dispatcher::{Dispatcher, MailTransport, TransportError};
pub use limiter::{InMemoryRateStore, RateLimitResult, RateLimiter, RateStore};
pub use message::OutboundMessage;
pub use router::{MailboxKind, RoutingDecision};
pub use validator::{ContactForm, FieldError, Submission};
