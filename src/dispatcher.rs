// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound mail dispatch.
//!
//! A [`MailTransport`] hands a formed [`OutboundMessage`] to an external
//! delivery mechanism and reports a provider message identifier or an
//! error. Two transports are provided:
//!
//! - [`ResendTransport`]: transactional email HTTP API
//! - [`SmtpMailer`]: direct SMTP relay, one identity per mailbox
//!
//! The [`Dispatcher`] bounds every delivery attempt with a timeout and
//! never retries; a failed submission requires a fresh client request.

use crate::config::{MailConfig, SmtpCredentials, TransportKind};
use crate::message::OutboundMessage;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Delivery error types.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("mail API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("mail API returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("SMTP transport failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("invalid mailbox address: {0}")]
    Mailbox(#[from] lettre::address::AddressError),

    #[error("message construction failed: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport verification refused credentials")]
    VerificationRefused,
}

/// Outbound email delivery mechanism.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempt delivery, returning the provider message identifier.
    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError>;

    /// Startup-time credential check against the provider.
    async fn verify(&self) -> Result<(), TransportError>;
}

/// Transactional email API transport.
pub struct ResendTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendTransport {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError> {
        let payload = SendEmailRequest {
            from: &message.from_display,
            to: [&message.destination],
            reply_to: &message.reply_to,
            subject: &message.subject_line,
            html: &message.html_body,
            text: &message.text_body,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::ApiStatus { status, body });
        }

        let body: SendEmailResponse = response.json().await?;
        debug!(message_id = %body.id, "Mail API accepted message");
        Ok(body.id)
    }

    async fn verify(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(format!("{}/domains", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::ApiStatus {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Direct SMTP transport. Each destination mailbox sends through its own
/// relay identity, so the service route and the contact route keep separate
/// credentials.
pub struct SmtpMailer {
    contact_relay: AsyncSmtpTransport<Tokio1Executor>,
    service_mailbox: String,
    service_relay: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(mail: &MailConfig) -> Result<Self, TransportError> {
        Ok(Self {
            contact_relay: relay(mail, &mail.smtp.contact)?,
            service_mailbox: mail.service_mailbox.clone(),
            service_relay: relay(mail, &mail.smtp.service)?,
        })
    }

    /// Anything not addressed to the service mailbox goes out through the
    /// contact identity.
    fn relay_for(&self, destination: &str) -> &AsyncSmtpTransport<Tokio1Executor> {
        if destination == self.service_mailbox {
            &self.service_relay
        } else {
            &self.contact_relay
        }
    }
}

fn relay(
    mail: &MailConfig,
    credentials: &SmtpCredentials,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&mail.smtp.host)?
        .credentials(Credentials::new(
            credentials.user.clone(),
            credentials.password.clone(),
        ));
    if mail.smtp.port != 0 {
        builder = builder.port(mail.smtp.port);
    }
    Ok(builder.build())
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError> {
        let email = Message::builder()
            .from(message.from_display.parse::<Mailbox>()?)
            .to(message.destination.parse::<Mailbox>()?)
            .reply_to(message.reply_to.parse::<Mailbox>()?)
            .subject(message.subject_line.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))?;

        let response = self.relay_for(&message.destination).send(email).await?;
        Ok(response.message().collect::<Vec<&str>>().join(" "))
    }

    async fn verify(&self) -> Result<(), TransportError> {
        for relay in [&self.contact_relay, &self.service_relay] {
            if !relay.test_connection().await? {
                return Err(TransportError::VerificationRefused);
            }
        }
        Ok(())
    }
}

/// Build the transport selected by configuration.
pub fn build_transport(mail: &MailConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
    match mail.transport {
        TransportKind::Resend => Ok(Arc::new(ResendTransport::new(
            &mail.resend.base_url,
            &mail.resend.api_key,
        ))),
        TransportKind::Smtp => Ok(Arc::new(SmtpMailer::from_config(mail)?)),
    }
}

/// Dispatches formed messages through a transport with a bounded timeout.
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Attempt one delivery. No retry on failure.
    pub async fn dispatch(&self, message: &OutboundMessage) -> Result<String, TransportError> {
        let result = tokio::time::timeout(self.timeout, self.transport.send(message)).await;
        match result {
            Err(_) => Err(TransportError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(message_id)) => {
                info!(message_id = %message_id, destination = %message.destination, "Email dispatched");
                Ok(message_id)
            }
        }
    }

    /// Startup-time credential check; callers log failures as warnings
    /// rather than aborting.
    pub async fn verify(&self) -> Result<(), TransportError> {
        self.transport.verify().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn sample_message() -> OutboundMessage {
        OutboundMessage {
            from_display: "Eterna Tech <onboarding@resend.dev>".to_string(),
            destination: "contact@eternatech.net".to_string(),
            reply_to: "jane@x.com".to_string(),
            subject_line: "[Site Web] Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resend_send_returns_provider_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/emails")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{"to": ["contact@eternatech.net"], "reply_to": "jane@x.com"}"#);
                then.status(200)
                    .json_body(serde_json::json!({ "id": "msg_123" }));
            })
            .await;

        let transport = ResendTransport::new(&server.base_url(), "test-key");
        let id = transport.send(&sample_message()).await.expect("send ok");
        assert_eq!(id, "msg_123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resend_error_status_surfaces_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/emails");
                then.status(401).body("invalid api key");
            })
            .await;

        let transport = ResendTransport::new(&server.base_url(), "bad-key");
        let err = transport.send(&sample_message()).await.unwrap_err();
        match err {
            TransportError::ApiStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_resend_verify_checks_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/domains");
                then.status(200).json_body(serde_json::json!({ "data": [] }));
            })
            .await;

        let transport = ResendTransport::new(&server.base_url(), "test-key");
        assert!(transport.verify().await.is_ok());
    }

    struct StalledTransport;

    #[async_trait]
    impl MailTransport for StalledTransport {
        async fn send(&self, _message: &OutboundMessage) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        async fn verify(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_times_out() {
        let dispatcher = Dispatcher::new(Arc::new(StalledTransport), Duration::from_secs(30));
        let err = dispatcher.dispatch(&sample_message()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
