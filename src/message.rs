// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound message construction.
//!
//! Derives the relayed email deterministically from a validated submission
//! and its routing decision. Field values arrive already HTML-escaped from
//! the validator; the only transformation applied here is newline-to-`<br>`
//! in the message body.

use crate::router::{MailboxKind, RoutingDecision};
use crate::validator::Submission;

/// A fully formed email ready for a transport. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// From display, e.g. `Eterna Tech <onboarding@resend.dev>`
    pub from_display: String,
    /// Destination mailbox address
    pub destination: String,
    /// Submitter address, set as Reply-To so replies reach them directly
    pub reply_to: String,
    /// Final subject line
    pub subject_line: String,
    pub html_body: String,
    pub text_body: String,
}

impl OutboundMessage {
    /// Build the relayed email for a submission.
    pub fn build(
        submission: &Submission,
        decision: &RoutingDecision,
        from_display: &str,
    ) -> Self {
        let heading = match decision.kind {
            MailboxKind::Service => "Nouvelle demande de service",
            MailboxKind::Contact => "Nouveau message",
        };
        let form_name = match decision.kind {
            MailboxKind::Service => "formulaire de demande de service",
            MailboxKind::Contact => "formulaire de contact",
        };

        Self {
            from_display: from_display.to_string(),
            destination: decision.destination.clone(),
            reply_to: submission.email.clone(),
            subject_line: format!("[Site Web] {}", submission.subject),
            html_body: html_body(submission, heading, form_name),
            text_body: text_body(submission, heading),
        }
    }
}

fn html_body(submission: &Submission, heading: &str, form_name: &str) -> String {
    let mut details = String::new();
    details.push_str(&format!("<p><strong>Nom:</strong> {}</p>\n", submission.name));
    details.push_str(&format!(
        "<p><strong>Email:</strong> {}</p>\n",
        submission.email
    ));
    if let Some(phone) = &submission.phone {
        details.push_str(&format!("<p><strong>Téléphone:</strong> {phone}</p>\n"));
    }
    if let Some(company) = &submission.company {
        details.push_str(&format!("<p><strong>Entreprise:</strong> {company}</p>\n"));
    }
    details.push_str(&format!(
        "<p><strong>Sujet:</strong> {}</p>\n",
        submission.subject
    ));

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2563eb;">{heading} - Eterna Tech</h2>
  <div style="background-color: #f8fafc; padding: 20px; border-radius: 8px; margin: 20px 0;">
{details}  </div>
  <div style="background-color: #ffffff; padding: 20px; border-left: 4px solid #2563eb;">
    <h3 style="color: #1e293b;">Message:</h3>
    <p style="line-height: 1.6; color: #475569;">{message}</p>
  </div>
  <div style="margin-top: 20px; padding-top: 20px; border-top: 1px solid #e2e8f0; color: #94a3b8; font-size: 12px;">
    <p>Cet email a été envoyé depuis le {form_name} du site web Eterna Tech.</p>
  </div>
</div>"#,
        message = submission.message.replace('\n', "<br>"),
    )
}

fn text_body(submission: &Submission, heading: &str) -> String {
    let mut body = format!("{heading} - Eterna Tech\n\n");
    body.push_str(&format!("Nom: {}\n", submission.name));
    body.push_str(&format!("Email: {}\n", submission.email));
    if let Some(phone) = &submission.phone {
        body.push_str(&format!("Téléphone: {phone}\n"));
    }
    if let Some(company) = &submission.company {
        body.push_str(&format!("Entreprise: {company}\n"));
    }
    body.push_str(&format!("Sujet: {}\n\n", submission.subject));
    body.push_str(&format!("Message:\n{}\n", submission.message));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::router::route;
    use crate::validator::{validate, ContactForm};

    fn jane_form() -> ContactForm {
        ContactForm {
            name: Some("Jane".to_string()),
            email: Some("jane@x.com".to_string()),
            subject: Some("Hello".to_string()),
            message: Some("Hi\nthere".to_string()),
            phone: None,
            company: None,
        }
    }

    #[test]
    fn test_round_trip_submission_to_message() {
        let mail = MailConfig::default();
        let submission = validate(&jane_form()).expect("form should validate");
        let decision = route(&submission, &mail);
        let message = OutboundMessage::build(&submission, &decision, &mail.from_display);

        assert_eq!(message.reply_to, "jane@x.com");
        assert_eq!(message.subject_line, "[Site Web] Hello");
        assert_eq!(message.destination, mail.contact_mailbox);
        assert!(message.html_body.contains("Jane"));
        assert!(message.html_body.contains("jane@x.com"));
        assert!(message.html_body.contains("Hello"));
        assert!(message.html_body.contains("Hi<br>there"));
    }

    #[test]
    fn test_service_request_heading() {
        let mail = MailConfig::default();
        let submission = validate(&ContactForm {
            subject: Some("Demande de devis - Audit".to_string()),
            ..jane_form()
        })
        .expect("form should validate");
        let decision = route(&submission, &mail);
        let message = OutboundMessage::build(&submission, &decision, &mail.from_display);

        assert_eq!(message.destination, mail.service_mailbox);
        assert!(message.html_body.contains("Nouvelle demande de service"));
        assert!(message.text_body.contains("Nouvelle demande de service"));
        assert!(message.html_body.contains("formulaire de demande de service"));
    }

    #[test]
    fn test_optional_fields_rendered_only_when_present() {
        let mail = MailConfig::default();
        let bare = validate(&jane_form()).expect("form should validate");
        let decision = route(&bare, &mail);
        let message = OutboundMessage::build(&bare, &decision, &mail.from_display);
        assert!(!message.html_body.contains("Téléphone"));
        assert!(!message.html_body.contains("Entreprise"));

        let full = validate(&ContactForm {
            phone: Some("0612345678".to_string()),
            company: Some("ACME".to_string()),
            ..jane_form()
        })
        .expect("form should validate");
        let message = OutboundMessage::build(&full, &decision, &mail.from_display);
        assert!(message.html_body.contains("Téléphone:</strong> 0612345678"));
        assert!(message.html_body.contains("Entreprise:</strong> ACME"));
        assert!(message.text_body.contains("Téléphone: 0612345678"));
    }

    #[test]
    fn test_text_body_keeps_raw_newlines() {
        let mail = MailConfig::default();
        let submission = validate(&jane_form()).expect("form should validate");
        let decision = route(&submission, &mail);
        let message = OutboundMessage::build(&submission, &decision, &mail.from_display);
        assert!(message.text_body.contains("Hi\nthere"));
    }
}
