// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Destination routing for validated submissions.
//!
//! A subject containing the quote-request marker goes to the service
//! mailbox with its own transport identity; everything else goes to the
//! general contact mailbox. Pure decision, no side effects.

use crate::config::MailConfig;
use crate::validator::Submission;

/// Marker phrase the site puts in quote/service request subjects.
/// Matched case-sensitively against the escaped subject text.
pub const SERVICE_REQUEST_MARKER: &str = "Demande de devis";

/// Which configured mailbox (and transport identity) receives the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxKind {
    Contact,
    Service,
}

impl std::fmt::Display for MailboxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Outcome of routing a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub kind: MailboxKind,
    /// Destination mailbox address
    pub destination: String,
}

/// Route a validated submission to its destination mailbox.
pub fn route(submission: &Submission, mail: &MailConfig) -> RoutingDecision {
    if submission.subject.contains(SERVICE_REQUEST_MARKER) {
        RoutingDecision {
            kind: MailboxKind::Service,
            destination: mail.service_mailbox.clone(),
        }
    } else {
        RoutingDecision {
            kind: MailboxKind::Contact,
            destination: mail.contact_mailbox.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(subject: &str) -> Submission {
        Submission {
            name: "Jane".to_string(),
            email: "jane@x.com".to_string(),
            subject: subject.to_string(),
            message: "Bonjour".to_string(),
            phone: None,
            company: None,
        }
    }

    #[test]
    fn test_quote_request_routes_to_service_mailbox() {
        let mail = MailConfig::default();
        let decision = route(&submission("Demande de devis - Site vitrine"), &mail);
        assert_eq!(decision.kind, MailboxKind::Service);
        assert_eq!(decision.destination, mail.service_mailbox);
    }

    #[test]
    fn test_general_subject_routes_to_contact_mailbox() {
        let mail = MailConfig::default();
        let decision = route(&submission("Question générale"), &mail);
        assert_eq!(decision.kind, MailboxKind::Contact);
        assert_eq!(decision.destination, mail.contact_mailbox);
    }

    #[test]
    fn test_marker_match_is_case_sensitive() {
        let mail = MailConfig::default();
        let decision = route(&submission("demande de devis"), &mail);
        assert_eq!(decision.kind, MailboxKind::Contact);
    }

    #[test]
    fn test_marker_anywhere_in_subject_counts() {
        let mail = MailConfig::default();
        let decision = route(&submission("Urgent: Demande de devis"), &mail);
        assert_eq!(decision.kind, MailboxKind::Service);
    }
}
