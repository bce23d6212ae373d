// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form validation and normalization.
//!
//! Turns raw untrusted form input into a well-formed [`Submission`]:
//! - required fields present and non-empty after trimming
//! - email syntactically valid and lowercased
//! - every text field HTML-escaped before it reaches an email body
//!
//! Failures are aggregated so the client sees every problem at once.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw, untrusted form payload. Every field is optional so that missing
/// fields surface as validation errors rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// A validated, normalized submission. Required fields are non-empty,
/// trimmed and escaped; the email is lowercase and syntactically valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// A single field-level validation problem, serialized into the 400 body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Validate a raw form, producing either a [`Submission`] or one error per
/// offending field. Never fails fast.
pub fn validate(form: &ContactForm) -> Result<Submission, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = required(&form.name, "name", "Le nom est requis", &mut errors);
    let subject = required(&form.subject, "subject", "Le sujet est requis", &mut errors);
    let message = required(&form.message, "message", "Le message est requis", &mut errors);

    let email = match form.email.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() && EmailAddress::is_valid(e) => Some(e.to_lowercase()),
        _ => {
            errors.push(FieldError::new("email", "Email invalide"));
            None
        }
    };

    let phone = optional(&form.phone);
    let company = optional(&form.company);

    if !errors.is_empty() {
        debug!(error_count = errors.len(), "Submission rejected by validator");
        return Err(errors);
    }

    // An empty errors vec means every required field produced a value.
    Ok(Submission {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        subject: subject.unwrap_or_default(),
        message: message.unwrap_or_default(),
        phone,
        company,
    })
}

/// Trim + escape a required field, recording an error when absent or empty.
fn required(
    value: &Option<String>,
    field: &'static str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(escape_html(v)),
        _ => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

/// Trim + escape an optional field; empty input collapses to None.
fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(escape_html)
}

/// Escape text that will be interpolated into an HTML email body.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}
