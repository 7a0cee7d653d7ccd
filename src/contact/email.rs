//! Notification email rendering

use serde::Serialize;
use std::borrow::Cow;

use super::form::ContactSubmission;
use super::sanitize::{escape_html, escape_multiline};
use crate::config::ContactConfig;

const FOOTER: &str = "Message sent from PreAudit contact form";

/// Email as handed to the email API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Render the notification for one submission.
///
/// With `sanitize` every field is HTML-escaped and description line breaks
/// become `<br>`; without it the text is interpolated verbatim.
pub fn render(submission: &ContactSubmission, config: &ContactConfig, sanitize: bool) -> OutgoingEmail {
    let clean = |value: &str| -> String {
        if sanitize {
            escape_html(value)
        } else {
            value.to_string()
        }
    };

    let name = clean(&submission.name);
    let contact = clean(&submission.contact);
    let description: Cow<'_, str> = if sanitize {
        Cow::Owned(escape_multiline(&submission.description))
    } else {
        Cow::Borrowed(&submission.description)
    };

    let mut html = String::from("<h2>New Contact Message</h2>\n");
    html.push_str(&format!("<p><strong>Name:</strong> {name}</p>\n"));
    if let Some(org) = submission.organization() {
        html.push_str(&format!("<p><strong>Organization:</strong> {}</p>\n", clean(org)));
    }
    html.push_str(&format!("<p><strong>Contact:</strong> {contact}</p>\n"));
    html.push_str("<p><strong>Description:</strong></p>\n");
    html.push_str(&format!("<p>{description}</p>\n"));
    if let Some(budget) = submission.budget() {
        html.push_str(&format!("<p><strong>Budget:</strong> {}</p>\n", clean(budget)));
    }
    html.push_str(&format!("<hr>\n<p><em>{FOOTER}</em></p>\n"));

    OutgoingEmail {
        from: config.sender.clone(),
        to: config.recipients.clone(),
        subject: format!("{} {name}", config.subject_prefix),
        html,
    }
}
