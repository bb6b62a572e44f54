//! The canonical decoded message.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MsgError;

use super::address::EmailAddress;
use super::attachment::EmailAttachment;

/// One decoded message.
///
/// `is_valid` gates every other field: when it is `false` only
/// `error_message` is populated. Empty strings mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailMessage {
    pub subject: String,

    pub body_plain_text: String,

    /// HTML body, empty when missing or not valid UTF-8.
    pub body_html: String,

    pub sender_name: String,

    pub sender_email: String,

    /// Primary recipients joined with `", "`, in source order.
    pub to_recipients: String,

    /// Carbon-copy recipients joined with `", "`, in source order.
    pub cc_recipients: String,

    /// Reserved. The decoder's blind-copy field is never consulted, so this
    /// is always empty.
    pub bcc_recipients: String,

    pub date: Option<DateTime<Utc>>,

    /// Attachments in source order.
    pub attachments: Vec<EmailAttachment>,

    /// `true` once the decoder opened the message; field failures never reset it.
    pub is_valid: bool,

    /// Why the message could not be opened. Empty when `is_valid`.
    pub error_message: String,
}

impl EmailMessage {
    /// An invalid record carrying only the error.
    pub fn invalid(error: &MsgError) -> Self {
        Self {
            error_message: error.to_string(),
            ..Self::default()
        }
    }

    /// The sender as `"Name <address>"`, name or address alone, or `None`.
    pub fn sender_display(&self) -> Option<String> {
        EmailAddress {
            display_name: self.sender_name.clone(),
            address: self.sender_email.clone(),
        }
        .display()
    }

    /// HTML body when present, otherwise the plain body. `None` if both are empty.
    pub fn preferred_body(&self) -> Option<&str> {
        if !self.body_html.is_empty() {
            Some(&self.body_html)
        } else if !self.body_plain_text.is_empty() {
            Some(&self.body_plain_text)
        } else {
            None
        }
    }

    /// Sum of all attachment sizes in bytes.
    pub fn total_attachment_size(&self) -> u64 {
        self.attachments.iter().map(EmailAttachment::size).sum()
    }
}
