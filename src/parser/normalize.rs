//! Normalization of a decoded message into an [`EmailMessage`].
//!
//! Only failing to obtain or open the decoder makes a result invalid. After
//! a successful open, every field is resolved independently and a missing
//! or broken field simply stays empty.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::foreign::{DecoderContext, ForeignObject};
use crate::model::address::{push_joined, strip_angle_brackets, EmailAddress};
use crate::model::{EmailAttachment, EmailMessage};

use super::adapter::{
    get_bytes, get_bytes_from_callable, get_int, get_list, get_string, get_timestamp,
    MessageHandle,
};

/// Recipient type of primary (To) recipients.
pub const RECIPIENT_TO: i64 = 1;
/// Recipient type of carbon-copy (Cc) recipients.
pub const RECIPIENT_CC: i64 = 2;

/// Attachment name fields, in order of preference.
const FILENAME_FIELDS: [&str; 3] = ["longFilename", "shortFilename", "name"];

/// Parse the message at `path` with the context's decoder.
///
/// Never fails: an unavailable decoder or an unopenable file produces a
/// record with `is_valid == false` and an `error_message`.
pub fn parse_msg(ctx: &DecoderContext, path: impl AsRef<Path>) -> EmailMessage {
    let path = path.as_ref();
    let _guard = ctx.lock();

    let handle = match open(ctx, path) {
        Ok(handle) => handle,
        Err(e) if e.is_capability_error() => {
            warn!(path = %path.display(), error = %e, "No MSG decoder, skipping file");
            return EmailMessage::invalid(&e);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot parse MSG file");
            return EmailMessage::invalid(&e);
        }
    };

    let message = extract_message(&handle);
    handle.close();

    info!(
        path = %path.display(),
        attachments = message.attachments.len(),
        "Parsed MSG file"
    );
    message
}

fn open(ctx: &DecoderContext, path: &Path) -> Result<MessageHandle> {
    let decoder = ctx.decoder()?;
    MessageHandle::open(decoder, path)
}

/// Build the canonical record from an opened message object.
pub fn extract_message<O: ForeignObject + ?Sized>(msg: &O) -> EmailMessage {
    let sender = get_string(msg, "sender")
        .map(|raw| EmailAddress::split_sender(&raw))
        .unwrap_or_default();
    let (to_recipients, cc_recipients) = extract_recipients(msg);

    EmailMessage {
        subject: get_string(msg, "subject").unwrap_or_default(),
        body_plain_text: get_string(msg, "body").unwrap_or_default(),
        body_html: extract_html_body(msg).unwrap_or_default(),
        sender_name: sender.display_name,
        sender_email: sender.address,
        to_recipients,
        cc_recipients,
        bcc_recipients: String::new(),
        date: get_timestamp(msg, "date"),
        attachments: extract_attachments(msg),
        is_valid: true,
        error_message: String::new(),
    }
}

fn extract_html_body<O: ForeignObject + ?Sized>(msg: &O) -> Option<String> {
    let bytes = get_bytes(msg, "htmlBody")?;
    match String::from_utf8(bytes) {
        Ok(html) => Some(html),
        Err(e) => {
            debug!(error = %e, "HTML body is not valid UTF-8");
            None
        }
    }
}

/// Resolve To and Cc from the recipient list, each falling back to its flat field.
fn extract_recipients<O: ForeignObject + ?Sized>(msg: &O) -> (String, String) {
    let mut to = String::new();
    let mut cc = String::new();

    for recipient in get_list(msg, "recipients") {
        let recipient = recipient.as_ref();
        let kind = get_int(recipient, "type").unwrap_or(0);
        let Some(email) = get_string(recipient, "email") else {
            continue;
        };
        match kind {
            RECIPIENT_TO => push_joined(&mut to, &email),
            RECIPIENT_CC => push_joined(&mut cc, &email),
            other => debug!(kind = other, "Ignoring recipient of unknown type"),
        }
    }

    if to.is_empty() {
        to = get_string(msg, "to")
            .map(|raw| strip_angle_brackets(&raw))
            .unwrap_or_default();
    }
    if cc.is_empty() {
        cc = get_string(msg, "cc")
            .map(|raw| strip_angle_brackets(&raw))
            .unwrap_or_default();
    }

    (to, cc)
}

fn extract_attachments<O: ForeignObject + ?Sized>(msg: &O) -> Vec<EmailAttachment> {
    let mut attachments = Vec::new();

    for entry in get_list(msg, "attachments") {
        let entry = entry.as_ref();
        let filename = FILENAME_FIELDS
            .iter()
            .find_map(|field| get_string(entry, field));
        let mime_type = get_string(entry, "mimetype").unwrap_or_default();
        // The payload is a method on some attachment kinds and a property on others.
        let data = get_bytes_from_callable(entry, "data")
            .or_else(|| get_bytes(entry, "data"))
            .unwrap_or_default();

        let attachment = EmailAttachment::new(attachments.len() + 1, filename, mime_type, data);
        debug!(
            filename = attachment.filename(),
            size = attachment.size(),
            "Extracted attachment"
        );
        attachments.push(attachment);
    }

    attachments
}
