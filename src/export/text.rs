//! Render messages as plain text.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::DisplayConfig;
use crate::model::EmailMessage;

use super::attachment::{sanitize_filename_part, unique_path};

/// Column width HTML bodies are wrapped to.
const RENDER_WIDTH: usize = 80;

/// Render headers, body and attachment list of a message.
///
/// Missing fields are shown with placeholders rather than left blank.
pub fn render_message(msg: &EmailMessage, display: &DisplayConfig) -> String {
    let mut content = String::new();

    let subject = non_empty_or(&msg.subject, "(no subject)");
    let from = msg
        .sender_display()
        .unwrap_or_else(|| "(unknown sender)".to_string());
    let to = non_empty_or(&msg.to_recipients, "(no recipients)");
    let cc = non_empty_or(&msg.cc_recipients, "-");
    let date = match msg.date {
        Some(dt) if display.local_time => dt
            .with_timezone(&Local)
            .format(&display.date_format)
            .to_string(),
        Some(dt) => dt.format(&display.date_format).to_string(),
        None => "(unknown date)".to_string(),
    };

    content.push_str(&format!("Subject: {subject}\n"));
    content.push_str(&format!("From:    {from}\n"));
    content.push_str(&format!("To:      {to}\n"));
    content.push_str(&format!("Cc:      {cc}\n"));
    content.push_str(&format!("Date:    {date}\n"));
    content.push_str(&format!("\n{}\n\n", "-".repeat(72)));

    content.push_str(&body_text(msg));
    content.push('\n');

    if !msg.attachments.is_empty() {
        let total = humansize::format_size(msg.total_attachment_size(), humansize::BINARY);
        content.push_str(&format!(
            "\n[Attachments: {} file(s), {total}]\n",
            msg.attachments.len()
        ));
        for att in &msg.attachments {
            let size = humansize::format_size(att.size(), humansize::BINARY);
            let mime = non_empty_or(att.mime_type(), "unknown type");
            content.push_str(&format!("  - {} ({mime}, {size})\n", att.filename()));
        }
    }

    content
}

/// Write the rendered message to `{output_dir}/{subject}.txt`.
///
/// An existing file is never overwritten; a counter suffix is added instead.
pub fn export_text(
    msg: &EmailMessage,
    display: &DisplayConfig,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let subject = sanitize_filename_part(&msg.subject, 80);
    let path = unique_path(&output_dir.join(format!("{subject}.txt")));
    std::fs::write(&path, render_message(msg, display))?;
    Ok(path)
}

/// Body for terminal display: plain text, else the HTML stripped to text.
fn body_text(msg: &EmailMessage) -> String {
    let body = if !msg.body_plain_text.is_empty() {
        msg.body_plain_text.clone()
    } else if !msg.body_html.is_empty() {
        html_to_text(&msg.body_html)
    } else {
        return "(no message body)".to_string();
    };
    body.replace('\0', "")
}

fn non_empty_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Convert HTML to wrapped plain text for terminal display.
///
/// Script and style content is dropped and entities are decoded. Markup that
/// cannot be rendered yields an empty string.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to render HTML body");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::EmailAttachment;

    fn utc_display() -> DisplayConfig {
        DisplayConfig {
            date_format: "%Y-%m-%d %H:%M".to_string(),
            local_time: false,
        }
    }

    #[test]
    fn test_render_placeholders() {
        let msg = EmailMessage {
            is_valid: true,
            ..EmailMessage::default()
        };
        let text = render_message(&msg, &utc_display());
        assert!(text.contains("Subject: (no subject)"));
        assert!(text.contains("From:    (unknown sender)"));
        assert!(text.contains("To:      (no recipients)"));
        assert!(text.contains("Cc:      -"));
        assert!(text.contains("Date:    (unknown date)"));
        assert!(text.contains("(no message body)"));
        assert!(!text.contains("[Attachments"));
    }

    #[test]
    fn test_render_full_message() {
        let msg = EmailMessage {
            subject: "Hello".into(),
            body_plain_text: "Body\0 text".into(),
            sender_name: "Jane".into(),
            sender_email: "jane@example.com".into(),
            to_recipients: "a@example.com, c@example.com".into(),
            date: Some(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()),
            attachments: vec![
                EmailAttachment::new(1, Some("a.pdf".into()), "application/pdf", vec![0; 2048]),
                EmailAttachment::new(2, None, "", Vec::new()),
            ],
            is_valid: true,
            ..EmailMessage::default()
        };
        let text = render_message(&msg, &utc_display());
        assert!(text.contains("From:    Jane <jane@example.com>"));
        assert!(text.contains("To:      a@example.com, c@example.com"));
        assert!(text.contains("Date:    2024-05-06 07:08"));
        assert!(text.contains("Body text"));
        assert!(text.contains("[Attachments: 2 file(s), 2 KiB]"));
        assert!(text.contains("  - a.pdf (application/pdf, 2 KiB)"));
        assert!(text.contains("  - attachment_2 (unknown type, 0 B)"));
    }

    #[test]
    fn test_render_html_only_body() {
        let msg = EmailMessage {
            body_html: "<p>Hello world</p><p>Second &amp; last</p>".into(),
            is_valid: true,
            ..EmailMessage::default()
        };
        let text = render_message(&msg, &utc_display());
        assert!(text.contains("Hello world"));
        assert!(text.contains("Second & last"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_html_to_text_entities() {
        assert_eq!(html_to_text("<p>Tom &amp; Jerry &lt;3&gt;</p>"), "Tom & Jerry <3>");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_html_to_text_non_ascii_around_script() {
        // Characters whose lowercase form has a different byte length.
        let text = html_to_text("<script>\u{130}</script>\u{e9}");
        assert!(text.contains('\u{e9}'));

        let html = "<p>\u{212a}elvin \u{2126}hm</p><style>p { color: red; }</style><p>caf\u{e9} \u{130}stanbul</p>";
        let text = html_to_text(html);
        assert!(text.contains("\u{212a}elvin \u{2126}hm"));
        assert!(text.contains("caf\u{e9} \u{130}stanbul"));
    }

    #[test]
    fn test_html_to_text_wraps_long_lines() {
        let html = format!("<p>{}</p>", "word ".repeat(40));
        let text = html_to_text(&html);
        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|line| line.chars().count() <= RENDER_WIDTH));
    }

    #[test]
    fn test_export_text_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let msg = EmailMessage {
            subject: "Status: done".into(),
            is_valid: true,
            ..EmailMessage::default()
        };
        let path = export_text(&msg, &utc_display(), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Status__done.txt");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Subject: Status: done"));
    }

    #[test]
    fn test_export_text_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = EmailMessage {
            subject: "Weekly".into(),
            body_plain_text: "first".into(),
            is_valid: true,
            ..EmailMessage::default()
        };
        let second = EmailMessage {
            body_plain_text: "second".into(),
            ..first.clone()
        };

        let first_path = export_text(&first, &utc_display(), dir.path()).unwrap();
        let second_path = export_text(&second, &utc_display(), dir.path()).unwrap();

        assert_eq!(first_path.file_name().unwrap(), "Weekly.txt");
        assert_eq!(second_path.file_name().unwrap(), "Weekly_1.txt");
        assert!(std::fs::read_to_string(first_path).unwrap().contains("first"));
        assert!(std::fs::read_to_string(second_path).unwrap().contains("second"));
    }
}
