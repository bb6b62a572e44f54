//! Export messages as JSON documents.

use std::path::{Path, PathBuf};

use crate::model::EmailMessage;

use super::attachment::{sanitize_filename_part, unique_path};

/// Pretty-printed JSON of the whole record, attachment payloads as base64.
pub fn to_json(msg: &EmailMessage) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(msg)?)
}

/// Write the record to `{output_dir}/{subject}.json`, never overwriting.
pub fn export_json(msg: &EmailMessage, output_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let subject = sanitize_filename_part(&msg.subject, 80);
    let path = unique_path(&output_dir.join(format!("{subject}.json")));
    std::fs::write(&path, to_json(msg)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::EmailAttachment;

    #[test]
    fn test_to_json_fields() {
        let msg = EmailMessage {
            subject: "Hi".into(),
            date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            attachments: vec![EmailAttachment::new(1, None, "text/plain", b"ok".to_vec())],
            is_valid: true,
            ..EmailMessage::default()
        };
        let json: serde_json::Value = serde_json::from_str(&to_json(&msg).unwrap()).unwrap();
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["is_valid"], true);
        assert_eq!(json["bcc_recipients"], "");
        assert_eq!(json["date"], "2024-01-01T00:00:00Z");
        assert_eq!(json["attachments"][0]["filename"], "attachment_1");
        assert_eq!(json["attachments"][0]["data"], "b2s=");
    }

    #[test]
    fn test_invalid_message_has_null_date() {
        let msg = EmailMessage {
            error_message: "boom".into(),
            ..EmailMessage::default()
        };
        let json: serde_json::Value = serde_json::from_str(&to_json(&msg).unwrap()).unwrap();
        assert_eq!(json["is_valid"], false);
        assert!(json["date"].is_null());
        assert_eq!(json["error_message"], "boom");
    }

    #[test]
    fn test_export_json_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let msg = EmailMessage {
            subject: "Report".into(),
            is_valid: true,
            ..EmailMessage::default()
        };
        std::fs::write(dir.path().join("Report.json"), "keep").unwrap();

        let path = export_json(&msg, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Report_1.json");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Report.json")).unwrap(),
            "keep"
        );
    }
}
