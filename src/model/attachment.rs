//! Attachment records.

use base64::Engine as _;
use serde::{Serialize, Serializer};

/// One binary attachment of a message.
///
/// Fields are private so that `size` always equals the payload length and
/// the filename is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailAttachment {
    filename: String,
    mime_type: String,
    size: u64,
    #[serde(serialize_with = "serialize_base64")]
    data: Vec<u8>,
}

impl EmailAttachment {
    /// Build an attachment at 1-based `position` within its message.
    ///
    /// A missing or empty `filename` is replaced by `attachment_<position>`.
    pub fn new(
        position: usize,
        filename: Option<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let filename = filename
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| synthetic_filename(position));
        Self {
            filename,
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Display name, never empty.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content type, empty when unknown.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Name given to an attachment without one.
pub fn synthetic_filename(position: usize) -> String {
    format!("attachment_{position}")
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_follows_data() {
        let att = EmailAttachment::new(1, Some("a.txt".into()), "text/plain", b"hello".to_vec());
        assert_eq!(att.size(), 5);
        assert_eq!(att.data(), b"hello");
        assert_eq!(att.filename(), "a.txt");
        assert_eq!(att.mime_type(), "text/plain");
    }

    #[test]
    fn test_synthetic_filename() {
        let att = EmailAttachment::new(3, None, "", Vec::new());
        assert_eq!(att.filename(), "attachment_3");
        assert_eq!(att.size(), 0);

        let att = EmailAttachment::new(2, Some(String::new()), "", Vec::new());
        assert_eq!(att.filename(), "attachment_2");
    }

    #[test]
    fn test_serializes_payload_as_base64() {
        let att = EmailAttachment::new(1, Some("b.bin".into()), "", vec![0, 1, 2]);
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["data"], "AAEC");
        assert_eq!(json["size"], 3);
        assert_eq!(json["filename"], "b.bin");
    }
}
