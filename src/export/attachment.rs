//! Save attachments to disk.

use std::path::{Path, PathBuf};

use crate::model::{EmailAttachment, EmailMessage};

/// Write one attachment into `output_dir`.
///
/// The filename is sanitized and never overwrites an existing file.
pub fn save_attachment(attachment: &EmailAttachment, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let filename = sanitize_filename_part(attachment.filename(), 150);
    let path = unique_path(&output_dir.join(&filename));
    std::fs::write(&path, attachment.data())?;
    tracing::debug!(path = %path.display(), size = attachment.size(), "Saved attachment");
    Ok(path)
}

/// Write every attachment of a message into `output_dir`, creating it if needed.
///
/// A failing attachment is logged and skipped; the others are still saved.
pub fn save_all_attachments(msg: &EmailMessage, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut paths = Vec::with_capacity(msg.attachments.len());

    for att in &msg.attachments {
        match save_attachment(att, output_dir) {
            Ok(path) => paths.push(path),
            Err(e) => {
                tracing::warn!(
                    filename = att.filename(),
                    error = %e,
                    "Failed to save attachment"
                );
            }
        }
    }

    Ok(paths)
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    // A name made only of dots would address the directory itself.
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// First free path among `path`, `{stem}_1.{ext}`, `{stem}_2.{ext}`, ...
pub(crate) fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or(Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let suffix = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{ext}"),
        _ => String::new(),
    };

    (1..)
        .map(|n| parent.join(format!("{stem}_{n}{suffix}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename_part("hello world", 20), "hello_world");
        assert_eq!(sanitize_filename_part("report.pdf", 30), "report.pdf");
        assert_eq!(sanitize_filename_part("a/b\\c:d*e", 20), "a_b_c_d_e");
        assert_eq!(sanitize_filename_part("", 20), "unknown");
        assert_eq!(sanitize_filename_part("..", 20), "unknown");
    }

    #[test]
    fn test_save_attachment_never_overwrites() {
        let dir = assert_fs::TempDir::new().unwrap();
        let att = EmailAttachment::new(1, Some("notes.txt".into()), "text/plain", b"one".to_vec());

        let first = save_attachment(&att, dir.path()).unwrap();
        let second = save_attachment(&att, dir.path()).unwrap();

        assert_eq!(first.file_name().unwrap(), "notes.txt");
        assert_eq!(second.file_name().unwrap(), "notes_1.txt");
        dir.child("notes.txt").assert("one");
        dir.child("notes_1.txt").assert(predicate::path::exists());
    }

    #[test]
    fn test_save_all_attachments() {
        let dir = assert_fs::TempDir::new().unwrap();
        let out = dir.child("out");
        let msg = EmailMessage {
            attachments: vec![
                EmailAttachment::new(1, Some("../escape.bin".into()), "", vec![1, 2]),
                EmailAttachment::new(2, None, "", Vec::new()),
            ],
            is_valid: true,
            ..EmailMessage::default()
        };

        let paths = save_all_attachments(&msg, out.path()).unwrap();
        assert_eq!(paths.len(), 2);
        out.child(".._escape.bin").assert(predicate::path::is_file());
        out.child("attachment_2").assert("");
        dir.child("escape.bin").assert(predicate::path::missing());
    }

    #[test]
    fn test_unique_path_without_extension() {
        let dir = assert_fs::TempDir::new().unwrap();
        let target = dir.child("README");
        assert_eq!(unique_path(target.path()), target.path());

        target.touch().unwrap();
        dir.child("README_1").touch().unwrap();
        assert_eq!(unique_path(target.path()), dir.path().join("README_2"));
    }
}
