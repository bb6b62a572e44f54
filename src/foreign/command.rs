//! Decoder backed by an external program that dumps a message as JSON.
//!
//! The program is invoked as `<program> <args...> <path>` and must print a
//! message document (see [`super::json`]) on stdout.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use super::decoder::{Decoder, DecoderLoader};
use super::json::parse_document;
use super::object::ForeignMessage;
use super::value::ForeignError;

/// Runs an external dump program for every opened message.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
}

impl CommandDecoder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Decoder for CommandDecoder {
    fn name(&self) -> &str {
        &self.program
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ForeignMessage>, ForeignError> {
        debug!(program = %self.program, path = %path.display(), "Running MSG dump command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ForeignError::new(format!("cannot run '{}': {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ForeignError::new(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ForeignError::new(format!("output is not UTF-8: {e}")))?;
        let message = parse_document(&stdout)?;
        Ok(Box::new(message))
    }
}

/// Loads a [`CommandDecoder`] after checking the program can run.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    /// Program followed by its fixed arguments.
    pub command: Vec<String>,
    /// Arguments for the availability probe (e.g. `--version`).
    pub probe_args: Vec<String>,
}

impl DecoderLoader for CommandLoader {
    fn load(&self) -> Result<Box<dyn Decoder>, ForeignError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| ForeignError::new("no decoder command configured"))?;

        let status = Command::new(program)
            .args(&self.probe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ForeignError::new(format!("cannot run '{program}': {e}")))?;

        if !status.success() {
            return Err(ForeignError::new(format!(
                "'{program}' availability probe exited with {status}"
            )));
        }

        Ok(Box::new(CommandDecoder::new(program.clone(), args.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_fails_to_load() {
        let loader = CommandLoader {
            command: Vec::new(),
            probe_args: Vec::new(),
        };
        let err = loader.load().err().unwrap();
        assert_eq!(err.0, "no decoder command configured");
    }

    #[test]
    fn test_missing_program_fails_to_load() {
        let loader = CommandLoader {
            command: vec!["msgview-no-such-program-xyz".to_string()],
            probe_args: vec!["--version".to_string()],
        };
        let err = loader.load().err().unwrap();
        assert!(err.0.contains("cannot run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_cat_decodes_json_file() {
        use crate::foreign::object::ForeignObject;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, r#"{"subject": "from cat"}"#).unwrap();

        let decoder = CommandDecoder::new("cat", Vec::new());
        let msg = decoder.open(&path).unwrap();
        assert_eq!(
            msg.getattr("subject").unwrap().coerce_text().as_deref(),
            Some("from cat")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_open_error() {
        let decoder = CommandDecoder::new("cat", Vec::new());
        let err = decoder.open(Path::new("/nonexistent/file.msg")).err().unwrap();
        assert!(err.0.contains("exited with"));
    }
}
