//! The external decoding capability.

use std::path::Path;

use super::object::ForeignMessage;
use super::value::ForeignError;

/// A loaded decoder that can open message files.
pub trait Decoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Open a file and return its decoded message object.
    ///
    /// Fails when the file is unreadable, corrupt, or not a message.
    fn open(&self, path: &Path) -> Result<Box<dyn ForeignMessage>, ForeignError>;
}

/// Loads the decoding capability. Run at most once per [`DecoderContext`].
///
/// [`DecoderContext`]: super::context::DecoderContext
pub trait DecoderLoader {
    fn load(&self) -> Result<Box<dyn Decoder>, ForeignError>;
}

impl<F> DecoderLoader for F
where
    F: Fn() -> Result<Box<dyn Decoder>, ForeignError>,
{
    fn load(&self) -> Result<Box<dyn Decoder>, ForeignError> {
        self()
    }
}
