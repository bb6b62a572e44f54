//! Explicit state holding the once-initialized decoding capability.

use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{MsgError, Result};

use super::decoder::{Decoder, DecoderLoader};

/// Owns the decoding capability for the lifetime of the context.
///
/// The first call to [`DecoderContext::initialize`] runs the loader and
/// caches its outcome, success or failure. Later calls never retry.
pub struct DecoderContext {
    decoder: OnceCell<std::result::Result<Box<dyn Decoder>, String>>,
    lock: Mutex<()>,
}

impl DecoderContext {
    /// An uninitialized context.
    pub fn new() -> Self {
        Self {
            decoder: OnceCell::new(),
            lock: Mutex::new(()),
        }
    }

    /// A context already initialized with `decoder`.
    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Self {
        let ctx = Self::new();
        let _ = ctx.decoder.set(Ok(decoder));
        ctx
    }

    /// Load the capability with `loader` unless a previous call already did.
    pub fn initialize(&self, loader: &dyn DecoderLoader) -> Result<&dyn Decoder> {
        self.decoder.get_or_init(|| match loader.load() {
            Ok(decoder) => {
                info!(decoder = decoder.name(), "Loaded MSG decoder");
                Ok(decoder)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load MSG decoder");
                Err(e.to_string())
            }
        });
        self.decoder()
    }

    /// The loaded decoder, or `CapabilityUnavailable`.
    pub fn decoder(&self) -> Result<&dyn Decoder> {
        match self.decoder.get() {
            Some(Ok(decoder)) => Ok(decoder.as_ref()),
            Some(Err(reason)) => Err(MsgError::CapabilityUnavailable(reason.clone())),
            None => Err(MsgError::CapabilityUnavailable(
                "decoder not initialized".to_string(),
            )),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.decoder.get().is_some()
    }

    /// Serialize access to the decoder for the duration of one parse.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        // A poisoned lock only means an earlier parse panicked; the guarded
        // unit value has nothing to repair.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DecoderContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::Path;

    use super::*;
    use crate::foreign::object::ForeignMessage;
    use crate::foreign::value::ForeignError;

    struct NullDecoder;

    impl Decoder for NullDecoder {
        fn name(&self) -> &str {
            "null"
        }

        fn open(&self, path: &Path) -> std::result::Result<Box<dyn ForeignMessage>, ForeignError> {
            Err(ForeignError::new(format!("cannot open {}", path.display())))
        }
    }

    #[test]
    fn test_uninitialized_is_unavailable() {
        let ctx = DecoderContext::new();
        assert!(!ctx.is_initialized());
        assert!(matches!(
            ctx.decoder(),
            Err(MsgError::CapabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_first_successful_load_wins() {
        let ctx = DecoderContext::new();
        let calls = Cell::new(0);
        let loader = || -> std::result::Result<Box<dyn Decoder>, ForeignError> {
            calls.set(calls.get() + 1);
            Ok(Box::new(NullDecoder))
        };
        assert_eq!(ctx.initialize(&loader).unwrap().name(), "null");
        assert_eq!(ctx.initialize(&loader).unwrap().name(), "null");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_load_is_never_retried() {
        let ctx = DecoderContext::new();
        let failing = || -> std::result::Result<Box<dyn Decoder>, ForeignError> {
            Err(ForeignError::new("module not found"))
        };
        let working = || -> std::result::Result<Box<dyn Decoder>, ForeignError> {
            Ok(Box::new(NullDecoder))
        };

        let err = ctx.initialize(&failing).err().unwrap();
        assert!(err.to_string().contains("module not found"));

        let err = ctx.initialize(&working).err().unwrap();
        assert!(matches!(err, MsgError::CapabilityUnavailable(_)));
    }

    #[test]
    fn test_with_decoder_is_initialized() {
        let ctx = DecoderContext::with_decoder(Box::new(NullDecoder));
        assert!(ctx.is_initialized());
        assert_eq!(ctx.decoder().unwrap().name(), "null");
    }
}
