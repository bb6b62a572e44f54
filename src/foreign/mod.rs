//! Capability interface to the external MSG decoder.
//!
//! The decoder exposes a dynamically typed object graph. This module narrows
//! it to attribute lookups returning a tagged [`Value`], plus the loading
//! and opening steps, and provides in-memory and JSON-backed implementations.

pub mod command;
pub mod context;
pub mod decoder;
pub mod json;
pub mod object;
pub mod value;

pub use context::DecoderContext;
pub use decoder::{Decoder, DecoderLoader};
pub use object::{DynMessage, DynObject, ForeignMessage, ForeignObject, TimestampObject};
pub use value::{ForeignError, Value};

use crate::config::{DecoderBackend, DecoderConfig};

/// The loader for the configured decoder backend.
pub fn loader_for(config: &DecoderConfig) -> Box<dyn DecoderLoader> {
    match config.backend {
        DecoderBackend::Json => Box::new(json::JsonLoader),
        DecoderBackend::Command => Box::new(command::CommandLoader {
            command: config.command.clone(),
            probe_args: config.probe_args.clone(),
        }),
    }
}
