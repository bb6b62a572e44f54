//! Attribute-addressable foreign objects and an in-memory implementation.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};

use super::value::{ForeignError, Value};

/// An object of the decoder's object graph, addressed by attribute name.
///
/// A lookup may fail (the foreign side raised) or return [`Value::None`]
/// (the attribute exists but is null). Callers treat both as absence.
pub trait ForeignObject {
    /// Look up an attribute by name.
    fn getattr(&self, name: &str) -> Result<Value, ForeignError>;

    /// Text form of the object itself, if it has one.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Byte form of the object itself, if it has one.
    fn to_bytes(&self) -> Option<Vec<u8>> {
        None
    }
}

/// The top-level decoded message, which holds decoder resources until closed.
pub trait ForeignMessage: ForeignObject {
    /// Release the decoder's resources for this message.
    fn close(&mut self) -> Result<(), ForeignError>;
}

/// Object with no attributes, standing in for a list element that is not an object.
///
/// Keeps the element's position in its list; every attribute lookup raises.
pub struct Opaque(pub Value);

impl ForeignObject for Opaque {
    fn getattr(&self, name: &str) -> Result<Value, ForeignError> {
        Err(ForeignError::new(format!(
            "'{}' value has no attribute '{name}'",
            self.0.kind()
        )))
    }

    fn to_text(&self) -> Option<String> {
        self.0.coerce_text()
    }

    fn to_bytes(&self) -> Option<Vec<u8>> {
        self.0.coerce_bytes()
    }
}

/// In-memory foreign object: a map of attribute name to value.
///
/// Attributes not present in the map raise on lookup, mirroring a missing
/// attribute on the foreign side. An attribute can also be set to raise
/// explicitly with [`DynObject::with_error`].
#[derive(Clone, Default, Debug)]
pub struct DynObject {
    attrs: BTreeMap<String, Result<Value, ForeignError>>,
    text: Option<String>,
}

impl DynObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an attribute.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder: make an attribute raise on lookup.
    pub fn with_error(mut self, name: &str, message: &str) -> Self {
        self.attrs
            .insert(name.to_string(), Err(ForeignError::new(message)));
        self
    }

    /// Builder: give the object a text form.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attrs.insert(name.to_string(), Ok(value.into()));
    }

    pub fn set_error(&mut self, name: &str, message: &str) {
        self.attrs
            .insert(name.to_string(), Err(ForeignError::new(message)));
    }
}

impl ForeignObject for DynObject {
    fn getattr(&self, name: &str) -> Result<Value, ForeignError> {
        match self.attrs.get(name) {
            Some(slot) => slot.clone(),
            None => Err(ForeignError::new(format!("object has no attribute '{name}'"))),
        }
    }

    fn to_text(&self) -> Option<String> {
        self.text.clone()
    }
}

/// In-memory decoded message with close accounting.
///
/// `close_count` is shared so callers can observe how many times the
/// message was closed after it has been moved into a handle.
#[derive(Debug, Default)]
pub struct DynMessage {
    object: DynObject,
    close_count: Rc<Cell<u32>>,
    close_error: Option<ForeignError>,
}

impl DynMessage {
    pub fn new(object: DynObject) -> Self {
        Self {
            object,
            close_count: Rc::new(Cell::new(0)),
            close_error: None,
        }
    }

    /// Make `close()` report a foreign error (resources are still counted as released).
    pub fn with_close_error(mut self, message: &str) -> Self {
        self.close_error = Some(ForeignError::new(message));
        self
    }

    /// Shared counter of `close()` calls.
    pub fn close_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.close_count)
    }
}

impl ForeignObject for DynMessage {
    fn getattr(&self, name: &str) -> Result<Value, ForeignError> {
        self.object.getattr(name)
    }

    fn to_text(&self) -> Option<String> {
        self.object.to_text()
    }
}

impl ForeignMessage for DynMessage {
    fn close(&mut self) -> Result<(), ForeignError> {
        self.close_count.set(self.close_count.get() + 1);
        match &self.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Date-valued object exposing a callable `timestamp()` (seconds since the epoch).
///
/// Its text form is the RFC 3339 rendering of the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampObject {
    pub seconds: f64,
}

impl TimestampObject {
    pub fn new(seconds: f64) -> Self {
        Self { seconds }
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        let millis = (self.seconds * 1000.0).round();
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }
}

impl ForeignObject for TimestampObject {
    fn getattr(&self, name: &str) -> Result<Value, ForeignError> {
        match name {
            "timestamp" => {
                let seconds = self.seconds;
                Ok(Value::callable(move || Ok(Value::Float(seconds))))
            }
            _ => Err(ForeignError::new(format!(
                "timestamp object has no attribute '{name}'"
            ))),
        }
    }

    fn to_text(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }
}
