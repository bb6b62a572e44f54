//! Defensive accessors over the decoder's object graph.
//!
//! Every accessor resolves a missing, null, raising or unconvertible field
//! to `None` (or an empty list). Nothing here returns an error except
//! [`MessageHandle::open`].

use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, trace};

use crate::error::{MsgError, Result};
use crate::foreign::object::Opaque;
use crate::foreign::{Decoder, ForeignError, ForeignMessage, ForeignObject, Value};

/// An opened decoded message.
///
/// The foreign message is closed exactly once: by [`MessageHandle::close`]
/// or, on any other exit path, when the handle is dropped.
pub struct MessageHandle {
    path: PathBuf,
    inner: Option<Box<dyn ForeignMessage>>,
}

impl MessageHandle {
    /// Ask the decoder to open `path`.
    pub fn open(decoder: &dyn Decoder, path: &Path) -> Result<Self> {
        let inner = decoder
            .open(path)
            .map_err(|e| MsgError::open_failed(path, e))?;
        info!(path = %path.display(), decoder = decoder.name(), "Opened MSG file");
        Ok(Self {
            path: path.to_path_buf(),
            inner: Some(inner),
        })
    }

    /// Path the handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the foreign message now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            match inner.close() {
                Ok(()) => debug!(path = %self.path.display(), "Closed MSG file"),
                Err(e) => debug!(
                    path = %self.path.display(),
                    error = %e,
                    "Decoder reported an error while closing"
                ),
            }
        }
    }
}

impl ForeignObject for MessageHandle {
    fn getattr(&self, name: &str) -> std::result::Result<Value, ForeignError> {
        match &self.inner {
            Some(inner) => inner.getattr(name),
            None => Err(ForeignError::new("message is closed")),
        }
    }
}

impl Drop for MessageHandle {
    fn drop(&mut self) {
        self.release();
    }
}

// ── Field accessors ─────────────────────────────────────────────

/// Look up `field`, treating null and foreign errors as absence.
fn lookup<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<Value> {
    match obj.getattr(field) {
        Ok(Value::None) => None,
        Ok(value) => Some(value),
        Err(e) => {
            trace!(field, error = %e, "Field unavailable");
            None
        }
    }
}

/// Textual value of `field`. Empty text counts as absent.
pub fn get_string<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<String> {
    let value = lookup(obj, field)?;
    let text = value.coerce_text();
    if text.is_none() {
        debug!(field, kind = value.kind(), "Field has no text form");
    }
    text.filter(|s| !s.is_empty())
}

/// Binary value of `field`, coercing non-bytes values. Empty counts as absent.
pub fn get_bytes<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<Vec<u8>> {
    let value = lookup(obj, field)?;
    let bytes = value.coerce_bytes();
    if bytes.is_none() {
        debug!(field, kind = value.kind(), "Field has no byte form");
    }
    bytes.filter(|b| !b.is_empty())
}

/// Binary value of `field` when it is exposed as a zero-argument method.
///
/// A callable field is invoked and its result coerced; any other value is
/// coerced as a plain attribute.
pub fn get_bytes_from_callable<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<Vec<u8>> {
    let value = match lookup(obj, field)? {
        Value::Callable(f) => match f() {
            Ok(result) => result,
            Err(e) => {
                debug!(field, error = %e, "Field method raised");
                return None;
            }
        },
        plain => plain,
    };
    value.coerce_bytes().filter(|b| !b.is_empty())
}

/// Integer value of `field`.
pub fn get_int<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<i64> {
    match lookup(obj, field)? {
        Value::Int(i) => Some(i),
        other => {
            debug!(field, kind = other.kind(), "Field is not an integer");
            None
        }
    }
}

/// Date value of `field`.
///
/// Tries the value's `timestamp()` method (seconds since the epoch), then
/// its text as ISO-8601.
pub fn get_timestamp<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Option<DateTime<Utc>> {
    let value = lookup(obj, field)?;

    if let Value::Object(date) = &value {
        if let Some(dt) = call_timestamp(date.as_ref()) {
            return Some(dt);
        }
    }

    let parsed = value.coerce_text().and_then(|text| parse_iso8601(&text));
    if parsed.is_none() {
        debug!(field, kind = value.kind(), "Field is not a date");
    }
    parsed
}

/// Elements of a list-shaped `field`, in source order.
///
/// Elements that are not objects keep their position as objects without
/// attributes.
pub fn get_list<O: ForeignObject + ?Sized>(obj: &O, field: &str) -> Vec<Rc<dyn ForeignObject>> {
    match lookup(obj, field) {
        Some(Value::List(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(element) => element,
                other => Rc::new(Opaque(other)) as Rc<dyn ForeignObject>,
            })
            .collect(),
        Some(other) => {
            debug!(field, kind = other.kind(), "Field is not a list");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn call_timestamp(date: &dyn ForeignObject) -> Option<DateTime<Utc>> {
    let Ok(Value::Callable(method)) = date.getattr("timestamp") else {
        return None;
    };
    let seconds = method().ok()?.as_f64()?;
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parse an ISO-8601 date or date-time. Values without an offset are taken as UTC.
///
/// Accepts `T` or a space between date and time, an optional fraction,
/// and `Z`, `+hh:mm` or `+hhmm` offsets.
pub fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let normalized = match text.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &text[..10], text[11..].trim_start()),
        _ => text.to_string(),
    };
    let s = normalized.as_str();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
