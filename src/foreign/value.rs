//! Tagged values returned by foreign attribute lookups.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use super::object::ForeignObject;

/// An error raised on the foreign side (attribute lookup, call, open, close).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ForeignError(pub String);

impl ForeignError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Zero-argument foreign callable.
pub type Callable = Rc<dyn Fn() -> Result<Value, ForeignError>>;

/// A loosely typed foreign value.
///
/// This is the whole surface the decoder exposes: there is no general
/// dynamic escape hatch beyond these variants.
#[derive(Clone, Default)]
pub enum Value {
    /// Null / absent.
    #[default]
    None,
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    /// A nested object addressed by attribute name.
    Object(Rc<dyn ForeignObject>),
    /// A method or property getter that must be invoked to produce its value.
    Callable(Callable),
}

impl Value {
    /// Wrap a closure as a callable value.
    pub fn callable(f: impl Fn() -> Result<Value, ForeignError> + 'static) -> Self {
        Self::Callable(Rc::new(f))
    }

    /// Wrap a foreign object.
    pub fn object(obj: impl ForeignObject + 'static) -> Self {
        Self::Object(Rc::new(obj))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Callable(_) => "callable",
        }
    }

    /// Convert to text the way the decoder would stringify the value.
    ///
    /// Bytes convert only when they are valid UTF-8. Lists and callables
    /// have no text form.
    pub fn coerce_text(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Str(s) => Some(s.clone()),
            Self::Bytes(b) => std::str::from_utf8(b).ok().map(str::to_string),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Object(obj) => obj.to_text(),
            Self::List(_) | Self::Callable(_) => None,
        }
    }

    /// Generic bytes coercion.
    ///
    /// Bytes pass through, strings become their UTF-8 encoding, and a list
    /// of integers in `0..=255` becomes the corresponding byte string.
    pub fn coerce_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(b) => Some(b.clone()),
            Self::Str(s) => Some(s.as_bytes().to_vec()),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::Int(i) => u8::try_from(*i).ok(),
                    _ => None,
                })
                .collect(),
            Self::Object(obj) => obj.to_bytes(),
            Self::None | Self::Int(_) | Self::Float(_) | Self::Callable(_) => None,
        }
    }

    /// Interpret as a number of seconds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Object(_) => write!(f, "Object(..)"),
            Self::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}
