//! Canonical records produced by the normalization engine.

pub mod address;
pub mod attachment;
pub mod message;

pub use address::EmailAddress;
pub use attachment::EmailAttachment;
pub use message::EmailMessage;
