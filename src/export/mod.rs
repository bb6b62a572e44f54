//! Export functionality: text and JSON renderings, attachment extraction.

pub mod attachment;
pub mod json;
pub mod text;
