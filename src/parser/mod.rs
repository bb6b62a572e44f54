//! MSG parsing: defensive access to the decoder's object graph and
//! normalization into canonical records.

pub mod adapter;
pub mod normalize;

pub use normalize::{extract_message, parse_msg};
