//! `msgview`: read Outlook MSG messages from the terminal.
//!
//! This crate turns the loosely typed object graph produced by an external
//! MSG decoder into a strict [`EmailMessage`](model::EmailMessage) record,
//! and provides text/JSON rendering and attachment extraction on top of it.

pub mod config;
pub mod error;
pub mod export;
pub mod foreign;
pub mod model;
pub mod parser;
