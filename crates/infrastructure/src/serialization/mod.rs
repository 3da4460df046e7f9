//! JSON encoding for files the client keeps on disk.
//!
//! Credentials and settings are written with 2-space indentation and a
//! trailing newline so they stay readable when inspected by hand.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_pretty_bytes};
