//! Response types.

mod envelope;

pub use envelope::{ResponseEnvelope, StatusCode};
