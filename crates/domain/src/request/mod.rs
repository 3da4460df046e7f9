//! Request types: method, headers and the outbound envelope.

mod envelope;
mod header;
mod method;

pub use envelope::{JSON_CONTENT_TYPE, RequestEnvelope};
pub use header::{AUTHORIZATION, CONTENT_TYPE, Header, Headers};
pub use method::HttpMethod;
