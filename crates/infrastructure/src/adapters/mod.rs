//! Infrastructure adapters

mod reqwest_transport;
mod session_observer;

pub use reqwest_transport::ReqwestTransport;
pub use session_observer::{CallbackSessionObserver, LoggingSessionObserver};
