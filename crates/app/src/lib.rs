//! Portal - command-line host for the authenticated API client.
//!
//! Wires the file credential store and the reqwest transport into the
//! application layer and exposes the `login`, `request`, `logout` and
//! `status` commands.

pub mod cli;
pub mod commands;
mod context;
mod error;

pub use context::Portal;
pub use error::AppError;
