//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`]: [`MockTransport`], a scripted [`Transport`](crate::client::Transport)
//!   that records every request.
//! - [`exchange`]: [`ScriptedExchange`], an exchange definition with scripted
//!   market/currency fetches and call counters.
//! - [`fixtures`]: Canonical descriptor configs and market payloads.

pub mod exchange;
pub mod fixtures;
pub mod transport;

pub use exchange::ScriptedExchange;
pub use transport::MockTransport;
