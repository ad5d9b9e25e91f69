//! Ledger query gateway access.
//!
//! - `client`: the [`LedgerGateway`] trait used by the watcher
//! - `http`: HTTP/JSON implementation
//! - `error`: gateway error types

mod client;
mod error;
mod http;

pub use client::LedgerGateway;
pub use error::GatewayError;
pub use http::HttpGatewayClient;
