//! Adapters implementing the sync library's outbound ports.

pub mod http_source;

pub use http_source::{HttpLedgerSource, HttpSourceError};
