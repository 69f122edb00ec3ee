//! # Directory Block Explorer Runtime
//!
//! Wires the sync library to a ledger node over HTTP and keeps the index
//! fresh by re-walking on a fixed interval.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `DBX_*` env, CLI flags)
//! 2. Install the tracing subscriber
//! 3. Build the HTTP ledger source and the sync service
//! 4. Walk once, then every `sync_interval_secs` until Ctrl+C
//!    (or exit after the first walk with `--once`)

pub mod adapters;
pub mod config;
pub mod runner;

pub use adapters::{HttpLedgerSource, HttpSourceError};
pub use config::{Cli, ConfigError, RuntimeConfig};
pub use runner::{run, sync_once};
