//! # Runtime Configuration
//!
//! Layered: defaults, then `DBX_*` environment variables, then CLI flags.

use std::time::Duration;

use clap::Parser;
use dbx_chain_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable present but unparsable.
    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
    /// Setting out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Directory block explorer: walk a ledger's directory block chain and keep it indexed.
#[derive(Parser, Debug, Default)]
#[command(name = "dbx-runtime")]
#[command(about = "Synchronizes directory blocks from a ledger node into memory")]
pub struct Cli {
    /// Ledger node base URL
    #[arg(short, long)]
    pub source_url: Option<String>,

    /// Seconds between sync walks
    #[arg(short = 'i', long)]
    pub sync_interval_secs: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Run one walk and exit
    #[arg(long)]
    pub once: bool,

    /// Log filter (e.g. "debug", "dbx_chain_sync=debug")
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Stop each walk after this many new directory blocks
    #[arg(long)]
    pub max_walk_depth: Option<u64>,

    /// Record undecodable value-transfer blocks as empty instead of failing
    #[arg(long)]
    pub tolerate_value_transfer_decode_failure: bool,

    /// Do not dump committed blocks as JSON at debug level
    #[arg(long)]
    pub no_block_dump: bool,
}

/// Runtime configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Ledger node base URL.
    pub source_url: String,
    /// Seconds between sync walks.
    pub sync_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Exit after the first walk.
    pub run_once: bool,
    /// Log filter; `RUST_LOG` or `info` when unset.
    pub log_level: Option<String>,
    /// Sync library settings.
    pub sync: SyncConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            source_url: "http://localhost:8088".to_string(),
            sync_interval_secs: 10,
            request_timeout_secs: 30,
            run_once: false,
            log_level: None,
            sync: SyncConfig::default(),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { key, value }),
    }
}

impl RuntimeConfig {
    /// Defaults, then the process environment, then `cli`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Override from `DBX_*` variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DBX_SOURCE_URL") {
            self.source_url = v;
        }
        if let Some(v) = lookup("DBX_SYNC_INTERVAL_SECS") {
            self.sync_interval_secs = parse("DBX_SYNC_INTERVAL_SECS", v)?;
        }
        if let Some(v) = lookup("DBX_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse("DBX_REQUEST_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("DBX_RUN_ONCE") {
            self.run_once = parse_bool("DBX_RUN_ONCE", v)?;
        }
        if let Some(v) = lookup("DBX_LOG_LEVEL") {
            self.log_level = Some(v);
        }
        if let Some(v) = lookup("DBX_MAX_WALK_DEPTH") {
            self.sync.max_walk_depth = Some(parse("DBX_MAX_WALK_DEPTH", v)?);
        }
        if let Some(v) = lookup("DBX_TOLERATE_VALUE_TRANSFER_DECODE_FAILURE") {
            self.sync.tolerate_value_transfer_decode_failure =
                parse_bool("DBX_TOLERATE_VALUE_TRANSFER_DECODE_FAILURE", v)?;
        }
        if let Some(v) = lookup("DBX_LOG_COMMITTED_BLOCKS") {
            self.sync.log_committed_blocks = parse_bool("DBX_LOG_COMMITTED_BLOCKS", v)?;
        }
        Ok(())
    }

    /// Override from command-line flags. Flags only ever switch features on.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.source_url {
            self.source_url = url.clone();
        }
        if let Some(secs) = cli.sync_interval_secs {
            self.sync_interval_secs = secs;
        }
        if let Some(secs) = cli.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if cli.once {
            self.run_once = true;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(depth) = cli.max_walk_depth {
            self.sync.max_walk_depth = Some(depth);
        }
        if cli.tolerate_value_transfer_decode_failure {
            self.sync.tolerate_value_transfer_decode_failure = true;
        }
        if cli.no_block_dump {
            self.sync.log_committed_blocks = false;
        }
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.source_url.starts_with("http://") || self.source_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "source_url must be an http(s) URL, got {:?}",
                self.source_url
            )));
        }
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid("sync_interval_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Interval between walks.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
