//! HTTP ledger source.
//!
//! Implements `LedgerSource` against the ledger node's v1 REST API:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | head | `GET /v1/directory-block-head/` |
//! | directory block | `GET /v1/directory-block-by-keymr/{keymr}` |
//! | raw sub-block | `GET /v1/get-raw-data/{hash}` |

use std::time::Duration;

use async_trait::async_trait;
use dbx_chain_sync::{DirectoryBlockHeader, ExplorerError, LedgerSource, SubBlockRef};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::Hash;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when talking to the ledger node.
#[derive(Debug, Error)]
pub enum HttpSourceError {
    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Node not reachable.
    #[error("Connection failed: {0}")]
    Connection(String),
    /// Non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },
    /// Body not in the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<HttpSourceError> for ExplorerError {
    fn from(e: HttpSourceError) -> Self {
        ExplorerError::Source(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct HeadResponse {
    #[serde(rename = "KeyMR")]
    key_mr: Hash,
}

#[derive(Debug, Deserialize)]
struct DirectoryBlockResponse {
    #[serde(rename = "Header")]
    header: DirectoryBlockHeaderJson,
    #[serde(rename = "EntryBlockList", default)]
    entry_block_list: Vec<EntryBlockRefJson>,
}

#[derive(Debug, Deserialize)]
struct DirectoryBlockHeaderJson {
    #[serde(rename = "PrevBlockKeyMR")]
    prev_block_key_mr: Hash,
    #[serde(rename = "TimeStamp")]
    timestamp: u64,
    #[serde(rename = "SequenceNumber")]
    sequence_number: u64,
}

#[derive(Debug, Deserialize)]
struct EntryBlockRefJson {
    #[serde(rename = "ChainID")]
    chain_id: Hash,
    #[serde(rename = "KeyMR")]
    key_mr: Hash,
}

#[derive(Debug, Deserialize)]
struct RawDataResponse {
    #[serde(rename = "Data")]
    data: String,
}

impl DirectoryBlockResponse {
    fn into_header(self) -> DirectoryBlockHeader {
        DirectoryBlockHeader {
            sequence_height: self.header.sequence_number,
            timestamp: self.header.timestamp,
            previous_identifier: self.header.prev_block_key_mr,
            sub_block_refs: self
                .entry_block_list
                .into_iter()
                .map(|r| SubBlockRef::new(r.chain_id, r.key_mr))
                .collect(),
        }
    }
}

impl RawDataResponse {
    fn into_bytes(self) -> Result<Vec<u8>, HttpSourceError> {
        hex::decode(self.data.trim()).map_err(|e| HttpSourceError::Parse(format!("raw data: {}", e)))
    }
}

/// Ledger node reached over HTTP.
pub struct HttpLedgerSource {
    client: Client,
    base_url: String,
}

impl HttpLedgerSource {
    /// Create a client for the node at `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(HttpSourceError::Http)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, HttpSourceError> {
        let url = self.url(path);
        debug!("[dbx] GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                HttpSourceError::Connection(format!("Cannot connect to {}", self.base_url))
            } else {
                HttpSourceError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpSourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| HttpSourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LedgerSource for HttpLedgerSource {
    async fn get_head(&self) -> Result<Hash, ExplorerError> {
        let head: HeadResponse = self.get_json("directory-block-head/").await?;
        Ok(head.key_mr)
    }

    async fn get_directory_block(
        &self,
        identifier: &Hash,
    ) -> Result<DirectoryBlockHeader, ExplorerError> {
        let block: DirectoryBlockResponse = self
            .get_json(&format!("directory-block-by-keymr/{}", identifier))
            .await?;
        Ok(block.into_header())
    }

    async fn get_raw(&self, identifier: &Hash) -> Result<Vec<u8>, ExplorerError> {
        let raw: RawDataResponse = self
            .get_json(&format!("get-raw-data/{}", identifier))
            .await?;
        Ok(raw.into_bytes()?)
    }

    fn source_id(&self) -> &str {
        &self.base_url
    }
}
