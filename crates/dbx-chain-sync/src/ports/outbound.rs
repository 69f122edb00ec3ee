//! # Outbound Ports
//!
//! The remote ledger the explorer reads from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::Hash;

use crate::domain::{DirectoryBlockHeader, ExplorerError, GENESIS_SENTINEL};

/// Ledger data source - outbound port.
///
/// Every failure, including malformed responses, is
/// [`ExplorerError::Source`].
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Identifier of the current head directory block.
    async fn get_head(&self) -> Result<Hash, ExplorerError>;

    /// Header and sub-block references of one directory block.
    async fn get_directory_block(
        &self,
        identifier: &Hash,
    ) -> Result<DirectoryBlockHeader, ExplorerError>;

    /// Raw bytes of a sub-block.
    async fn get_raw(&self, identifier: &Hash) -> Result<Vec<u8>, ExplorerError>;

    /// Source identifier (for logging).
    fn source_id(&self) -> &str;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// In-memory ledger source for testing.
///
/// Counts fetches per identifier so tests can assert what a walk re-fetched.
pub struct MockLedgerSource {
    id: String,
    head: RwLock<Hash>,
    headers: RwLock<HashMap<Hash, DirectoryBlockHeader>>,
    raw: RwLock<HashMap<Hash, Vec<u8>>>,
    header_fetches: Mutex<HashMap<Hash, usize>>,
    raw_fetches: Mutex<HashMap<Hash, usize>>,
    should_fail: AtomicBool,
}

impl Default for MockLedgerSource {
    fn default() -> Self {
        Self {
            id: "mock-ledger-1".to_string(),
            head: RwLock::new(GENESIS_SENTINEL),
            headers: RwLock::new(HashMap::new()),
            raw: RwLock::new(HashMap::new()),
            header_fetches: Mutex::new(HashMap::new()),
            raw_fetches: Mutex::new(HashMap::new()),
            should_fail: AtomicBool::new(false),
        }
    }
}

impl MockLedgerSource {
    /// Empty source whose head is the genesis sentinel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the head.
    pub fn set_head(&self, head: Hash) {
        *self.head.write() = head;
    }

    /// Serve `header` for `identifier`.
    pub fn insert_directory_block(&self, identifier: Hash, header: DirectoryBlockHeader) {
        self.headers.write().insert(identifier, header);
    }

    /// Serve `raw` for sub-block `identifier`, replacing any previous bytes.
    pub fn insert_raw(&self, identifier: Hash, raw: Vec<u8>) {
        self.raw.write().insert(identifier, raw);
    }

    /// Make every call fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Times `get_directory_block` was called for `identifier`.
    pub fn header_fetch_count(&self, identifier: &Hash) -> usize {
        self.header_fetches.lock().get(identifier).copied().unwrap_or(0)
    }

    /// Times `get_raw` was called for `identifier`.
    pub fn raw_fetch_count(&self, identifier: &Hash) -> usize {
        self.raw_fetches.lock().get(identifier).copied().unwrap_or(0)
    }

    /// Total `get_directory_block` calls.
    pub fn total_header_fetches(&self) -> usize {
        self.header_fetches.lock().values().sum()
    }

    fn check_failure(&self) -> Result<(), ExplorerError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ExplorerError::Source("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerSource for MockLedgerSource {
    async fn get_head(&self) -> Result<Hash, ExplorerError> {
        self.check_failure()?;
        Ok(*self.head.read())
    }

    async fn get_directory_block(
        &self,
        identifier: &Hash,
    ) -> Result<DirectoryBlockHeader, ExplorerError> {
        *self.header_fetches.lock().entry(*identifier).or_insert(0) += 1;
        self.check_failure()?;
        self.headers
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| ExplorerError::Source(format!("unknown directory block {}", identifier)))
    }

    async fn get_raw(&self, identifier: &Hash) -> Result<Vec<u8>, ExplorerError> {
        *self.raw_fetches.lock().entry(*identifier).or_insert(0) += 1;
        self.check_failure()?;
        self.raw
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| ExplorerError::Source(format!("no raw data for {}", identifier)))
    }

    fn source_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_inserted_data() {
        let source = MockLedgerSource::new();
        let id = Hash::with_last_byte(7);
        source.set_head(id);
        source.insert_directory_block(
            id,
            DirectoryBlockHeader {
                sequence_height: 1,
                timestamp: 0,
                previous_identifier: GENESIS_SENTINEL,
                sub_block_refs: vec![],
            },
        );
        source.insert_raw(Hash::with_last_byte(8), vec![1, 2, 3]);

        assert_eq!(source.get_head().await.unwrap(), id);
        assert_eq!(source.get_directory_block(&id).await.unwrap().sequence_height, 1);
        assert_eq!(source.get_raw(&Hash::with_last_byte(8)).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(source.header_fetch_count(&id), 1);
        assert_eq!(source.raw_fetch_count(&Hash::with_last_byte(8)), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_block_is_source_error() {
        let source = MockLedgerSource::new();
        let err = source.get_raw(&Hash::with_last_byte(1)).await.unwrap_err();
        assert!(matches!(err, ExplorerError::Source(_)));
    }

    #[tokio::test]
    async fn test_mock_failure_switch() {
        let source = MockLedgerSource::new();
        source.set_should_fail(true);
        assert!(source.get_head().await.is_err());
        source.set_should_fail(false);
        assert_eq!(source.get_head().await.unwrap(), GENESIS_SENTINEL);
    }
}
