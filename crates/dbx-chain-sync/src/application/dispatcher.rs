//! # Decode Dispatcher
//!
//! Routes a fetched sub-block to its decoder and files the result in the
//! block index under the sub-block's own identifier.

use std::sync::Arc;

use tracing::{debug, warn};

use super::index::BlockIndex;
use crate::algorithms::decode_block;
use crate::config::SyncConfig;
use crate::domain::{BlockKind, DecodeError, SubBlockRef, UnifiedBlockRecord};

/// Decodes sub-blocks and records them in the index.
pub struct DecodeDispatcher {
    index: Arc<BlockIndex>,
    tolerate_value_transfer_decode_failure: bool,
}

impl DecodeDispatcher {
    /// Create a dispatcher writing into `index`.
    pub fn new(index: Arc<BlockIndex>, config: &SyncConfig) -> Self {
        Self {
            index,
            tolerate_value_transfer_decode_failure: config.tolerate_value_transfer_decode_failure,
        }
    }

    /// Decode `raw` as the sub-block `sub_block` refers to.
    ///
    /// The record is inserted into the index only on success.
    pub fn dispatch(
        &self,
        sub_block: &SubBlockRef,
        raw: &[u8],
        block_time: &str,
    ) -> Result<UnifiedBlockRecord, DecodeError> {
        let record = match decode_block(sub_block.chain_id, sub_block.identifier, raw, block_time) {
            Ok(record) => record,
            Err(e) if e.kind == BlockKind::ValueTransfer && self.tolerate_value_transfer_decode_failure => {
                warn!(
                    "[dbx] Recording value-transfer block {} as empty: {}",
                    sub_block.identifier, e
                );
                UnifiedBlockRecord::empty(
                    BlockKind::ValueTransfer,
                    sub_block.chain_id,
                    sub_block.identifier,
                )
            }
            Err(e) => return Err(e),
        };

        debug!(
            "[dbx] Decoded {} block {} ({} entries)",
            record.kind,
            record.identifier,
            record.entry_count()
        );
        self.index.insert_block(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CREDIT_CHAIN_ID, VALUE_TRANSFER_CHAIN_ID};
    use crate::test_utils::{encode_credit_block, CreditEntry};
    use shared_types::Hash;

    fn dispatcher(tolerate: bool) -> (Arc<BlockIndex>, DecodeDispatcher) {
        let index = Arc::new(BlockIndex::new());
        let config = SyncConfig {
            tolerate_value_transfer_decode_failure: tolerate,
            ..SyncConfig::for_testing()
        };
        let dispatcher = DecodeDispatcher::new(index.clone(), &config);
        (index, dispatcher)
    }

    #[test]
    fn test_dispatch_inserts_under_own_identifier() {
        let (index, dispatcher) = dispatcher(false);
        let sub_block = SubBlockRef::new(CREDIT_CHAIN_ID, Hash::with_last_byte(0x21));
        let raw = encode_credit_block(Hash::ZERO, &[CreditEntry::minute(1)]);

        let record = dispatcher.dispatch(&sub_block, &raw, "t").unwrap();
        assert_eq!(record.kind, BlockKind::Credit);
        assert_eq!(index.block(&Hash::with_last_byte(0x21)).unwrap(), record);
        assert!(index.block(&CREDIT_CHAIN_ID).is_err());
    }

    #[test]
    fn test_failed_decode_is_not_indexed() {
        let (index, dispatcher) = dispatcher(false);
        let sub_block = SubBlockRef::new(CREDIT_CHAIN_ID, Hash::with_last_byte(0x21));

        let err = dispatcher.dispatch(&sub_block, &[1, 2, 3], "t").unwrap_err();
        assert_eq!(err.kind, BlockKind::Credit);
        assert_eq!(index.block_count(), 0);
    }

    #[test]
    fn test_value_transfer_failure_propagates_by_default() {
        let (_, dispatcher) = dispatcher(false);
        let sub_block = SubBlockRef::new(VALUE_TRANSFER_CHAIN_ID, Hash::with_last_byte(0x31));
        let err = dispatcher.dispatch(&sub_block, &[0xff], "t").unwrap_err();
        assert_eq!(err.kind, BlockKind::ValueTransfer);
    }

    #[test]
    fn test_value_transfer_failure_tolerated_when_enabled() {
        let (index, dispatcher) = dispatcher(true);
        let sub_block = SubBlockRef::new(VALUE_TRANSFER_CHAIN_ID, Hash::with_last_byte(0x31));

        let record = dispatcher.dispatch(&sub_block, &[0xff], "t").unwrap();
        assert!(record.entries.is_empty());
        assert_eq!(record.kind, BlockKind::ValueTransfer);
        assert!(index.block(&Hash::with_last_byte(0x31)).is_ok());
    }

    #[test]
    fn test_tolerance_does_not_cover_other_kinds() {
        let (_, dispatcher) = dispatcher(true);
        let sub_block = SubBlockRef::new(CREDIT_CHAIN_ID, Hash::with_last_byte(0x21));
        assert!(dispatcher.dispatch(&sub_block, &[0xff], "t").is_err());
    }
}
