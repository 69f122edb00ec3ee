//! # Algorithms Module
//!
//! Binary decoders for the four sub-block kinds and the routing between them.

pub mod admin;
pub mod credit;
pub mod generic_entry;
pub mod reader;
pub mod routing;
pub mod value_transfer;

pub use admin::decode_admin_block;
pub use credit::decode_credit_block;
pub use generic_entry::decode_entry_block;
pub use reader::{write_varint, ByteReader, MAX_VARINT_LEN};
pub use routing::{classify, decode_block};
pub use value_transfer::{decode_transactions, decode_value_transfer_block, Transaction, TransferIo};
