//! # Application Module
//!
//! The block index, the decode dispatcher and the sync service built on them.

pub mod dispatcher;
pub mod index;
pub mod service;

pub use dispatcher::DecodeDispatcher;
pub use index::BlockIndex;
pub use service::SyncService;
