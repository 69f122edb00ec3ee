//! # Shared Types Crate
//!
//! Identifier types shared by the sync library and the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the ledger's 32-byte hash type is defined
//!   once here and used for block, chain and entry identifiers alike.
//! - **Hex on the outside**: hashes parse from, display as and serialize to
//!   64 lowercase hex digits.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
