//! Core ledger data structures
//!
//! Transactions, blocks and the satoshi amount type, together with
//! their wire codecs, signing and verification.

pub mod amount;
pub mod block;
pub mod transaction;

pub use amount::{Amount, SATOSHIS_PER_COIN};
pub use block::{BlockData, BlockVerification};
pub use transaction::{
    Asset, MultisignatureAsset, Payment, TransactionData, TransactionType,
};
