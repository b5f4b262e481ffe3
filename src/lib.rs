//! # Meridian Chain - My Ledger Core Implementation
//!
//! This is the ledger core I built in Rust: the wire codec, signing and
//! the wallet state machine for an ARK-style delegated-proof-of-stake
//! chain. When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Transaction Codec**: The 0xff-marked wire format for all nine
//!   transaction types, with the version-1 compatibility fixups
//! - **Signing & Ids**: Legacy signing payload, SHA-256 ids with the
//!   frozen exception tables, DER ECDSA over secp256k1
//! - **Handler State Machine**: canApply/apply/revert per type against
//!   mutable wallet accounts, with the exact historical error messages
//! - **Builders**: Chainable drafting for every type with fee defaults
//! - **Block Codec & Verifier**: Header/full serialization, decimal
//!   block ids, and the accumulate-all-errors verifier
//!
//! ## How I Organized My Code
//! - `core/`: transactions, blocks, amounts and their codecs
//! - `wallet/`: the mutable ledger account and multisignature checks
//! - `handlers/`: the validate/apply/revert state machine
//! - `builders/`: chainable transaction drafting
//! - `validation/`: the structural schema check run before handlers
//! - `config/`: immutable per-network parameters and exception tables
//! - `utils/`: hashing, base58check, keys, buffers, slot arithmetic
//! - `error/`: one error enum for codec/crypto/builder failures
//!
//! ## Key Design Decisions I Made
//! - No global configuration: one immutable `NetworkConfig` threaded by
//!   reference through codec, handlers, builders and verifier
//! - The type enum is closed; unknown wire discriminants fail at decode
//! - Validation failures are messages, not errors - a bad transaction
//!   is a recoverable rejection, and attacker bytes never panic
//! - Amounts are a checked 128-bit type so balances cannot go negative
//!   or overflow silently
//!
//! Remember: the byte layouts and error strings are consensus; change
//! either and peers disagree about history.

pub mod builders;
pub mod config;
pub mod core;
pub mod error;
pub mod handlers;
pub mod utils;
pub mod validation;
pub mod wallet;

// Re-export commonly used types for convenience
pub use builders::{TransactionBuilder, MAXIMUM_PAYMENT_COUNT};
pub use config::{Exceptions, FeeSchedule, Milestone, NetworkConfig};
pub use crate::core::{
    Amount, Asset, BlockData, BlockVerification, MultisignatureAsset, Payment, TransactionData,
    TransactionType, SATOSHIS_PER_COIN,
};
pub use error::{ChainError, Result};
pub use utils::{
    address_from_public_key, base58check_decode, base58check_encode, current_slot, epoch_time,
    sha256_digest, slot_number, validate_address, Keys,
};
pub use validation::{SchemaValidator, StructuralValidator};
pub use wallet::Wallet;
