//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, encoding functions,
//! the wire buffer cursor types and epoch slot arithmetic used
//! throughout the ledger core.

pub mod buffer;
pub mod crypto;
pub mod slots;

pub use buffer::{ByteReader, ByteWriter};
pub use crypto::{
    address_from_public_key, base58_decode, base58_encode, base58check_decode,
    base58check_encode, ripemd160_digest, sha256_digest, sign_hash, validate_address,
    verify_hash, Keys,
};
pub use slots::{current_slot, epoch_time, slot_number};
