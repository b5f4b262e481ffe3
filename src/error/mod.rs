//! Error handling for the ledger core
//!
//! This module provides the error types for codec, cryptographic and
//! builder operations. Validation failures in the handler state machine
//! are deliberately NOT errors: they are reported as message strings so
//! callers see a recoverable "reject this transaction" outcome.

use std::fmt;

/// Result type alias for ledger core operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Error types for codec, crypto and builder operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A read ran past the end of the wire buffer
    TruncatedBuffer { needed: usize, remaining: usize },
    /// A value does not fit the fixed-width field it is written into
    FieldOverflow(String),
    /// Transaction type discriminant outside the nine known kinds
    UnknownTransactionType(u8),
    /// Transaction version this core does not sign or verify
    UnsupportedVersion(u8),
    /// Malformed hex, base58 or structural payload data
    Serialization(String),
    /// Cryptographic operation errors (key parsing, signing)
    Crypto(String),
    /// Invalid address format
    InvalidAddress(String),
    /// WIF version byte does not match the active network
    InvalidNetworkVersion { expected: u8, actual: u8 },
    /// Builder finished without a sender public key or signature
    MissingTransactionSignature,
    /// Multi-payment builder exceeded the hard payment cap
    MaximumPaymentCountExceeded { limit: usize },
    /// Transaction data rejected by structural validation
    InvalidTransactionData(String),
    /// Block-level structural errors
    InvalidBlock(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::TruncatedBuffer { needed, remaining } => {
                write!(
                    f,
                    "Truncated buffer: needed {needed} bytes, {remaining} remaining"
                )
            }
            ChainError::FieldOverflow(msg) => write!(f, "Field overflow: {msg}"),
            ChainError::UnknownTransactionType(t) => {
                write!(f, "Unknown transaction type: {t}")
            }
            ChainError::UnsupportedVersion(v) => {
                write!(f, "Unsupported transaction version: {v}")
            }
            ChainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            ChainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            ChainError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            ChainError::InvalidNetworkVersion { expected, actual } => {
                write!(
                    f,
                    "Invalid network version: expected {expected}, got {actual}"
                )
            }
            ChainError::MissingTransactionSignature => {
                write!(f, "Transaction is missing a sender public key or signature")
            }
            ChainError::MaximumPaymentCountExceeded { limit } => {
                write!(f, "Maximum payment count of {limit} exceeded")
            }
            ChainError::InvalidTransactionData(msg) => {
                write!(f, "Invalid transaction data: {msg}")
            }
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<hex::FromHexError> for ChainError {
    fn from(err: hex::FromHexError) -> Self {
        ChainError::Serialization(format!("Invalid hex encoding: {err}"))
    }
}

impl From<bs58::decode::Error> for ChainError {
    fn from(err: bs58::decode::Error) -> Self {
        ChainError::InvalidAddress(format!("Invalid base58 encoding: {err}"))
    }
}
