//! Transaction model and wire codec
//!
//! The canonical in-memory transaction, its nine-kind type enum, the
//! type-specific asset payloads, and the serializer/deserializer pair
//! that all network peers must agree on byte for byte.

pub mod crypto;
pub mod deserializer;
pub mod serializer;

use serde::{Deserialize, Serialize};

use crate::core::Amount;
use crate::error::ChainError;

/// The nine transaction kinds, with their wire discriminants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TransactionType {
    Transfer = 0,
    SecondSignature = 1,
    DelegateRegistration = 2,
    Vote = 3,
    MultiSignature = 4,
    Ipfs = 5,
    TimelockTransfer = 6,
    MultiPayment = 7,
    DelegateResignation = 8,
}

impl TransactionType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Only transfers may carry a vendor field memo
    pub fn allows_vendor_field(self) -> bool {
        matches!(
            self,
            TransactionType::Transfer | TransactionType::TimelockTransfer
        )
    }
}

impl From<TransactionType> for u8 {
    fn from(value: TransactionType) -> u8 {
        value.as_u8()
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = ChainError;

    fn try_from(value: u8) -> Result<TransactionType, ChainError> {
        match value {
            0 => Ok(TransactionType::Transfer),
            1 => Ok(TransactionType::SecondSignature),
            2 => Ok(TransactionType::DelegateRegistration),
            3 => Ok(TransactionType::Vote),
            4 => Ok(TransactionType::MultiSignature),
            5 => Ok(TransactionType::Ipfs),
            6 => Ok(TransactionType::TimelockTransfer),
            7 => Ok(TransactionType::MultiPayment),
            8 => Ok(TransactionType::DelegateResignation),
            unknown => Err(ChainError::UnknownTransactionType(unknown)),
        }
    }
}

/// Multisignature registration payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisignatureAsset {
    pub min: u8,
    /// Public keys, each carrying its historical `+` sign prefix
    pub keysgroup: Vec<String>,
    pub lifetime: u8,
}

/// One entry of a multi-payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Amount,
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
}

/// Type-specific transaction payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Asset {
    #[default]
    None,
    /// Second-signature registration: the new signing public key (hex)
    SecondSignature {
        public_key: String,
    },
    Delegate {
        username: String,
    },
    /// Vote strings: `+`/`-` sign followed by the delegate's public key
    Votes(Vec<String>),
    Multisignature(MultisignatureAsset),
    /// IPFS dag, hex encoded
    Ipfs {
        dag: String,
    },
    Payments(Vec<Payment>),
}

/// The canonical in-memory transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    /// 0 means legacy/omitted and is treated as 1 everywhere
    pub version: u8,
    /// Address version byte; 0 means "use the active network's"
    pub network: u8,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Seconds since the network epoch
    pub timestamp: u32,
    /// 33-byte compressed public key, hex
    pub sender_public_key: String,
    pub fee: Amount,
    pub amount: Amount,
    pub expiration: u32,
    pub timelock: u64,
    pub timelock_type: u8,
    pub recipient_id: Option<String>,
    pub vendor_field: Option<String>,
    pub vendor_field_hex: Option<String>,
    pub asset: Asset,
    /// Derived from the signature-exclusive serialization, never input
    pub id: Option<String>,
    pub signature: Option<String>,
    pub second_signature: Option<String>,
    pub sign_signature: Option<String>,
    pub signatures: Option<Vec<String>>,
    pub block_id: Option<String>,
    pub sequence: u32,
}

impl Default for TransactionData {
    fn default() -> Self {
        TransactionData {
            version: 1,
            network: 0,
            transaction_type: TransactionType::Transfer,
            timestamp: 0,
            sender_public_key: String::new(),
            fee: Amount::ZERO,
            amount: Amount::ZERO,
            expiration: 0,
            timelock: 0,
            timelock_type: 0,
            recipient_id: None,
            vendor_field: None,
            vendor_field_hex: None,
            asset: Asset::None,
            id: None,
            signature: None,
            second_signature: None,
            sign_signature: None,
            signatures: None,
            block_id: None,
            sequence: 0,
        }
    }
}

impl TransactionData {
    /// The second signature, under either of its two historical names
    pub fn second_signature_field(&self) -> Option<&str> {
        self.sign_signature
            .as_deref()
            .or(self.second_signature.as_deref())
    }

    /// Effective version: 0 (omitted) is treated as 1
    pub fn effective_version(&self) -> u8 {
        if self.version == 0 {
            1
        } else {
            self.version
        }
    }
}

pub use crypto::{
    get_hash, get_id, second_sign, sign, to_signing_bytes, verify, verify_second_signature,
};
pub use deserializer::deserialize;
pub use serializer::serialize;
