//! Transaction wire serialization
//!
//! Produces the canonical byte layout every peer must agree on. The
//! leading 0xff marker byte disambiguates this layout from the
//! pre-upgrade format that started directly with the type byte.

use crate::config::NetworkConfig;
use crate::core::transaction::{Asset, TransactionData, TransactionType};
use crate::error::{ChainError, Result};
use crate::utils::{base58check_decode, ByteWriter};

/// Serialized recipient length: version byte + RIPEMD-160 hash
pub const RECIPIENT_LEN: usize = 21;

/// Compressed public key length on the wire
pub const PUBLIC_KEY_LEN: usize = 33;

pub fn serialize(transaction: &TransactionData, config: &NetworkConfig) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(512);

    writer.write_u8(0xff);
    writer.write_u8(transaction.effective_version());
    let network = if transaction.network == 0 {
        config.pub_key_hash
    } else {
        transaction.network
    };
    writer.write_u8(network);
    writer.write_u8(transaction.transaction_type.as_u8());
    writer.write_u32(transaction.timestamp);
    writer.write_bytes(&decode_public_key(&transaction.sender_public_key)?);
    writer.write_u64(transaction.fee.to_u64()?);

    write_vendor_field(&mut writer, transaction)?;
    write_payload(&mut writer, transaction)?;
    write_signatures(&mut writer, transaction)?;

    Ok(writer.into_bytes())
}

fn write_vendor_field(writer: &mut ByteWriter, transaction: &TransactionData) -> Result<()> {
    if transaction.transaction_type.allows_vendor_field() {
        if let Some(vendor_field) = &transaction.vendor_field {
            let bytes = vendor_field.as_bytes();
            if bytes.len() > u8::MAX as usize {
                return Err(ChainError::FieldOverflow(format!(
                    "Vendor field of {} bytes does not fit a 1-byte length prefix",
                    bytes.len()
                )));
            }
            writer.write_u8(bytes.len() as u8);
            writer.write_bytes(bytes);
            return Ok(());
        }
        if let Some(vendor_field_hex) = &transaction.vendor_field_hex {
            let bytes = hex::decode(vendor_field_hex)?;
            if bytes.len() > u8::MAX as usize {
                return Err(ChainError::FieldOverflow(format!(
                    "Vendor field of {} bytes does not fit a 1-byte length prefix",
                    bytes.len()
                )));
            }
            writer.write_u8(bytes.len() as u8);
            writer.write_bytes(&bytes);
            return Ok(());
        }
    }

    writer.write_u8(0x00);
    Ok(())
}

fn write_payload(writer: &mut ByteWriter, transaction: &TransactionData) -> Result<()> {
    match transaction.transaction_type {
        TransactionType::Transfer => {
            writer.write_u64(transaction.amount.to_u64()?);
            writer.write_u32(transaction.expiration);
            writer.write_bytes(&decode_recipient(transaction.recipient_id.as_deref())?);
        }
        TransactionType::SecondSignature => {
            let Asset::SecondSignature { public_key } = &transaction.asset else {
                return Err(missing_asset("second signature"));
            };
            writer.write_bytes(&decode_public_key(public_key)?);
        }
        TransactionType::DelegateRegistration => {
            let Asset::Delegate { username } = &transaction.asset else {
                return Err(missing_asset("delegate"));
            };
            writer.write_prefixed_string(username)?;
        }
        TransactionType::Vote => {
            let Asset::Votes(votes) = &transaction.asset else {
                return Err(missing_asset("votes"));
            };
            if votes.len() > u8::MAX as usize {
                return Err(ChainError::FieldOverflow(format!(
                    "{} votes do not fit a 1-byte count",
                    votes.len()
                )));
            }
            writer.write_u8(votes.len() as u8);
            for vote in votes {
                let (sign, key) = split_signed_key(vote)?;
                writer.write_u8(if sign == '+' { 0x01 } else { 0x00 });
                writer.write_bytes(&decode_public_key(key)?);
            }
        }
        TransactionType::MultiSignature => {
            let Asset::Multisignature(multisignature) = &transaction.asset else {
                return Err(missing_asset("multisignature"));
            };
            if multisignature.keysgroup.len() > u8::MAX as usize {
                return Err(ChainError::FieldOverflow(format!(
                    "{} keysgroup entries do not fit a 1-byte count",
                    multisignature.keysgroup.len()
                )));
            }
            writer.write_u8(multisignature.min);
            writer.write_u8(multisignature.keysgroup.len() as u8);
            writer.write_u8(multisignature.lifetime);
            // v1 strips the sign prefix from each keysgroup entry
            for key in &multisignature.keysgroup {
                let stripped = key
                    .strip_prefix('+')
                    .or_else(|| key.strip_prefix('-'))
                    .unwrap_or(key);
                writer.write_bytes(&decode_public_key(stripped)?);
            }
        }
        TransactionType::Ipfs => {
            let Asset::Ipfs { dag } = &transaction.asset else {
                return Err(missing_asset("ipfs"));
            };
            let bytes = hex::decode(dag)?;
            if bytes.len() > u8::MAX as usize {
                return Err(ChainError::FieldOverflow(format!(
                    "Dag of {} bytes does not fit a 1-byte length prefix",
                    bytes.len()
                )));
            }
            writer.write_u8(bytes.len() as u8);
            writer.write_bytes(&bytes);
        }
        TransactionType::TimelockTransfer => {
            writer.write_u64(transaction.amount.to_u64()?);
            writer.write_u8(transaction.timelock_type);
            writer.write_u64(transaction.timelock);
            writer.write_bytes(&decode_recipient(transaction.recipient_id.as_deref())?);
        }
        TransactionType::MultiPayment => {
            let Asset::Payments(payments) = &transaction.asset else {
                return Err(missing_asset("payments"));
            };
            writer.write_u32(payments.len() as u32);
            for payment in payments {
                writer.write_u64(payment.amount.to_u64()?);
                writer.write_bytes(&decode_recipient(Some(&payment.recipient_id))?);
            }
        }
        TransactionType::DelegateResignation => {
            // empty payload
        }
    }

    Ok(())
}

fn write_signatures(writer: &mut ByteWriter, transaction: &TransactionData) -> Result<()> {
    if let Some(signature) = &transaction.signature {
        writer.write_bytes(&hex::decode(signature)?);
    }

    if let Some(second_signature) = &transaction.second_signature {
        writer.write_bytes(&hex::decode(second_signature)?);
    } else if let Some(sign_signature) = &transaction.sign_signature {
        writer.write_bytes(&hex::decode(sign_signature)?);
    }

    if let Some(signatures) = &transaction.signatures {
        if !signatures.is_empty() {
            // separator signalling the start of the multisignature block
            writer.write_u8(0xff);
            for signature in signatures {
                writer.write_bytes(&hex::decode(signature)?);
            }
        }
    }

    Ok(())
}

/// Decode a hex public key, enforcing the 33-byte compressed length
pub fn decode_public_key(public_key: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(public_key)?;
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(ChainError::Serialization(format!(
            "Public key must be {PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decode a base58check address into its 21 raw bytes
pub fn decode_recipient(recipient_id: Option<&str>) -> Result<Vec<u8>> {
    let recipient_id = recipient_id.ok_or_else(|| {
        ChainError::Serialization("Transaction requires a recipient".to_string())
    })?;
    let bytes = base58check_decode(recipient_id)?;
    if bytes.len() != RECIPIENT_LEN {
        return Err(ChainError::InvalidAddress(format!(
            "Address payload must be {RECIPIENT_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Split a vote string into its sign and public key parts
pub fn split_signed_key(vote: &str) -> Result<(char, &str)> {
    let mut chars = vote.chars();
    match chars.next() {
        Some(sign @ ('+' | '-')) => Ok((sign, &vote[1..])),
        _ => Err(ChainError::Serialization(format!(
            "Vote '{vote}' must start with + or -"
        ))),
    }
}

fn missing_asset(kind: &str) -> ChainError {
    ChainError::Serialization(format!("Transaction is missing its {kind} asset"))
}
