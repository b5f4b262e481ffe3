//! Transaction signing, verification and id derivation
//!
//! Ids and signatures are computed over a dedicated signing payload that
//! predates the wire format and must be reproduced bit for bit: the
//! recipient slot is a fixed 21 bytes (zero-filled for second-signature
//! and multisignature registrations), the vendor field a fixed 64, and
//! type-specific assets are appended in their historical text encodings.

use crate::config::NetworkConfig;
use crate::core::transaction::serializer::{decode_public_key, decode_recipient};
use crate::core::transaction::{Asset, TransactionData, TransactionType};
use crate::error::{ChainError, Result};
use crate::utils::{sha256_digest, sign_hash, verify_hash, ByteWriter, Keys};

const VENDOR_FIELD_SLOT: usize = 64;
const RECIPIENT_SLOT: usize = 21;

/// The signing payload for a transaction
///
/// `skip_signature` / `skip_second_signature` control which already
/// present signatures are appended: signing and id derivation skip
/// both, second-signing skips only the second.
pub fn to_signing_bytes(
    transaction: &TransactionData,
    skip_signature: bool,
    skip_second_signature: bool,
    config: &NetworkConfig,
) -> Result<Vec<u8>> {
    let version = transaction.effective_version();
    if version > 1 {
        return Err(ChainError::UnsupportedVersion(version));
    }

    let mut writer = ByteWriter::with_capacity(256);

    writer.write_u8(transaction.transaction_type.as_u8());
    writer.write_u32(transaction.timestamp);
    writer.write_bytes(&decode_public_key(&transaction.sender_public_key)?);

    write_recipient_slot(&mut writer, transaction, config)?;
    write_vendor_field_slot(&mut writer, transaction)?;

    writer.write_u64(transaction.amount.to_u64()?);
    writer.write_u64(transaction.fee.to_u64()?);

    write_asset(&mut writer, transaction)?;

    if !skip_signature {
        if let Some(signature) = &transaction.signature {
            writer.write_bytes(&hex::decode(signature)?);
        }
    }
    if !skip_second_signature {
        if let Some(sign_signature) = &transaction.sign_signature {
            writer.write_bytes(&hex::decode(sign_signature)?);
        }
    }

    Ok(writer.into_bytes())
}

/// Registration types historically signed over a zeroed recipient slot.
/// The exceptions table pins the few transactions that slipped through
/// before that was enforced and must keep their recipient bytes.
fn write_recipient_slot(
    writer: &mut ByteWriter,
    transaction: &TransactionData,
    config: &NetworkConfig,
) -> Result<()> {
    let zero_filled_type = matches!(
        transaction.transaction_type,
        TransactionType::SecondSignature | TransactionType::MultiSignature
    );
    let pinned = transaction
        .id
        .as_deref()
        .is_some_and(|id| config.exceptions.is_broken_transaction_id(id));

    match &transaction.recipient_id {
        Some(recipient_id) if !zero_filled_type || pinned => {
            writer.write_bytes(&decode_recipient(Some(recipient_id))?);
        }
        _ => writer.write_bytes(&[0u8; RECIPIENT_SLOT]),
    }
    Ok(())
}

fn write_vendor_field_slot(writer: &mut ByteWriter, transaction: &TransactionData) -> Result<()> {
    let content = if let Some(vendor_field_hex) = &transaction.vendor_field_hex {
        hex::decode(vendor_field_hex)?
    } else if let Some(vendor_field) = &transaction.vendor_field {
        vendor_field.as_bytes().to_vec()
    } else {
        Vec::new()
    };

    if content.len() > VENDOR_FIELD_SLOT {
        return Err(ChainError::FieldOverflow(format!(
            "Vendor field of {} bytes exceeds the {VENDOR_FIELD_SLOT}-byte signing slot",
            content.len()
        )));
    }

    writer.write_bytes(&content);
    writer.write_bytes(&vec![0u8; VENDOR_FIELD_SLOT - content.len()]);
    Ok(())
}

/// Asset encodings in the signing payload are textual where the wire
/// format is binary; both must be kept as-is.
fn write_asset(writer: &mut ByteWriter, transaction: &TransactionData) -> Result<()> {
    match (&transaction.transaction_type, &transaction.asset) {
        (TransactionType::SecondSignature, Asset::SecondSignature { public_key }) => {
            writer.write_bytes(&decode_public_key(public_key)?);
        }
        (TransactionType::DelegateRegistration, Asset::Delegate { username }) => {
            writer.write_bytes(username.as_bytes());
        }
        (TransactionType::Vote, Asset::Votes(votes)) => {
            writer.write_bytes(votes.join("").as_bytes());
        }
        (TransactionType::MultiSignature, Asset::Multisignature(multisignature)) => {
            writer.write_u8(multisignature.min);
            writer.write_u8(multisignature.lifetime);
            // signed keysgroup entries keep their + prefixes here
            writer.write_bytes(multisignature.keysgroup.join("").as_bytes());
        }
        _ => {}
    }
    Ok(())
}

/// SHA-256 over the signing payload
pub fn get_hash(
    transaction: &TransactionData,
    skip_signature: bool,
    skip_second_signature: bool,
    config: &NetworkConfig,
) -> Result<Vec<u8>> {
    Ok(sha256_digest(&to_signing_bytes(
        transaction,
        skip_signature,
        skip_second_signature,
        config,
    )?))
}

/// The transaction id: the hex hash over the signature-excluded
/// payload, substituted through the historical fix table
pub fn get_id(transaction: &TransactionData, config: &NetworkConfig) -> Result<String> {
    let id = hex::encode(get_hash(transaction, true, true, config)?);
    Ok(config.exceptions.fix_transaction_id(id))
}

/// Sign with the sender key, storing the signature if the slot is empty
pub fn sign(
    transaction: &mut TransactionData,
    keys: &Keys,
    config: &NetworkConfig,
) -> Result<String> {
    let hash = get_hash(transaction, true, true, config)?;
    let signature = hex::encode(sign_hash(&hash, keys)?);
    if transaction.signature.is_none() {
        transaction.signature = Some(signature.clone());
    }
    Ok(signature)
}

/// Second-sign over the payload that already carries the first signature
pub fn second_sign(
    transaction: &mut TransactionData,
    keys: &Keys,
    config: &NetworkConfig,
) -> Result<String> {
    let hash = get_hash(transaction, false, true, config)?;
    let signature = hex::encode(sign_hash(&hash, keys)?);
    if transaction.second_signature.is_none() {
        transaction.second_signature = Some(signature.clone());
    }
    Ok(signature)
}

/// Verify the first signature against the sender's public key
///
/// Structurally unverifiable transactions are false, never errors.
pub fn verify(transaction: &TransactionData, config: &NetworkConfig) -> bool {
    if transaction.effective_version() > 1 {
        return false;
    }
    let Some(signature) = &transaction.signature else {
        return false;
    };
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    let Ok(public_key) = hex::decode(&transaction.sender_public_key) else {
        return false;
    };
    let Ok(hash) = get_hash(transaction, true, true, config) else {
        return false;
    };
    verify_hash(&hash, &signature, &public_key)
}

/// Verify the second signature against the given registered public key
pub fn verify_second_signature(
    transaction: &TransactionData,
    public_key: &str,
    config: &NetworkConfig,
) -> bool {
    let Some(signature) = transaction.second_signature_field() else {
        return false;
    };
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    let Ok(public_key) = hex::decode(public_key) else {
        return false;
    };
    let Ok(hash) = get_hash(transaction, false, true, config) else {
        return false;
    };
    verify_hash(&hash, &signature, &public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Amount;

    fn transfer(keys: &Keys) -> TransactionData {
        TransactionData {
            transaction_type: TransactionType::Transfer,
            timestamp: 141_738,
            sender_public_key: keys.public_key.clone(),
            fee: Amount::new(10_000_000),
            amount: Amount::new(200_000_000),
            recipient_id: Some("AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("this is a top secret passphrase").unwrap();
        let mut tx = transfer(&keys);

        assert!(!verify(&tx, &config));
        sign(&mut tx, &keys, &config).unwrap();
        assert!(verify(&tx, &config));
    }

    #[test]
    fn test_tampering_breaks_verification() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("secret").unwrap();
        let mut tx = transfer(&keys);
        sign(&mut tx, &keys, &config).unwrap();

        tx.amount = Amount::new(999);
        assert!(!verify(&tx, &config));
    }

    #[test]
    fn test_second_signature_round_trip() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("first").unwrap();
        let second_keys = Keys::from_passphrase("second").unwrap();
        let mut tx = transfer(&keys);

        sign(&mut tx, &keys, &config).unwrap();
        second_sign(&mut tx, &second_keys, &config).unwrap();

        assert!(verify(&tx, &config));
        assert!(verify_second_signature(&tx, &second_keys.public_key, &config));
        assert!(!verify_second_signature(&tx, &keys.public_key, &config));
    }

    #[test]
    fn test_id_excludes_signatures_and_is_deterministic() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("secret").unwrap();
        let mut tx = transfer(&keys);
        sign(&mut tx, &keys, &config).unwrap();
        let signed_id = get_id(&tx, &config).unwrap();

        let mut unsigned = tx.clone();
        unsigned.signature = None;
        let unsigned_id = get_id(&unsigned, &config).unwrap();

        // ids cover the payload only, so they are stable across signing
        assert_eq!(signed_id, unsigned_id);
        assert_eq!(signed_id.len(), 64);
        assert_eq!(get_id(&tx, &config).unwrap(), signed_id);
    }

    #[test]
    fn test_registration_types_zero_their_recipient() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("secret").unwrap();

        let mut with_recipient = transfer(&keys);
        with_recipient.transaction_type = TransactionType::SecondSignature;
        with_recipient.asset = Asset::SecondSignature {
            public_key: keys.public_key.clone(),
        };

        let mut without_recipient = with_recipient.clone();
        without_recipient.recipient_id = None;

        let a = to_signing_bytes(&with_recipient, true, true, &config).unwrap();
        let b = to_signing_bytes(&without_recipient, true, true, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsupported_version_refused() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("secret").unwrap();
        let mut tx = transfer(&keys);
        tx.version = 2;

        assert!(matches!(
            to_signing_bytes(&tx, true, true, &config),
            Err(ChainError::UnsupportedVersion(2))
        ));
        assert!(!verify(&tx, &config));
    }
}
