//! Transaction wire deserialization
//!
//! Inverse of the serializer, plus the v1 fixup pass: transactions at
//! version 1 predate several format corrections and have their missing
//! fields reconstructed after decoding so that downstream code sees one
//! consistent shape.

use crate::config::NetworkConfig;
use crate::core::transaction::serializer::{PUBLIC_KEY_LEN, RECIPIENT_LEN};
use crate::core::transaction::{
    crypto, Asset, MultisignatureAsset, Payment, TransactionData, TransactionType,
};
use crate::core::Amount;
use crate::error::{ChainError, Result};
use crate::utils::{address_from_public_key, base58check_encode, sha256_digest, ByteReader};

pub fn deserialize(bytes: &[u8], config: &NetworkConfig) -> Result<TransactionData> {
    let mut reader = ByteReader::new(bytes);

    let marker = reader.read_u8()?;
    if marker != 0xff {
        return Err(ChainError::Serialization(format!(
            "Expected marker byte 0xff, got 0x{marker:02x}"
        )));
    }

    let mut transaction = TransactionData {
        version: reader.read_u8()?,
        network: reader.read_u8()?,
        transaction_type: TransactionType::try_from(reader.read_u8()?)?,
        timestamp: reader.read_u32()?,
        sender_public_key: hex::encode(reader.read_bytes(PUBLIC_KEY_LEN)?),
        ..Default::default()
    };
    transaction.fee = Amount::new(reader.read_u64()?);

    let vendor_field_len = reader.read_u8()? as usize;
    if vendor_field_len > 0 {
        let vendor_bytes = reader.read_bytes(vendor_field_len)?;
        if transaction.transaction_type.allows_vendor_field() {
            transaction.vendor_field_hex = Some(hex::encode(vendor_bytes));
        }
    }

    read_payload(&mut reader, &mut transaction)?;
    read_signatures(&mut reader, &mut transaction)?;

    if transaction.effective_version() == 1 {
        apply_v1_fixups(&mut transaction, config)?;
    } else if transaction.version == 2 {
        transaction.id = Some(hex::encode(sha256_digest(bytes)));
    }

    Ok(transaction)
}

fn read_payload(reader: &mut ByteReader, transaction: &mut TransactionData) -> Result<()> {
    match transaction.transaction_type {
        TransactionType::Transfer => {
            transaction.amount = Amount::new(reader.read_u64()?);
            transaction.expiration = reader.read_u32()?;
            transaction.recipient_id = Some(read_recipient(reader)?);
        }
        TransactionType::SecondSignature => {
            transaction.asset = Asset::SecondSignature {
                public_key: hex::encode(reader.read_bytes(PUBLIC_KEY_LEN)?),
            };
        }
        TransactionType::DelegateRegistration => {
            transaction.asset = Asset::Delegate {
                username: reader.read_prefixed_string()?,
            };
        }
        TransactionType::Vote => {
            let count = reader.read_u8()? as usize;
            let mut votes = Vec::with_capacity(count);
            for _ in 0..count {
                let sign = if reader.read_u8()? == 0x01 { '+' } else { '-' };
                let key = hex::encode(reader.read_bytes(PUBLIC_KEY_LEN)?);
                votes.push(format!("{sign}{key}"));
            }
            transaction.asset = Asset::Votes(votes);
        }
        TransactionType::MultiSignature => {
            let min = reader.read_u8()?;
            let count = reader.read_u8()? as usize;
            let lifetime = reader.read_u8()?;
            let mut keysgroup = Vec::with_capacity(count);
            for _ in 0..count {
                keysgroup.push(hex::encode(reader.read_bytes(PUBLIC_KEY_LEN)?));
            }
            transaction.asset = Asset::Multisignature(MultisignatureAsset {
                min,
                keysgroup,
                lifetime,
            });
        }
        TransactionType::Ipfs => {
            let len = reader.read_u8()? as usize;
            transaction.asset = Asset::Ipfs {
                dag: hex::encode(reader.read_bytes(len)?),
            };
        }
        TransactionType::TimelockTransfer => {
            transaction.amount = Amount::new(reader.read_u64()?);
            transaction.timelock_type = reader.read_u8()?;
            transaction.timelock = reader.read_u64()?;
            transaction.recipient_id = Some(read_recipient(reader)?);
        }
        TransactionType::MultiPayment => {
            let count = reader.read_u32()? as usize;
            // the count is attacker-controlled; cap the pre-allocation by
            // what the remaining bytes could possibly hold
            let smallest_payment = 8 + RECIPIENT_LEN;
            let mut payments = Vec::with_capacity(count.min(reader.remaining() / smallest_payment));
            for _ in 0..count {
                payments.push(Payment {
                    amount: Amount::new(reader.read_u64()?),
                    recipient_id: read_recipient(reader)?,
                });
            }
            transaction.amount = payments.iter().map(|p| p.amount).sum();
            transaction.asset = Asset::Payments(payments);
        }
        TransactionType::DelegateResignation => {}
    }
    Ok(())
}

fn read_recipient(reader: &mut ByteReader) -> Result<String> {
    Ok(base58check_encode(&reader.read_bytes(RECIPIENT_LEN)?))
}

/// DER signatures are self-describing: byte 1 holds the remaining
/// length, so each entry spans `bytes[1] + 2` bytes.
fn read_signatures(reader: &mut ByteReader, transaction: &mut TransactionData) -> Result<()> {
    if !reader.is_empty() && reader.peek_u8() != Some(0xff) {
        transaction.signature = Some(read_der_signature(reader)?);
    }
    if !reader.is_empty() && reader.peek_u8() != Some(0xff) {
        transaction.second_signature = Some(read_der_signature(reader)?);
    }
    if reader.peek_u8() == Some(0xff) {
        reader.read_u8()?;
        let mut signatures = Vec::new();
        while !reader.is_empty() {
            signatures.push(read_der_signature(reader)?);
        }
        transaction.signatures = Some(signatures);
    }
    Ok(())
}

fn read_der_signature(reader: &mut ByteReader) -> Result<String> {
    let inner_len = reader.peek_at(1).ok_or(ChainError::TruncatedBuffer {
        needed: 2,
        remaining: reader.remaining(),
    })?;
    let bytes = reader.read_bytes(inner_len as usize + 2)?;
    Ok(hex::encode(bytes))
}

/// Reconstruct the fields v1 encodings leave implicit
fn apply_v1_fixups(transaction: &mut TransactionData, config: &NetworkConfig) -> Result<()> {
    if let Some(second_signature) = &transaction.second_signature {
        transaction.sign_signature = Some(second_signature.clone());
    }

    match transaction.transaction_type {
        // registration types address themselves
        TransactionType::Vote
        | TransactionType::SecondSignature
        | TransactionType::MultiSignature => {
            transaction.recipient_id = Some(address_from_public_key(
                &transaction.sender_public_key,
                config.pub_key_hash,
            )?);
        }
        _ => {}
    }

    if let Asset::Multisignature(multisignature) = &mut transaction.asset {
        for key in &mut multisignature.keysgroup {
            if !key.starts_with('+') {
                key.insert(0, '+');
            }
        }
    }

    if let Some(vendor_field_hex) = &transaction.vendor_field_hex {
        let bytes = hex::decode(vendor_field_hex)?;
        transaction.vendor_field = Some(String::from_utf8_lossy(&bytes).into_owned());
    }

    transaction.id = Some(crypto::get_id(transaction, config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{serialize, sign};
    use crate::utils::Keys;

    fn config() -> NetworkConfig {
        NetworkConfig::mainnet()
    }

    fn signed_transfer(config: &NetworkConfig) -> TransactionData {
        let keys = Keys::from_passphrase("this is a top secret passphrase").unwrap();
        let mut tx = TransactionData {
            transaction_type: TransactionType::Transfer,
            timestamp: 141_738,
            sender_public_key: keys.public_key.clone(),
            fee: Amount::new(10_000_000),
            amount: Amount::new(200_000_000),
            recipient_id: Some(
                address_from_public_key(&keys.public_key, config.pub_key_hash).unwrap(),
            ),
            vendor_field: Some("for groceries".to_string()),
            ..Default::default()
        };
        sign(&mut tx, &keys, config).unwrap();
        tx
    }

    #[test]
    fn test_transfer_round_trip() {
        let config = config();
        let tx = signed_transfer(&config);

        let bytes = serialize(&tx, &config).unwrap();
        assert_eq!(bytes[0], 0xff);

        let decoded = deserialize(&bytes, &config).unwrap();
        assert_eq!(decoded.transaction_type, TransactionType::Transfer);
        assert_eq!(decoded.amount, tx.amount);
        assert_eq!(decoded.fee, tx.fee);
        assert_eq!(decoded.recipient_id, tx.recipient_id);
        assert_eq!(decoded.vendor_field.as_deref(), Some("for groceries"));
        assert_eq!(decoded.signature, tx.signature);
        assert!(decoded.id.is_some());
    }

    #[test]
    fn test_missing_marker_rejected() {
        let config = config();
        let tx = signed_transfer(&config);
        let mut bytes = serialize(&tx, &config).unwrap();
        bytes[0] = 0x00;

        assert!(matches!(
            deserialize(&bytes, &config),
            Err(ChainError::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let config = config();
        let tx = signed_transfer(&config);
        let mut bytes = serialize(&tx, &config).unwrap();
        bytes[3] = 99;

        assert_eq!(
            deserialize(&bytes, &config),
            Err(ChainError::UnknownTransactionType(99))
        );
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let config = config();
        let tx = signed_transfer(&config);
        let bytes = serialize(&tx, &config).unwrap();

        assert!(matches!(
            deserialize(&bytes[..20], &config),
            Err(ChainError::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn test_vote_fixups_self_address_and_id() {
        let config = config();
        let keys = Keys::from_passphrase("voter").unwrap();
        let delegate = Keys::from_passphrase("delegate").unwrap();
        let mut tx = TransactionData {
            transaction_type: TransactionType::Vote,
            timestamp: 500,
            sender_public_key: keys.public_key.clone(),
            fee: Amount::new(100_000_000),
            asset: Asset::Votes(vec![format!("+{}", delegate.public_key)]),
            ..Default::default()
        };
        tx.recipient_id = Some(
            address_from_public_key(&keys.public_key, config.pub_key_hash).unwrap(),
        );
        sign(&mut tx, &keys, &config).unwrap();

        let bytes = serialize(&tx, &config).unwrap();
        let decoded = deserialize(&bytes, &config).unwrap();

        assert_eq!(decoded.recipient_id, tx.recipient_id);
        assert_eq!(
            decoded.asset,
            Asset::Votes(vec![format!("+{}", delegate.public_key)])
        );
        assert_eq!(decoded.id, Some(crypto::get_id(&tx, &config).unwrap()));
    }

    #[test]
    fn test_multisignature_keysgroup_regains_prefixes() {
        let config = config();
        let keys = Keys::from_passphrase("owner").unwrap();
        let a = Keys::from_passphrase("co-signer a").unwrap();
        let b = Keys::from_passphrase("co-signer b").unwrap();
        let mut tx = TransactionData {
            transaction_type: TransactionType::MultiSignature,
            timestamp: 900,
            sender_public_key: keys.public_key.clone(),
            fee: Amount::new(1_500_000_000),
            asset: Asset::Multisignature(MultisignatureAsset {
                min: 2,
                keysgroup: vec![
                    format!("+{}", a.public_key),
                    format!("+{}", b.public_key),
                ],
                lifetime: 24,
            }),
            ..Default::default()
        };
        sign(&mut tx, &keys, &config).unwrap();

        let bytes = serialize(&tx, &config).unwrap();
        let decoded = deserialize(&bytes, &config).unwrap();

        let Asset::Multisignature(decoded_asset) = &decoded.asset else {
            panic!("expected a multisignature asset");
        };
        assert_eq!(decoded_asset.min, 2);
        assert_eq!(decoded_asset.lifetime, 24);
        assert_eq!(
            decoded_asset.keysgroup,
            vec![format!("+{}", a.public_key), format!("+{}", b.public_key)]
        );
        // self-addressed by the fixup pass
        assert_eq!(
            decoded.recipient_id,
            Some(address_from_public_key(&keys.public_key, config.pub_key_hash).unwrap())
        );
    }

    #[test]
    fn test_multi_payment_round_trip_sums_amount() {
        let config = config();
        let keys = Keys::from_passphrase("payer").unwrap();
        let first = address_from_public_key(
            &Keys::from_passphrase("one").unwrap().public_key,
            config.pub_key_hash,
        )
        .unwrap();
        let second = address_from_public_key(
            &Keys::from_passphrase("two").unwrap().public_key,
            config.pub_key_hash,
        )
        .unwrap();

        let mut tx = TransactionData {
            transaction_type: TransactionType::MultiPayment,
            timestamp: 1000,
            sender_public_key: keys.public_key.clone(),
            asset: Asset::Payments(vec![
                Payment {
                    amount: Amount::new(100),
                    recipient_id: first.clone(),
                },
                Payment {
                    amount: Amount::new(250),
                    recipient_id: second.clone(),
                },
            ]),
            amount: Amount::new(350),
            ..Default::default()
        };
        sign(&mut tx, &keys, &config).unwrap();

        let bytes = serialize(&tx, &config).unwrap();
        let decoded = deserialize(&bytes, &config).unwrap();

        assert_eq!(decoded.amount, Amount::new(350));
        let Asset::Payments(payments) = &decoded.asset else {
            panic!("expected a payments asset");
        };
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].recipient_id, first);
        assert_eq!(payments[1].recipient_id, second);
    }

    #[test]
    fn test_huge_multi_payment_count_is_rejected_not_allocated() {
        let config = config();
        let keys = Keys::from_passphrase("payer").unwrap();
        let recipient =
            address_from_public_key(&keys.public_key, config.pub_key_hash).unwrap();
        let mut tx = TransactionData {
            transaction_type: TransactionType::MultiPayment,
            sender_public_key: keys.public_key.clone(),
            asset: Asset::Payments(vec![Payment {
                amount: Amount::new(1),
                recipient_id: recipient,
            }]),
            amount: Amount::new(1),
            ..Default::default()
        };
        sign(&mut tx, &keys, &config).unwrap();

        let mut bytes = serialize(&tx, &config).unwrap();
        // the payment count sits right after the vendor field length byte
        bytes[50..54].copy_from_slice(&u32::MAX.to_le_bytes());

        assert!(matches!(
            deserialize(&bytes, &config),
            Err(ChainError::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn test_multisignature_signature_block_round_trip() {
        let config = config();
        let tx = signed_transfer(&config);
        let mut tx = tx;
        tx.signatures = Some(vec![tx.signature.clone().unwrap()]);

        let bytes = serialize(&tx, &config).unwrap();
        let decoded = deserialize(&bytes, &config).unwrap();

        assert_eq!(decoded.signature, tx.signature);
        assert_eq!(decoded.signatures, tx.signatures);
    }
}
