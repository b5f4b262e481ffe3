//! Block model, codec, id derivation and verification
//!
//! A block id is not a plain hash: the last eight bytes of the SHA-256
//! over the unsigned header are byte-reversed and rendered as a decimal
//! string. The verifier accumulates every failure into an error list
//! instead of stopping at the first, matching what peers report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::NetworkConfig;
use crate::core::transaction::{self, TransactionData};
use crate::core::Amount;
use crate::error::{ChainError, Result};
use crate::utils::{
    current_slot, sha256_digest, sign_hash, slot_number, verify_hash, ByteReader, ByteWriter, Keys,
};

/// The canonical in-memory block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    /// Derived from the signed header, never input
    pub id: Option<String>,
    pub version: u32,
    /// Seconds since the network epoch
    pub timestamp: u32,
    pub height: u64,
    /// Decimal id of the parent block; None only for genesis
    pub previous_block: Option<String>,
    /// The same parent id as its raw 8-byte hex form
    pub previous_block_hex: Option<String>,
    pub number_of_transactions: u32,
    pub total_amount: Amount,
    pub total_fee: Amount,
    pub reward: Amount,
    pub payload_length: u32,
    /// SHA-256 over the concatenated transaction id bytes, hex
    pub payload_hash: String,
    /// Forging delegate's compressed public key, hex
    pub generator_public_key: String,
    pub block_signature: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TransactionData>,
}

/// Outcome of [`verify`]: all failures, not just the first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVerification {
    pub verified: bool,
    pub errors: Vec<String>,
}

/// Serialize the block header
///
/// The signature is appended only when `include_signature` is set: the
/// delegate signs the header without it, while ids hash the header with
/// it.
pub fn serialize_header(block: &BlockData, include_signature: bool) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(192);

    writer.write_u32(block.version);
    writer.write_u32(block.timestamp);
    let height = u32::try_from(block.height).map_err(|_| {
        ChainError::FieldOverflow(format!("Height {} does not fit a u32 field", block.height))
    })?;
    writer.write_u32(height);
    writer.write_bytes(&previous_block_bytes(block)?);
    writer.write_u32(block.number_of_transactions);
    writer.write_u64(block.total_amount.to_u64()?);
    writer.write_u64(block.total_fee.to_u64()?);
    writer.write_u64(block.reward.to_u64()?);
    writer.write_u32(block.payload_length);
    writer.write_bytes(&decode_hash(&block.payload_hash)?);
    writer.write_bytes(&hex::decode(&block.generator_public_key)?);

    if include_signature {
        if let Some(signature) = &block.block_signature {
            writer.write_bytes(&hex::decode(signature)?);
        }
    }

    Ok(writer.into_bytes())
}

/// Serialize the signed header followed by a u32 length table and the
/// transaction bodies
pub fn serialize_full(block: &BlockData, config: &NetworkConfig) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(512);
    writer.write_bytes(&serialize_header(block, true)?);

    let mut slots = Vec::with_capacity(block.transactions.len());
    for _ in &block.transactions {
        slots.push(writer.reserve_u32());
    }
    for (slot, tx) in slots.into_iter().zip(&block.transactions) {
        let bytes = transaction::serialize(tx, config)?;
        writer.backpatch_u32(slot, bytes.len() as u32);
        writer.write_bytes(&bytes);
    }

    Ok(writer.into_bytes())
}

pub fn deserialize(bytes: &[u8], config: &NetworkConfig) -> Result<BlockData> {
    let mut reader = ByteReader::new(bytes);

    let mut block = BlockData {
        version: reader.read_u32()?,
        timestamp: reader.read_u32()?,
        height: reader.read_u32()? as u64,
        ..Default::default()
    };

    let previous = reader.read_bytes(8)?;
    if previous.iter().any(|b| *b != 0) {
        let mut fixed = [0u8; 8];
        fixed.copy_from_slice(&previous);
        block.previous_block = Some(u64::from_be_bytes(fixed).to_string());
        block.previous_block_hex = Some(hex::encode(&previous));
    }

    block.number_of_transactions = reader.read_u32()?;
    block.total_amount = Amount::new(reader.read_u64()?);
    block.total_fee = Amount::new(reader.read_u64()?);
    block.reward = Amount::new(reader.read_u64()?);
    block.payload_length = reader.read_u32()?;
    block.payload_hash = hex::encode(reader.read_bytes(32)?);
    block.generator_public_key = hex::encode(reader.read_bytes(33)?);

    // the header signature is DER, so its length is self-describing
    let inner_len = reader.peek_at(1).ok_or(ChainError::TruncatedBuffer {
        needed: 2,
        remaining: reader.remaining(),
    })?;
    block.block_signature = Some(hex::encode(reader.read_bytes(inner_len as usize + 2)?));

    // the declared count is attacker-controlled; cap the pre-allocation
    // by what the remaining bytes could possibly hold
    let count = block.number_of_transactions as usize;
    let mut lengths = Vec::with_capacity(count.min(reader.remaining() / 4));
    for _ in 0..count {
        lengths.push(reader.read_u32()? as usize);
    }
    for length in lengths {
        let tx_bytes = reader.read_bytes(length)?;
        block.transactions.push(transaction::deserialize(&tx_bytes, config)?);
    }

    block.id = Some(get_id(&block, config)?);
    for (sequence, tx) in block.transactions.iter_mut().enumerate() {
        tx.block_id = block.id.clone();
        tx.sequence = sequence as u32;
    }
    Ok(block)
}

/// The block id: the last 8 bytes of the unsigned-header hash,
/// byte-reversed and rendered as a decimal string, substituted through
/// the outlook and block fix tables
pub fn get_id(block: &BlockData, config: &NetworkConfig) -> Result<String> {
    let hash = sha256_digest(&serialize_header(block, false)?);
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&hash[24..32]);
    let id = u64::from_le_bytes(tail).to_string();

    if block.height == 1 {
        return Ok(id);
    }
    Ok(config.exceptions.fix_block_id(id))
}

/// Sign the header with the delegate key and derive the id
pub fn create(mut block: BlockData, keys: &Keys, config: &NetworkConfig) -> Result<BlockData> {
    block.generator_public_key = keys.public_key.clone();
    let hash = sha256_digest(&serialize_header(&block, false)?);
    block.block_signature = Some(hex::encode(sign_hash(&hash, keys)?));
    block.id = Some(get_id(&block, config)?);
    Ok(block)
}

/// Verify the header signature against the generator key
pub fn verify_signature(block: &BlockData) -> bool {
    let Some(signature) = &block.block_signature else {
        return false;
    };
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    let Ok(public_key) = hex::decode(&block.generator_public_key) else {
        return false;
    };
    let Ok(header) = serialize_header(block, false) else {
        return false;
    };
    verify_hash(&sha256_digest(&header), &signature, &public_key)
}

/// Consensus rules verified by v1 peers: only the first four types carry
/// a checkable signature scheme.
fn transaction_verified(tx: &TransactionData, config: &NetworkConfig) -> bool {
    tx.transaction_type.as_u8() <= 4 && transaction::verify(tx, config)
}

/// Structural block verification
///
/// Accumulates every failed rule; the error strings are part of the
/// peer-visible protocol and must stay stable.
pub fn verify(block: &BlockData, config: &NetworkConfig) -> BlockVerification {
    let mut errors = Vec::new();
    let milestone = config.milestone(block.height);

    if block.height != 1 && block.previous_block.is_none() {
        errors.push("Invalid previous block".to_string());
    }

    if block.reward != Amount::new(milestone.reward) {
        errors.push(format!(
            "Invalid block reward: {} expected: {}",
            block.reward, milestone.reward
        ));
    }

    if !verify_signature(block) {
        errors.push("Failed to verify block signature".to_string());
    }

    if block.version != milestone.block_version {
        errors.push("Invalid block version".to_string());
    }

    if let Ok(current) = current_slot(config.epoch, config.blocktime) {
        if slot_number(block.timestamp, config.blocktime) > current {
            errors.push("Invalid block timestamp".to_string());
        }
    }

    if block.payload_length as usize > milestone.max_payload_length {
        errors.push("Payload length is too high".to_string());
    }

    if block.height != 1 && block.transactions.len() > milestone.max_transactions {
        errors.push("Transactions length is too high".to_string());
    }

    if block
        .transactions
        .iter()
        .any(|tx| !transaction_verified(tx, config))
    {
        errors.push("One or more transactions are not verified".to_string());
    }

    if block.transactions.len() != block.number_of_transactions as usize {
        errors.push("Invalid number of transactions".to_string());
    }

    let mut seen = HashSet::new();
    let mut total_amount = Amount::ZERO;
    let mut total_fee = Amount::ZERO;
    let mut payload_size = 0usize;
    let mut payload_hasher = Sha256::new();

    for tx in &block.transactions {
        if let Some(id) = &tx.id {
            if !seen.insert(id.clone()) {
                errors.push(format!("Encountered duplicate transaction: {id}"));
            }
            if let Ok(id_bytes) = hex::decode(id) {
                payload_size += id_bytes.len();
                payload_hasher.update(&id_bytes);
            }
        }
        total_amount = [total_amount, tx.amount].into_iter().sum();
        total_fee = [total_fee, tx.fee].into_iter().sum();
    }

    if total_amount != block.total_amount {
        errors.push("Invalid total amount".to_string());
    }

    if total_fee != block.total_fee {
        errors.push("Invalid total fee".to_string());
    }

    if payload_size > milestone.max_payload {
        errors.push("Payload is too large".to_string());
    }

    if block.height != 1 && hex::encode(payload_hasher.finalize()) != block.payload_hash {
        errors.push("Invalid payload hash".to_string());
    }

    if !errors.is_empty() {
        log::debug!(
            "Block {} at height {} failed verification: {:?}",
            block.id.as_deref().unwrap_or("<no id>"),
            block.height,
            errors
        );
    }

    BlockVerification {
        verified: errors.is_empty(),
        errors,
    }
}

fn previous_block_bytes(block: &BlockData) -> Result<[u8; 8]> {
    if let Some(id) = &block.previous_block {
        let numeric: u64 = id.parse().map_err(|_| {
            ChainError::InvalidBlock(format!("Previous block id '{id}' is not numeric"))
        })?;
        return Ok(numeric.to_be_bytes());
    }
    if let Some(hex_id) = &block.previous_block_hex {
        let bytes = hex::decode(hex_id)?;
        let fixed: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            ChainError::InvalidBlock(format!("Previous block hex '{hex_id}' is not 8 bytes"))
        })?;
        return Ok(fixed);
    }
    Ok([0u8; 8])
}

fn decode_hash(payload_hash: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(payload_hash)?;
    if bytes.len() != 32 {
        return Err(ChainError::InvalidBlock(format!(
            "Payload hash must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
