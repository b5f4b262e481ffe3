//! The mutable ledger account
//!
//! Wallets are created on first reference and never deleted. All state
//! transitions go through the transaction handlers; the wallet itself
//! only knows how to credit forged blocks and check multisignature
//! thresholds.

use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::core::transaction::{crypto, MultisignatureAsset, TransactionData};
use crate::core::{Amount, BlockData};
use crate::error::Result;
use crate::utils::{address_from_public_key, verify_hash};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: String,
    pub public_key: Option<String>,
    pub second_public_key: Option<String>,
    pub balance: Amount,
    /// Public key of the currently voted delegate, if any
    pub vote: Option<String>,
    pub username: Option<String>,
    pub multisignature: Option<MultisignatureAsset>,
    /// Set whenever state changed since the last persistence sweep
    pub dirty: bool,
}

impl Wallet {
    pub fn new(address: &str) -> Wallet {
        Wallet {
            address: address.to_string(),
            ..Default::default()
        }
    }

    /// Credit the forging reward and collected fees if this wallet
    /// generated the block. Returns whether anything was applied.
    pub fn apply_block(&mut self, block: &BlockData, config: &NetworkConfig) -> Result<bool> {
        if !self.generated(block, config)? {
            return Ok(false);
        }
        let credit: Amount = [block.reward, block.total_fee].into_iter().sum();
        self.balance = [self.balance, credit].into_iter().sum();
        self.dirty = true;
        log::debug!("Credited forged block to {}: +{credit}", self.address);
        Ok(true)
    }

    /// Undo [`Wallet::apply_block`]
    pub fn revert_block(&mut self, block: &BlockData, config: &NetworkConfig) -> Result<bool> {
        if !self.generated(block, config)? {
            return Ok(false);
        }
        let debit: Amount = [block.reward, block.total_fee].into_iter().sum();
        self.balance = self.balance.saturating_sub(debit);
        self.dirty = true;
        Ok(true)
    }

    fn generated(&self, block: &BlockData, config: &NetworkConfig) -> Result<bool> {
        if let Some(public_key) = &self.public_key {
            if public_key.eq_ignore_ascii_case(&block.generator_public_key) {
                return Ok(true);
            }
        }
        let generator_address =
            address_from_public_key(&block.generator_public_key, config.pub_key_hash)?;
        Ok(generator_address == self.address)
    }

    /// N-of-M multisignature check
    ///
    /// Each keysgroup key may consume at most one of the transaction's
    /// signatures; at least `min` keys must be satisfied.
    pub fn verify_signatures(
        &self,
        transaction: &TransactionData,
        multisignature: &MultisignatureAsset,
        config: &NetworkConfig,
    ) -> bool {
        let Some(signatures) = &transaction.signatures else {
            return false;
        };
        if signatures.len() < multisignature.min as usize {
            return false;
        }
        let Ok(hash) = crypto::get_hash(transaction, true, true, config) else {
            return false;
        };

        let mut consumed = vec![false; signatures.len()];
        let mut satisfied = 0usize;
        for key in &multisignature.keysgroup {
            let key = key
                .strip_prefix('+')
                .or_else(|| key.strip_prefix('-'))
                .unwrap_or(key);
            let Ok(key_bytes) = hex::decode(key) else {
                continue;
            };
            for (i, signature) in signatures.iter().enumerate() {
                if consumed[i] {
                    continue;
                }
                let Ok(signature_bytes) = hex::decode(signature) else {
                    continue;
                };
                if verify_hash(&hash, &signature_bytes, &key_bytes) {
                    consumed[i] = true;
                    satisfied += 1;
                    break;
                }
            }
        }

        satisfied >= multisignature.min as usize
    }
}
