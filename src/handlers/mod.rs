//! Transaction handler state machine
//!
//! Every transaction type goes through the same lifecycle: a shared
//! `can_apply` rule, strengthened per type, then balance-and-state
//! mutation on the sender wallet and an amount credit on the recipient.
//! Validation failures are never errors: `can_apply` returns false and
//! pushes human-readable messages into the caller's list, so a bad
//! transaction is a recoverable rejection.
//!
//! Dispatch is an exhaustive match on the closed type enum; an unknown
//! type byte can never reach this module because decoding already
//! refuses it.

use crate::config::NetworkConfig;
use crate::core::transaction::serializer::split_signed_key;
use crate::core::transaction::{crypto, Asset, TransactionData, TransactionType};
use crate::core::Amount;
use crate::error::Result;
use crate::utils::address_from_public_key;
use crate::validation::SchemaValidator;
use crate::wallet::Wallet;

/// Can `tx` be applied to `wallet` at the given chain height?
///
/// Pushes one message per failed rule. A multisignature wallet fails
/// with no message at all; that silence is long-standing behavior other
/// components rely on.
pub fn can_apply(
    wallet: &Wallet,
    tx: &TransactionData,
    height: u64,
    errors: &mut Vec<String>,
    validator: &dyn SchemaValidator,
    config: &NetworkConfig,
) -> bool {
    // the second-signature registration guard runs before everything
    // else, including the base rule
    if tx.transaction_type == TransactionType::SecondSignature
        && wallet.second_public_key.is_some()
    {
        errors.push("Wallet already has a second signature".to_string());
        return false;
    }

    if !can_apply_base(wallet, tx, height, errors, validator, config) {
        return false;
    }

    can_apply_type_rules(wallet, tx, errors, config)
}

fn can_apply_base(
    wallet: &Wallet,
    tx: &TransactionData,
    height: u64,
    errors: &mut Vec<String>,
    validator: &dyn SchemaValidator,
    config: &NetworkConfig,
) -> bool {
    if let Err(message) = validator.validate(tx) {
        errors.push(message);
        return false;
    }

    if wallet.multisignature.is_some() {
        return false;
    }

    let debit: Amount = [tx.amount, tx.fee].into_iter().sum();
    if wallet.balance.checked_sub(debit).is_none() {
        errors.push("Insufficient balance in the wallet".to_string());
        return false;
    }

    if let Some(public_key) = &wallet.public_key {
        if !public_key.eq_ignore_ascii_case(&tx.sender_public_key) {
            errors.push(
                "wallet \"publicKey\" does not match transaction \"senderPublicKey\"".to_string(),
            );
            return false;
        }
    }

    match &wallet.second_public_key {
        None => {
            if tx.second_signature_field().is_some()
                && !config.milestone(height).ignore_invalid_second_signature_field
            {
                errors.push("Invalid second-signature field".to_string());
                return false;
            }
        }
        Some(second_public_key) => {
            if !crypto::verify_second_signature(tx, second_public_key, config) {
                errors.push("Failed to verify second-signature".to_string());
                return false;
            }
        }
    }

    true
}

fn can_apply_type_rules(
    wallet: &Wallet,
    tx: &TransactionData,
    errors: &mut Vec<String>,
    config: &NetworkConfig,
) -> bool {
    match tx.transaction_type {
        TransactionType::Transfer
        | TransactionType::Ipfs
        | TransactionType::TimelockTransfer
        | TransactionType::SecondSignature => true,
        TransactionType::DelegateResignation => {
            if wallet.username.is_none() {
                errors.push("Wallet has not registered a username".to_string());
                return false;
            }
            true
        }
        TransactionType::DelegateRegistration => {
            let username = match &tx.asset {
                Asset::Delegate { username } => username,
                _ => return false,
            };
            if wallet.username.is_some() || *username != username.to_lowercase() {
                errors.push("Wallet already has a registered username".to_string());
                return false;
            }
            true
        }
        TransactionType::Vote => can_apply_vote(wallet, tx, errors),
        TransactionType::MultiSignature => can_apply_multisignature(wallet, tx, errors, config),
        TransactionType::MultiPayment => {
            let Asset::Payments(payments) = &tx.asset else {
                return false;
            };
            let total: Amount = payments.iter().map(|p| p.amount).sum();
            let debit: Amount = [total, tx.fee].into_iter().sum();
            if wallet.balance.checked_sub(debit).is_none() {
                errors.push(
                    "Insufficient balance in the wallet to transfer all payments".to_string(),
                );
                return false;
            }
            true
        }
    }
}

fn can_apply_vote(wallet: &Wallet, tx: &TransactionData, errors: &mut Vec<String>) -> bool {
    let Asset::Votes(votes) = &tx.asset else {
        return false;
    };
    let Some(vote) = votes.first() else {
        return false;
    };
    let Ok((sign, target)) = split_signed_key(vote) else {
        return false;
    };

    if sign == '-' {
        match &wallet.vote {
            None => {
                errors.push("Wallet has not voted yet".to_string());
                false
            }
            Some(current) if current != target => {
                errors.push(
                    "The unvote public key does not match the currently voted one".to_string(),
                );
                false
            }
            Some(_) => true,
        }
    } else {
        if wallet.vote.is_some() {
            errors.push("Wallet has already voted".to_string());
            return false;
        }
        true
    }
}

fn can_apply_multisignature(
    wallet: &Wallet,
    tx: &TransactionData,
    errors: &mut Vec<String>,
    config: &NetworkConfig,
) -> bool {
    if wallet.multisignature.is_some() {
        errors.push("Wallet is already a multi-signature wallet".to_string());
        return false;
    }
    let Asset::Multisignature(multisignature) = &tx.asset else {
        return false;
    };
    if multisignature.keysgroup.len() < multisignature.min as usize {
        errors.push("Specified key count does not meet minimum key count".to_string());
        return false;
    }
    let signature_count = tx.signatures.as_ref().map_or(0, |s| s.len());
    if multisignature.keysgroup.len() != signature_count {
        errors.push("Specified key count does not equal signature count".to_string());
        return false;
    }
    if !wallet.verify_signatures(tx, multisignature, config) {
        errors.push("Failed to verify multi-signatures".to_string());
        return false;
    }
    true
}

/// Debit `amount + fee` and run the type-specific mutation if the
/// transaction was sent by this wallet. Returns whether it applied.
pub fn apply_to_sender(
    wallet: &mut Wallet,
    tx: &TransactionData,
    config: &NetworkConfig,
) -> Result<bool> {
    if !sent_by(wallet, tx, config)? {
        return Ok(false);
    }
    let debit: Amount = [tx.amount, tx.fee].into_iter().sum();
    wallet.balance = wallet.balance.saturating_sub(debit);
    mutate_sender(wallet, tx, false);
    wallet.dirty = true;
    log::trace!(
        "Applied {:?} transaction to sender {}, new balance {}",
        tx.transaction_type,
        wallet.address,
        wallet.balance
    );
    Ok(true)
}

/// Undo [`apply_to_sender`]
pub fn revert_for_sender(
    wallet: &mut Wallet,
    tx: &TransactionData,
    config: &NetworkConfig,
) -> Result<bool> {
    if !sent_by(wallet, tx, config)? {
        return Ok(false);
    }
    let credit: Amount = [tx.amount, tx.fee].into_iter().sum();
    wallet.balance = [wallet.balance, credit].into_iter().sum();
    mutate_sender(wallet, tx, true);
    wallet.dirty = true;
    Ok(true)
}

/// Credit `amount` if this wallet is the recipient
pub fn apply_to_recipient(wallet: &mut Wallet, tx: &TransactionData) -> bool {
    if tx.recipient_id.as_deref() != Some(wallet.address.as_str()) {
        return false;
    }
    wallet.balance = [wallet.balance, tx.amount].into_iter().sum();
    wallet.dirty = true;
    true
}

/// Undo [`apply_to_recipient`]
pub fn revert_for_recipient(wallet: &mut Wallet, tx: &TransactionData) -> bool {
    if tx.recipient_id.as_deref() != Some(wallet.address.as_str()) {
        return false;
    }
    wallet.balance = wallet.balance.saturating_sub(tx.amount);
    wallet.dirty = true;
    true
}

fn sent_by(wallet: &Wallet, tx: &TransactionData, config: &NetworkConfig) -> Result<bool> {
    if let Some(public_key) = &wallet.public_key {
        if public_key.eq_ignore_ascii_case(&tx.sender_public_key) {
            return Ok(true);
        }
    }
    let sender_address = address_from_public_key(&tx.sender_public_key, config.pub_key_hash)?;
    Ok(sender_address == wallet.address)
}

fn mutate_sender(wallet: &mut Wallet, tx: &TransactionData, revert: bool) {
    match (&tx.transaction_type, &tx.asset) {
        (TransactionType::DelegateRegistration, Asset::Delegate { username }) => {
            wallet.username = if revert { None } else { Some(username.clone()) };
        }
        (TransactionType::SecondSignature, Asset::SecondSignature { public_key }) => {
            wallet.second_public_key = if revert { None } else { Some(public_key.clone()) };
        }
        (TransactionType::MultiSignature, Asset::Multisignature(multisignature)) => {
            wallet.multisignature = if revert { None } else { Some(multisignature.clone()) };
        }
        (TransactionType::Vote, Asset::Votes(votes)) => {
            if let Some(Ok((sign, target))) = votes.first().map(|vote| split_signed_key(vote)) {
                let voting = sign == '+';
                // unvote-then-revert restores the previous vote
                wallet.vote = if voting != revert {
                    Some(target.to_string())
                } else {
                    None
                };
            }
        }
        _ => {}
    }
}
