//! Structural transaction validation
//!
//! Handlers run a schema check before any state rule. The check is a
//! trait so embedders can swap in their own validator; the bundled
//! [`StructuralValidator`] covers the shape rules every type must meet.
//! Failures are messages, not errors: the first one is surfaced to the
//! caller verbatim.

use crate::core::transaction::{Asset, TransactionData, TransactionType};

/// Structural contract checked before handler state rules
pub trait SchemaValidator {
    /// Ok, or the first failure message
    fn validate(&self, transaction: &TransactionData) -> Result<(), String>;
}

/// Character set accepted in delegate usernames
fn valid_username_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '!' | '@' | '$' | '&' | '_' | '.')
}

fn valid_public_key(key: &str) -> bool {
    key.len() == 66 && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Per-type structural rules
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> StructuralValidator {
        StructuralValidator
    }

    fn validate_asset(&self, transaction: &TransactionData) -> Result<(), String> {
        match (transaction.transaction_type, &transaction.asset) {
            (TransactionType::Transfer, _) | (TransactionType::TimelockTransfer, _) => {
                if transaction.recipient_id.is_none() {
                    return Err("Transaction does not carry a recipient".to_string());
                }
                Ok(())
            }
            (TransactionType::SecondSignature, Asset::SecondSignature { public_key }) => {
                if !valid_public_key(public_key) {
                    return Err("Second signature public key is malformed".to_string());
                }
                Ok(())
            }
            (TransactionType::DelegateRegistration, Asset::Delegate { username }) => {
                if username.is_empty() || username.len() > 20 {
                    return Err("Delegate username length is out of range".to_string());
                }
                if !username.chars().all(valid_username_char) {
                    return Err("Delegate username contains invalid characters".to_string());
                }
                Ok(())
            }
            (TransactionType::Vote, Asset::Votes(votes)) => {
                if votes.len() != 1 {
                    return Err("Vote transactions carry exactly one vote".to_string());
                }
                let vote = &votes[0];
                if !vote.starts_with('+') && !vote.starts_with('-') {
                    return Err("Vote is missing its sign prefix".to_string());
                }
                if !valid_public_key(&vote[1..]) {
                    return Err("Vote public key is malformed".to_string());
                }
                Ok(())
            }
            (TransactionType::MultiSignature, Asset::Multisignature(multisignature)) => {
                if multisignature.min == 0 {
                    return Err("Multisignature minimum must be at least one".to_string());
                }
                if multisignature.keysgroup.is_empty() {
                    return Err("Multisignature keysgroup is empty".to_string());
                }
                for key in &multisignature.keysgroup {
                    let stripped = key
                        .strip_prefix('+')
                        .or_else(|| key.strip_prefix('-'))
                        .unwrap_or(key);
                    if !valid_public_key(stripped) {
                        return Err("Multisignature keysgroup key is malformed".to_string());
                    }
                }
                Ok(())
            }
            (TransactionType::Ipfs, Asset::Ipfs { dag }) => {
                if dag.is_empty() || dag.chars().any(|c| !c.is_ascii_hexdigit()) {
                    return Err("Ipfs dag is malformed".to_string());
                }
                Ok(())
            }
            (TransactionType::MultiPayment, Asset::Payments(payments)) => {
                if payments.is_empty() {
                    return Err("Multi-payment carries no payments".to_string());
                }
                Ok(())
            }
            (TransactionType::DelegateResignation, _) => Ok(()),
            _ => Err("Transaction asset does not match its type".to_string()),
        }
    }
}

impl SchemaValidator for StructuralValidator {
    fn validate(&self, transaction: &TransactionData) -> Result<(), String> {
        if !valid_public_key(&transaction.sender_public_key) {
            return Err("Sender public key is malformed".to_string());
        }
        if let Some(vendor_field) = &transaction.vendor_field {
            if vendor_field.len() > 64 {
                return Err("Vendor field exceeds 64 bytes".to_string());
            }
        }
        self.validate_asset(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::MultisignatureAsset;
    use crate::utils::Keys;

    fn base(transaction_type: TransactionType) -> TransactionData {
        let keys = Keys::from_passphrase("validator tests").unwrap();
        TransactionData {
            transaction_type,
            sender_public_key: keys.public_key.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn test_malformed_sender_key_rejected() {
        let mut tx = base(TransactionType::Transfer);
        tx.recipient_id = Some("AXoXnFi4z1Z6aFvjEYkDVCtBGW2PaRiM25".to_string());
        tx.sender_public_key = "zz".to_string();
        assert_eq!(
            StructuralValidator::new().validate(&tx),
            Err("Sender public key is malformed".to_string())
        );
    }

    #[test]
    fn test_transfer_requires_recipient() {
        let tx = base(TransactionType::Transfer);
        assert_eq!(
            StructuralValidator::new().validate(&tx),
            Err("Transaction does not carry a recipient".to_string())
        );
    }

    #[test]
    fn test_delegate_username_rules() {
        let mut tx = base(TransactionType::DelegateRegistration);

        tx.asset = Asset::Delegate {
            username: "genesis_1".to_string(),
        };
        assert!(StructuralValidator::new().validate(&tx).is_ok());

        tx.asset = Asset::Delegate {
            username: "UPPER".to_string(),
        };
        assert!(StructuralValidator::new().validate(&tx).is_err());

        tx.asset = Asset::Delegate {
            username: "a".repeat(21),
        };
        assert!(StructuralValidator::new().validate(&tx).is_err());
    }

    #[test]
    fn test_vote_shape() {
        let keys = Keys::from_passphrase("delegate").unwrap();
        let mut tx = base(TransactionType::Vote);

        tx.asset = Asset::Votes(vec![format!("+{}", keys.public_key)]);
        assert!(StructuralValidator::new().validate(&tx).is_ok());

        tx.asset = Asset::Votes(vec![keys.public_key.clone()]);
        assert!(StructuralValidator::new().validate(&tx).is_err());

        tx.asset = Asset::Votes(vec![
            format!("+{}", keys.public_key),
            format!("-{}", keys.public_key),
        ]);
        assert_eq!(
            StructuralValidator::new().validate(&tx),
            Err("Vote transactions carry exactly one vote".to_string())
        );
    }

    #[test]
    fn test_mismatched_asset_rejected() {
        let mut tx = base(TransactionType::MultiSignature);
        tx.asset = Asset::Delegate {
            username: "nope".to_string(),
        };
        assert_eq!(
            StructuralValidator::new().validate(&tx),
            Err("Transaction asset does not match its type".to_string())
        );

        tx.asset = Asset::Multisignature(MultisignatureAsset {
            min: 0,
            keysgroup: vec![],
            lifetime: 24,
        });
        assert!(StructuralValidator::new().validate(&tx).is_err());
    }
}
