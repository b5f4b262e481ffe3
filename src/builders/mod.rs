//! Transaction builders
//!
//! One chainable builder drafts all nine types; the per-type
//! constructors seed the right discriminant, default fee and empty
//! asset. Vote and multisignature registrations address themselves at
//! signing time, and the multisignature fee tracks the participant
//! count.

use crate::config::NetworkConfig;
use crate::core::transaction::{
    crypto, Asset, MultisignatureAsset, Payment, TransactionData, TransactionType,
};
use crate::core::Amount;
use crate::error::{ChainError, Result};
use crate::utils::{address_from_public_key, Keys};

/// Hard cap on multi-payment entries
pub const MAXIMUM_PAYMENT_COUNT: usize = 2258;

#[derive(Debug)]
pub struct TransactionBuilder<'a> {
    config: &'a NetworkConfig,
    data: TransactionData,
    /// Vote and multisignature registrations derive their recipient
    /// from the signer's own key
    self_addressing: bool,
}

impl<'a> TransactionBuilder<'a> {
    fn new(
        config: &'a NetworkConfig,
        transaction_type: TransactionType,
        fee: u64,
        asset: Asset,
    ) -> TransactionBuilder<'a> {
        TransactionBuilder {
            config,
            data: TransactionData {
                transaction_type,
                fee: Amount::new(fee),
                asset,
                network: config.pub_key_hash,
                ..Default::default()
            },
            self_addressing: false,
        }
    }

    pub fn transfer(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(config, TransactionType::Transfer, config.fees.transfer, Asset::None)
    }

    pub fn second_signature(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(
            config,
            TransactionType::SecondSignature,
            config.fees.second_signature,
            Asset::None,
        )
    }

    pub fn delegate_registration(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(
            config,
            TransactionType::DelegateRegistration,
            config.fees.delegate_registration,
            Asset::None,
        )
    }

    pub fn vote(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        let mut builder = Self::new(
            config,
            TransactionType::Vote,
            config.fees.vote,
            Asset::Votes(Vec::new()),
        );
        builder.self_addressing = true;
        builder
    }

    pub fn multi_signature(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        let mut builder = Self::new(
            config,
            TransactionType::MultiSignature,
            config.fees.multi_signature,
            Asset::Multisignature(MultisignatureAsset::default()),
        );
        builder.self_addressing = true;
        builder
    }

    pub fn ipfs(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(config, TransactionType::Ipfs, config.fees.ipfs, Asset::None)
    }

    pub fn timelock_transfer(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(
            config,
            TransactionType::TimelockTransfer,
            config.fees.timelock_transfer,
            Asset::None,
        )
    }

    pub fn multi_payment(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(
            config,
            TransactionType::MultiPayment,
            config.fees.multi_payment,
            Asset::Payments(Vec::new()),
        )
    }

    pub fn delegate_resignation(config: &'a NetworkConfig) -> TransactionBuilder<'a> {
        Self::new(
            config,
            TransactionType::DelegateResignation,
            config.fees.delegate_resignation,
            Asset::None,
        )
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.data.amount = Amount::new(amount);
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.data.fee = Amount::new(fee);
        self
    }

    pub fn recipient_id(mut self, recipient_id: &str) -> Self {
        self.data.recipient_id = Some(recipient_id.to_string());
        self
    }

    pub fn sender_public_key(mut self, public_key: &str) -> Self {
        self.data.sender_public_key = public_key.to_string();
        self
    }

    pub fn vendor_field(mut self, vendor_field: &str) -> Self {
        self.data.vendor_field = Some(vendor_field.to_string());
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.data.timestamp = timestamp;
        self
    }

    pub fn network(mut self, network: u8) -> Self {
        self.data.network = network;
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.data.version = version;
        self
    }

    pub fn expiration(mut self, expiration: u32) -> Self {
        self.data.expiration = expiration;
        self
    }

    pub fn timelock(mut self, timelock: u64, timelock_type: u8) -> Self {
        self.data.timelock = timelock;
        self.data.timelock_type = timelock_type;
        self
    }

    /// Second-signature registration payload, from the second passphrase
    pub fn signature_asset(mut self, second_passphrase: &str) -> Result<Self> {
        let keys = Keys::from_passphrase(second_passphrase)?;
        self.data.asset = Asset::SecondSignature {
            public_key: keys.public_key.clone(),
        };
        Ok(self)
    }

    pub fn username(mut self, username: &str) -> Self {
        self.data.asset = Asset::Delegate {
            username: username.to_string(),
        };
        self
    }

    /// Vote strings, each `+`/`-` prefixed
    pub fn votes(mut self, votes: Vec<String>) -> Self {
        self.data.asset = Asset::Votes(votes);
        self
    }

    /// Multisignature registration payload; the fee scales with the
    /// participant count
    pub fn multisignature_asset(mut self, asset: MultisignatureAsset) -> Self {
        let participants = asset.keysgroup.len() as u64;
        self.data.fee = Amount::new(self.config.fees.multi_signature * (participants + 1));
        self.data.asset = Asset::Multisignature(asset);
        self
    }

    pub fn dag(mut self, dag: &str) -> Self {
        self.data.asset = Asset::Ipfs {
            dag: dag.to_string(),
        };
        self
    }

    /// Append a payment; the transaction amount is the running sum
    pub fn add_payment(mut self, amount: u64, recipient_id: &str) -> Result<Self> {
        let Asset::Payments(payments) = &mut self.data.asset else {
            return Err(ChainError::InvalidTransactionData(
                "Only multi-payment transactions carry payments".to_string(),
            ));
        };
        if payments.len() >= MAXIMUM_PAYMENT_COUNT {
            return Err(ChainError::MaximumPaymentCountExceeded {
                limit: MAXIMUM_PAYMENT_COUNT,
            });
        }
        payments.push(Payment {
            amount: Amount::new(amount),
            recipient_id: recipient_id.to_string(),
        });
        self.data.amount = payments.iter().map(|p| p.amount).sum();
        Ok(self)
    }

    pub fn sign(self, passphrase: &str) -> Result<Self> {
        let keys = Keys::from_passphrase(passphrase)?;
        self.sign_with_keys(&keys)
    }

    pub fn sign_with_wif(self, wif: &str) -> Result<Self> {
        let keys = Keys::from_wif(wif, self.config.wif)?;
        self.sign_with_keys(&keys)
    }

    fn sign_with_keys(mut self, keys: &Keys) -> Result<Self> {
        self.data.sender_public_key = keys.public_key.clone();
        if self.self_addressing {
            self.data.recipient_id = Some(address_from_public_key(
                &keys.public_key,
                self.config.pub_key_hash,
            )?);
        }
        crypto::sign(&mut self.data, keys, self.config)?;
        Ok(self)
    }

    pub fn second_sign(mut self, second_passphrase: &str) -> Result<Self> {
        let keys = Keys::from_passphrase(second_passphrase)?;
        crypto::second_sign(&mut self.data, &keys, self.config)?;
        Ok(self)
    }

    pub fn second_sign_with_wif(mut self, wif: &str) -> Result<Self> {
        let keys = Keys::from_wif(wif, self.config.wif)?;
        crypto::second_sign(&mut self.data, &keys, self.config)?;
        Ok(self)
    }

    /// The finished transaction, with its id
    ///
    /// Requires a sender public key and at least one signature.
    pub fn get_struct(&self) -> Result<TransactionData> {
        if self.data.sender_public_key.is_empty()
            || (self.data.signature.is_none() && self.data.signatures.is_none())
        {
            return Err(ChainError::MissingTransactionSignature);
        }
        let mut data = self.data.clone();
        data.id = Some(crypto::get_id(&data, self.config)?);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::verify;

    #[test]
    fn test_transfer_builder_produces_verifiable_transaction() {
        let config = NetworkConfig::mainnet();
        let tx = TransactionBuilder::transfer(&config)
            .amount(200_000_000)
            .recipient_id("AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
            .vendor_field("coffee")
            .sign("this is a top secret passphrase")
            .unwrap()
            .get_struct()
            .unwrap();

        assert_eq!(tx.transaction_type, TransactionType::Transfer);
        assert_eq!(tx.fee, Amount::new(10_000_000)); // schedule default
        assert!(tx.id.is_some());
        assert!(verify(&tx, &config));
    }

    #[test]
    fn test_get_struct_requires_signature() {
        let config = NetworkConfig::mainnet();
        let builder = TransactionBuilder::transfer(&config)
            .amount(1)
            .recipient_id("AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff");

        assert_eq!(
            builder.get_struct().unwrap_err(),
            ChainError::MissingTransactionSignature
        );
    }

    #[test]
    fn test_vote_builder_self_addresses() {
        let config = NetworkConfig::mainnet();
        let keys = Keys::from_passphrase("voter").unwrap();
        let delegate = Keys::from_passphrase("delegate").unwrap();

        let tx = TransactionBuilder::vote(&config)
            .votes(vec![format!("+{}", delegate.public_key)])
            .sign("voter")
            .unwrap()
            .get_struct()
            .unwrap();

        assert_eq!(tx.fee, Amount::new(100_000_000));
        assert_eq!(
            tx.recipient_id,
            Some(address_from_public_key(&keys.public_key, config.pub_key_hash).unwrap())
        );
    }

    #[test]
    fn test_multisignature_fee_scales_with_participants() {
        let config = NetworkConfig::mainnet();
        let a = Keys::from_passphrase("a").unwrap();
        let b = Keys::from_passphrase("b").unwrap();
        let c = Keys::from_passphrase("c").unwrap();

        let tx = TransactionBuilder::multi_signature(&config)
            .multisignature_asset(MultisignatureAsset {
                min: 2,
                keysgroup: vec![
                    format!("+{}", a.public_key),
                    format!("+{}", b.public_key),
                    format!("+{}", c.public_key),
                ],
                lifetime: 24,
            })
            .sign("owner")
            .unwrap()
            .get_struct()
            .unwrap();

        // base x (3 participants + 1)
        assert_eq!(tx.fee, Amount::new(2_000_000_000));
        assert!(tx.recipient_id.is_some());
    }

    #[test]
    fn test_multi_payment_cap_boundary() {
        let config = NetworkConfig::mainnet();
        let mut builder = TransactionBuilder::multi_payment(&config);

        for _ in 0..MAXIMUM_PAYMENT_COUNT {
            builder = builder
                .add_payment(1, "AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
                .unwrap();
        }
        let err = builder
            .add_payment(1, "AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::MaximumPaymentCountExceeded {
                limit: MAXIMUM_PAYMENT_COUNT
            }
        );
    }

    #[test]
    fn test_multi_payment_amount_is_running_sum() {
        let config = NetworkConfig::mainnet();
        let builder = TransactionBuilder::multi_payment(&config)
            .add_payment(100, "AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
            .unwrap()
            .add_payment(250, "AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
            .unwrap();

        let tx = builder.sign("payer").unwrap().get_struct().unwrap();
        assert_eq!(tx.amount, Amount::new(350));
    }

    #[test]
    fn test_second_sign_with_wif_round_trip() {
        let config = NetworkConfig::mainnet();
        let second = Keys::from_passphrase("second passphrase").unwrap();
        let wif = second.to_wif(config.wif).unwrap();

        let tx = TransactionBuilder::transfer(&config)
            .amount(1)
            .recipient_id("AJWRd23HNEhPLkK1ymMnwnDBX2a7QBZqff")
            .sign("first passphrase")
            .unwrap()
            .second_sign_with_wif(&wif)
            .unwrap()
            .get_struct()
            .unwrap();

        assert!(tx.second_signature.is_some());
        assert!(crypto::verify_second_signature(&tx, &second.public_key, &config));
    }
}
