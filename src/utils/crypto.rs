use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use ripemd::{Digest as RipemdDigest, Ripemd160};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{ChainError, Result};

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| ChainError::InvalidAddress(format!("Invalid base58 encoding: {e}")))
}

/// Encode a payload with the 4-byte double-SHA-256 checksum suffix
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = payload.to_vec();
    let checksum = sha256_digest(&sha256_digest(payload));
    data.extend_from_slice(&checksum[0..4]);
    base58_encode(&data)
}

/// Decode a base58check string, verifying the checksum
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>> {
    let data = base58_decode(encoded)?;
    if data.len() < 5 {
        return Err(ChainError::InvalidAddress("Payload too short".to_string()));
    }
    let (payload, checksum) = data.split_at(data.len() - 4);
    let expected = sha256_digest(&sha256_digest(payload));
    if checksum != &expected[0..4] {
        return Err(ChainError::InvalidAddress(
            "Checksum mismatch".to_string(),
        ));
    }
    Ok(payload.to_vec())
}

/// A secp256k1 key pair with its hex-encoded compressed public key
///
/// The private key is scrubbed from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Keys {
    pub public_key: String,
    pub private_key: String,
    pub compressed: bool,
}

impl Drop for Keys {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl Keys {
    /// Derive keys from a passphrase: the private key is the SHA-256 of
    /// the passphrase bytes
    pub fn from_passphrase(passphrase: &str) -> Result<Keys> {
        let digest = sha256_digest(passphrase.as_bytes());
        Keys::from_private_key(&digest)
    }

    pub fn from_private_key(private_key: &[u8]) -> Result<Keys> {
        let signing_key = SigningKey::from_slice(private_key)
            .map_err(|e| ChainError::Crypto(format!("Invalid private key: {e}")))?;
        let public_key = signing_key.verifying_key().to_sec1_bytes();

        Ok(Keys {
            public_key: hex::encode(public_key),
            private_key: hex::encode(private_key),
            compressed: true,
        })
    }

    /// Decode a WIF string, checking its version byte against the network
    pub fn from_wif(wif: &str, network_wif: u8) -> Result<Keys> {
        let payload = base58check_decode(wif)?;
        if payload.len() < 33 {
            return Err(ChainError::Crypto("WIF payload too short".to_string()));
        }
        if payload[0] != network_wif {
            return Err(ChainError::InvalidNetworkVersion {
                expected: network_wif,
                actual: payload[0],
            });
        }

        // A 34-byte payload carries the trailing compression flag
        let compressed = payload.len() == 34 && payload[33] == 0x01;
        let mut keys = Keys::from_private_key(&payload[1..33])?;
        keys.compressed = compressed;
        Ok(keys)
    }

    /// Encode these keys as WIF for the given network version byte
    pub fn to_wif(&self, network_wif: u8) -> Result<String> {
        let private = hex::decode(&self.private_key)?;
        let mut payload = Vec::with_capacity(34);
        payload.push(network_wif);
        payload.extend_from_slice(&private);
        if self.compressed {
            payload.push(0x01);
        }
        Ok(base58check_encode(&payload))
    }
}

/// Derive the base58check address for a compressed public key
///
/// The payload is the network version byte followed by the RIPEMD-160
/// of the raw public key bytes. The key is hashed directly, without an
/// intermediate SHA-256.
pub fn address_from_public_key(public_key: &str, version: u8) -> Result<String> {
    let key_bytes = hex::decode(public_key)?;
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(&ripemd160_digest(&key_bytes));
    Ok(base58check_encode(&payload))
}

/// True if `address` decodes cleanly and carries the expected version byte
pub fn validate_address(address: &str, version: u8) -> bool {
    match base58check_decode(address) {
        Ok(payload) => payload.len() == 21 && payload[0] == version,
        Err(_) => false,
    }
}

/// Produce a DER-encoded ECDSA signature over a precomputed 32-byte hash
pub fn sign_hash(hash: &[u8], keys: &Keys) -> Result<Vec<u8>> {
    let private = hex::decode(&keys.private_key)?;
    let signing_key = SigningKey::from_slice(&private)
        .map_err(|e| ChainError::Crypto(format!("Invalid private key: {e}")))?;
    let signature: Signature = signing_key
        .sign_prehash(hash)
        .map_err(|e| ChainError::Crypto(format!("Failed to sign hash: {e}")))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Verify a DER-encoded ECDSA signature over a precomputed 32-byte hash
///
/// Malformed keys or signatures verify as false, never as an error: the
/// byte stream is attacker-supplied.
pub fn verify_hash(hash: &[u8], signature_der: &[u8], public_key: &[u8]) -> bool {
    let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match Signature::from_der(signature_der) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    // Historical signatures predate low-S enforcement
    let signature = signature.normalize_s().unwrap_or(signature);
    verifying_key.verify_prehash(hash, &signature).is_ok()
}
