// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Account keys and ECDSA verification for the curves Flow accounts may use

use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureAlgorithm {
    EcdsaP256,
    EcdsaSecp256k1,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    #[serde(rename = "SHA3_256")]
    Sha3_256,
}

impl HashAlgorithm {
    pub fn hash(&self, message: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha2_256 => <sha2::Sha256 as sha2::Digest>::digest(message).to_vec(),
            HashAlgorithm::Sha3_256 => <sha3::Sha3_256 as sha3::Digest>::digest(message).to_vec(),
        }
    }
}

/// A public key registered on a Flow account
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountKey {
    pub index: u32,
    /// Uncompressed curve point without the SEC1 tag, 64 bytes
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    pub weight: u32,
    pub sequence_number: u64,
    pub revoked: bool,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
}

impl AccountKey {
    /// Verifies a raw `r || s` signature over an already hashed message
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        match self.signature_algorithm {
            SignatureAlgorithm::EcdsaP256 => {
                let mut sec1 = Vec::with_capacity(self.public_key.len() + 1);
                sec1.push(0x04);
                sec1.extend_from_slice(&self.public_key);
                let key = VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|err| CryptoError::InvalidKey(err.to_string()))?;
                let signature = Signature::from_slice(signature)
                    .map_err(|err| CryptoError::InvalidSignature(err.to_string()))?;
                Ok(key.verify_prehash(digest, &signature).is_ok())
            },
            SignatureAlgorithm::EcdsaSecp256k1 => {
                let key = libsecp256k1::PublicKey::parse_slice(
                    &self.public_key,
                    Some(libsecp256k1::PublicKeyFormat::Raw),
                )
                .map_err(|err| CryptoError::InvalidKey(format!("{:?}", err)))?;
                let signature = libsecp256k1::Signature::parse_standard_slice(signature)
                    .map_err(|err| CryptoError::InvalidSignature(format!("{:?}", err)))?;
                let message = libsecp256k1::Message::parse_slice(digest)
                    .map_err(|err| CryptoError::InvalidSignature(format!("{:?}", err)))?;
                Ok(libsecp256k1::verify(&message, &signature, &key))
            },
        }
    }
}
