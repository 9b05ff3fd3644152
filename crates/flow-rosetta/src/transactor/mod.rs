// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Transaction construction
//!
//! Construction is stateless: every step returns the data the client replays into the next
//! one.
//!
//! * Preprocess derives the [`Intent`] and names the proposer whose sequence number is needed
//! * Metadata picks the latest block as reference block and reads the sequence number
//! * Payloads compiles the envelope and hashes it for the payer to sign
//! * Parse decodes an envelope back into its operations
//! * Combine verifies the payer signature and attaches it to the envelope
//! * Hash and submit return the identifier of the signed envelope

use crate::{
    backend::{Invoker, Submitter},
    chain::{
        cadence::Value, crypto::CryptoError, AccountKey, Address, ProposalKey, Transaction,
        TransactionSignature,
    },
    error::ServiceResult,
    failure::{Description, Failure},
    scripts::Generator,
    types::{BlockIdentifier, PartialBlockIdentifier, Signature, SigningPayload, TransactionIdentifier},
    validator::Validator,
    FLOW_SYMBOL,
};
use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

mod intent;
mod parser;

pub use intent::{Intent, DEFAULT_GAS_LIMIT};
pub use parser::TransactionParser;

/// The only signature type accepted for envelopes
pub const SIGNATURE_TYPE: &str = "ecdsa";

/// Key index used for proposal and signing
const KEY_INDEX: u32 = 0;

pub struct Transactor {
    validator: Arc<Validator>,
    generator: Arc<dyn Generator>,
    invoker: Arc<dyn Invoker>,
    submitter: Arc<dyn Submitter>,
}

impl Transactor {
    pub fn new(
        validator: Arc<Validator>,
        generator: Arc<dyn Generator>,
        invoker: Arc<dyn Invoker>,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Transactor {
            validator,
            generator,
            invoker,
            submitter,
        }
    }

    /// Builds the unsigned envelope of a transfer on the given reference block
    pub async fn compile_transaction(
        &self,
        reference: &BlockIdentifier,
        intent: &Intent,
        sequence: u64,
    ) -> ServiceResult<Transaction> {
        let (_, reference_block_id) = self.validator.reference_block(reference).await?;

        let script = self.generator.transfer_tokens(FLOW_SYMBOL)?;
        let arguments = vec![
            Value::UFix64(intent.amount).to_json()?,
            Value::Address(intent.to).to_json()?,
        ];

        Ok(Transaction {
            script,
            arguments,
            reference_block_id,
            gas_limit: intent.gas_limit,
            proposal_key: ProposalKey {
                address: intent.proposer,
                key_index: KEY_INDEX,
                sequence_number: sequence,
            },
            payer: intent.payer,
            authorizers: vec![intent.from],
            payload_signatures: vec![],
            envelope_signatures: vec![],
        })
    }

    /// Hashes the envelope message with the hash algorithm of the signer's key
    pub async fn hash_payload(
        &self,
        transaction: &Transaction,
        signer: Address,
    ) -> ServiceResult<SigningPayload> {
        let height = self.reference_height(transaction).await?;
        let key = self.invoker.key(height, &signer, KEY_INDEX).await?;
        let message = transaction.envelope_message()?;
        let digest = key.hash_algorithm.hash(&message);

        Ok(SigningPayload {
            account_identifier: Some(signer.into()),
            hex_bytes: hex::encode(digest),
            signature_type: Some(SIGNATURE_TYPE.to_string()),
        })
    }

    /// Decodes a hex encoded envelope
    pub fn parse_transaction(&self, payload: &str) -> Result<TransactionParser, Failure> {
        let transaction = decode_transaction(payload)?;
        Ok(TransactionParser::new(
            transaction,
            self.validator.clone(),
            self.generator.clone(),
            self.invoker.clone(),
        ))
    }

    /// Verifies the payer signature and attaches it to the envelope
    pub async fn attach_signatures(
        &self,
        mut transaction: Transaction,
        signatures: &[Signature],
    ) -> ServiceResult<Transaction> {
        let [signature] = signatures else {
            return Err(Failure::InvalidSignatures {
                description: Description::new("transaction requires exactly one signature"),
                have: signatures.len(),
                want: 1,
            }
            .into());
        };

        if signature.signature_type != SIGNATURE_TYPE {
            return Err(Failure::InvalidSignature {
                description: Description::new("invalid signature type")
                    .with("have_type", signature.signature_type.as_str())
                    .with("want_type", SIGNATURE_TYPE),
            }
            .into());
        }

        let payer = transaction.payer;
        let signer = signature
            .signing_payload
            .account_identifier
            .as_ref()
            .map(|account| self.validator.account(account))
            .transpose()?;
        if signer != Some(payer) {
            return Err(Failure::InvalidSignature {
                description: Description::new("signature is not by the payer")
                    .with("have_signer", signer.map(|signer| signer.to_hex()).unwrap_or_default())
                    .with("want_signer", payer.to_hex()),
            }
            .into());
        }

        let bytes = hex::decode(&signature.hex_bytes).map_err(|err| Failure::InvalidSignature {
            description: Description::new("signature is not a valid hex-encoded string")
                .with("error", err.to_string()),
        })?;

        let height = self.reference_height(&transaction).await?;
        let key = self.invoker.key(height, &payer, KEY_INDEX).await?;
        if key.revoked {
            return Err(invalid_key(height, payer, "account key is revoked"));
        }
        let public_key = hex::decode(&signature.public_key.hex_bytes).map_err(|err| {
            Failure::InvalidKey {
                description: Description::new("public key is not a valid hex-encoded string")
                    .with("error", err.to_string()),
                height,
                address: payer,
                index: KEY_INDEX,
            }
        })?;
        if strip_sec1_tag(&public_key) != key.public_key.as_slice() {
            return Err(invalid_key(
                height,
                payer,
                "public key does not match account key",
            ));
        }

        verify_signature(&transaction, height, &key, payer, &bytes)?;
        debug!(payer = %payer, height, "attaching envelope signature");

        transaction.envelope_signatures = vec![TransactionSignature {
            address: payer,
            key_index: KEY_INDEX,
            signature: bytes,
        }];
        Ok(transaction)
    }

    pub fn transaction_identifier(
        &self,
        transaction: &Transaction,
    ) -> ServiceResult<TransactionIdentifier> {
        Ok(transaction.id()?.into())
    }

    pub async fn submit_transaction(
        &self,
        transaction: &Transaction,
    ) -> ServiceResult<TransactionIdentifier> {
        let transaction_id = self
            .submitter
            .transaction(transaction)
            .await
            .context("could not submit transaction")?;
        Ok(transaction_id.into())
    }

    async fn reference_height(&self, transaction: &Transaction) -> ServiceResult<u64> {
        let block = PartialBlockIdentifier::by_hash(transaction.reference_block_id.to_hex());
        let (height, _) = self.validator.block(&block).await?;
        Ok(height)
    }
}

/// Decodes a hex encoded BCS envelope
pub fn decode_transaction(payload: &str) -> Result<Transaction, Failure> {
    let bytes = hex::decode(payload).map_err(|err| Failure::InvalidPayload {
        description: Description::new("transaction is not a valid hex-encoded string")
            .with("error", err.to_string()),
        encoding: "hex".to_string(),
    })?;
    bcs::from_bytes(&bytes).map_err(|err| Failure::InvalidPayload {
        description: Description::new("transaction could not be decoded")
            .with("error", err.to_string()),
        encoding: "bcs".to_string(),
    })
}

/// Verifies a signature over the envelope message of a transaction
pub(crate) fn verify_signature(
    transaction: &Transaction,
    height: u64,
    key: &AccountKey,
    address: Address,
    signature: &[u8],
) -> ServiceResult<()> {
    let message = transaction.envelope_message()?;
    let digest = key.hash_algorithm.hash(&message);
    match key.verify(&digest, signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Failure::InvalidSignature {
            description: Description::new("signature does not verify against account key")
                .with("account", address.to_hex()),
        }
        .into()),
        Err(CryptoError::InvalidKey(err)) => Err(Failure::InvalidKey {
            description: Description::new("account key could not be decoded").with("error", err),
            height,
            address,
            index: key.index,
        }
        .into()),
        Err(CryptoError::InvalidSignature(err)) => Err(Failure::InvalidSignature {
            description: Description::new("signature could not be decoded").with("error", err),
        }
        .into()),
    }
}

fn invalid_key(height: u64, address: Address, text: &str) -> crate::error::ServiceError {
    Failure::InvalidKey {
        description: Description::new(text),
        height,
        address,
        index: KEY_INDEX,
    }
    .into()
}

/// Drops the SEC1 uncompressed point tag if present
fn strip_sec1_tag(public_key: &[u8]) -> &[u8] {
    match public_key {
        [0x04, rest @ ..] if rest.len() == 64 => rest,
        _ => public_key,
    }
}
