// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Flow transaction envelope
//!
//! The envelope travels between construction steps as hex encoded BCS.  Signatures are made
//! over the domain tagged envelope message, and the transaction identifier is the SHA3-256 hash
//! of the complete envelope.

use crate::chain::{Address, Identifier};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Length of the domain tag prefixed to signed messages
const DOMAIN_TAG_LENGTH: usize = 32;
const TRANSACTION_DOMAIN: &[u8] = b"FLOW-V0.0-transaction";

/// Domain tag right padded with zeroes
fn transaction_domain_tag() -> [u8; DOMAIN_TAG_LENGTH] {
    let mut tag = [0u8; DOMAIN_TAG_LENGTH];
    tag[..TRANSACTION_DOMAIN.len()].copy_from_slice(TRANSACTION_DOMAIN);
    tag
}

/// The account key used for sequencing
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProposalKey {
    pub address: Address,
    pub key_index: u32,
    pub sequence_number: u64,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionSignature {
    pub address: Address,
    pub key_index: u32,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Transaction {
    pub script: Vec<u8>,
    /// JSON-Cadence encoded arguments
    pub arguments: Vec<Vec<u8>>,
    pub reference_block_id: Identifier,
    pub gas_limit: u64,
    pub proposal_key: ProposalKey,
    pub payer: Address,
    pub authorizers: Vec<Address>,
    pub payload_signatures: Vec<TransactionSignature>,
    pub envelope_signatures: Vec<TransactionSignature>,
}

/// Borrowed view of the signable part of a transaction
#[derive(Serialize)]
struct Payload<'a> {
    script: &'a [u8],
    arguments: &'a [Vec<u8>],
    reference_block_id: &'a Identifier,
    gas_limit: u64,
    proposal_key: &'a ProposalKey,
    payer: &'a Address,
    authorizers: &'a [Address],
}

impl Transaction {
    fn payload(&self) -> Payload<'_> {
        Payload {
            script: &self.script,
            arguments: &self.arguments,
            reference_block_id: &self.reference_block_id,
            gas_limit: self.gas_limit,
            proposal_key: &self.proposal_key,
            payer: &self.payer,
            authorizers: &self.authorizers,
        }
    }

    /// Message the payer signs: domain tag, payload and payload signatures
    pub fn envelope_message(&self) -> anyhow::Result<Vec<u8>> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend(bcs::to_bytes(&(self.payload(), &self.payload_signatures))?);
        Ok(message)
    }

    /// Canonical identifier of the transaction
    pub fn id(&self) -> anyhow::Result<Identifier> {
        let encoded = bcs::to_bytes(self)?;
        Identifier::from_slice(&Sha3_256::digest(&encoded))
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(hex::encode(bcs::to_bytes(self)?))
    }
}
