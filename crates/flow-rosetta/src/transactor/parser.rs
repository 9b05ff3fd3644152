// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Decoding of transaction envelopes back into operations

use crate::{
    backend::Invoker,
    chain::{cadence::Value, Address, Transaction},
    error::ServiceResult,
    failure::{Description, Failure},
    scripts::Generator,
    transactor::verify_signature,
    types::{AccountIdentifier, BlockIdentifier, Operation, PartialBlockIdentifier},
    validator::Validator,
    FLOW_SYMBOL,
};
use std::sync::Arc;

const TRANSFER_ARGUMENTS: usize = 2;

/// A decoded transaction envelope
///
/// Only transfers built by this server are accepted: a single authorizer who is also payer and
/// proposer, the token transfer script and its amount and receiver arguments.
pub struct TransactionParser {
    transaction: Transaction,
    validator: Arc<Validator>,
    generator: Arc<dyn Generator>,
    invoker: Arc<dyn Invoker>,
}

impl TransactionParser {
    pub(crate) fn new(
        transaction: Transaction,
        validator: Arc<Validator>,
        generator: Arc<dyn Generator>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        TransactionParser {
            transaction,
            validator,
            generator,
            invoker,
        }
    }

    /// The debit and credit operations of the transfer
    pub fn operations(&self) -> ServiceResult<Vec<Operation>> {
        let tx = &self.transaction;

        let sender = match tx.authorizers.as_slice() {
            [sender] => *sender,
            authorizers => {
                return Err(Failure::InvalidAuthorizers {
                    description: Description::new("transaction requires exactly one authorizer"),
                    have: authorizers.to_vec(),
                    want: vec![tx.payer],
                }
                .into())
            },
        };

        if tx.payer != sender {
            return Err(Failure::InvalidPayer {
                description: Description::new("transaction payer must be the sender"),
                have: tx.payer,
                want: sender,
            }
            .into());
        }

        let proposer = tx.proposal_key.address;
        if proposer == Address::ZERO || proposer != sender {
            return Err(Failure::InvalidProposer {
                description: Description::new("transaction proposer must be the sender"),
                have: proposer,
                want: sender,
            }
            .into());
        }

        let [amount, receiver] = tx.arguments.as_slice() else {
            return Err(Failure::InvalidArguments {
                description: Description::new("transfer requires an amount and a receiver"),
                have: tx.arguments.len(),
                want: TRANSFER_ARGUMENTS,
            }
            .into());
        };

        let amount = match Value::from_json(amount) {
            Ok(Value::UFix64(amount)) => amount,
            Ok(other) => {
                return Err(Failure::InvalidAmount {
                    description: Description::new("amount argument is not a UFix64")
                        .with("type", format!("{:?}", other)),
                    amount: String::from_utf8_lossy(amount).into_owned(),
                }
                .into())
            },
            Err(err) => {
                return Err(Failure::InvalidAmount {
                    description: Description::new("amount argument could not be decoded")
                        .with("error", err.to_string()),
                    amount: String::from_utf8_lossy(amount).into_owned(),
                }
                .into())
            },
        };

        let receiver = match Value::from_json(receiver) {
            Ok(Value::Address(address)) => {
                let chain_id = self.validator.params().chain_id;
                if !chain_id.is_valid_address(&address) {
                    return Err(Failure::InvalidReceiver {
                        description: Description::new("receiver address is not valid for chain")
                            .with("chain", chain_id.as_str()),
                        receiver: address.to_hex(),
                    }
                    .into());
                }
                address
            },
            Ok(_) | Err(_) => {
                return Err(Failure::InvalidReceiver {
                    description: Description::new("receiver argument is not an address"),
                    receiver: String::from_utf8_lossy(receiver).into_owned(),
                }
                .into())
            },
        };

        let script = self.generator.transfer_tokens(FLOW_SYMBOL)?;
        if tx.script != script {
            return Err(Failure::InvalidScript {
                description: Description::new("transaction script is not the transfer script"),
                script: String::from_utf8_lossy(&tx.script).into_owned(),
            }
            .into());
        }

        let value = i128::from(amount.atomic());
        Ok(vec![
            Operation::transfer(0, sender, -value),
            Operation::transfer(1, receiver, value),
        ])
    }

    /// Accounts that signed the envelope, after verifying their signatures
    pub async fn signers(&self) -> ServiceResult<Vec<AccountIdentifier>> {
        let tx = &self.transaction;

        let [signature] = tx.envelope_signatures.as_slice() else {
            return Err(Failure::InvalidSignatures {
                description: Description::new("transaction requires exactly one envelope signature"),
                have: tx.envelope_signatures.len(),
                want: 1,
            }
            .into());
        };

        if signature.address != tx.payer {
            return Err(Failure::InvalidSignature {
                description: Description::new("envelope must be signed by the payer")
                    .with("have_signer", signature.address.to_hex())
                    .with("want_signer", tx.payer.to_hex()),
            }
            .into());
        }

        let (height, _) = self
            .validator
            .block(&PartialBlockIdentifier::by_hash(tx.reference_block_id.to_hex()))
            .await?;
        let key = self
            .invoker
            .key(height, &signature.address, signature.key_index)
            .await?;
        verify_signature(tx, height, &key, signature.address, &signature.signature)?;

        Ok(vec![signature.address.into()])
    }

    /// The block the transaction was built on
    pub async fn reference_block(&self) -> ServiceResult<BlockIdentifier> {
        let (height, block_id) = self
            .validator
            .block(&PartialBlockIdentifier::by_hash(
                self.transaction.reference_block_id.to_hex(),
            ))
            .await?;
        Ok(BlockIdentifier::new(height, block_id))
    }

    /// Sequence number of the proposal key
    pub fn sequence(&self) -> u64 {
        self.transaction.proposal_key.sequence_number
    }
}
