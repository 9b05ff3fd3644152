// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Objects of the Rosetta API
//!
//! [Spec](https://www.rosetta-api.org/docs/api_objects.html)

use crate::{
    chain::Address,
    types::{
        AccountIdentifier, BlockIdentifier, Error, OperationIdentifier, OperationStatus,
        TransactionIdentifier,
    },
    FLOW_DECIMALS, FLOW_SYMBOL, OPERATION_TRANSFER, STATUS_COMPLETED,
};
use serde::{Deserialize, Serialize};

/// A description of all types used by the Rosetta implementation.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Allow.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Allow {
    /// List of all possible operation statuses
    pub operation_statuses: Vec<OperationStatus>,
    /// List of all possible operation types
    pub operation_types: Vec<String>,
    /// List of all possible errors
    pub errors: Vec<Error>,
    /// If the server is allowed to lookup historical balances
    pub historical_balance_lookup: bool,
}

/// Amount of a [`Currency`] in atomic units
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Amount.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Amount {
    /// Value of transaction as a String representation of an integer
    pub value: String,
    /// [`Currency`]
    pub currency: Currency,
}

impl Amount {
    pub fn flow(value: i128) -> Amount {
        Amount {
            value: value.to_string(),
            currency: Currency::flow(),
        }
    }
}

/// Representation of a Block for a blockchain.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Block.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Block {
    /// Block identifier of the current block
    pub block_identifier: BlockIdentifier,
    /// Block identifier of the previous block
    pub parent_block_identifier: BlockIdentifier,
    /// Timestamp in milliseconds to the block from the UNIX_EPOCH
    pub timestamp: u64,
    /// Transactions of the block that fit in the response
    pub transactions: Vec<Transaction>,
}

/// Currency represented as atomic units including decimals
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Currency.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Currency {
    /// Symbol of currency
    #[serde(default)]
    pub symbol: String,
    /// Number of decimals to be considered in the currency
    #[serde(default)]
    pub decimals: u32,
}

impl Currency {
    pub fn flow() -> Currency {
        Currency {
            symbol: FLOW_SYMBOL.to_string(),
            decimals: FLOW_DECIMALS,
        }
    }
}

/// A single operation in a transaction, one side of a transfer
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Operation.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Operation {
    /// Identifier of an operation within a transaction
    pub operation_identifier: OperationIdentifier,
    /// Type of operation, always `TRANSFER`
    #[serde(rename = "type")]
    pub operation_type: String,
    /// Status of operation.  Must be blank for construction, and `COMPLETED` on the read path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Account affected by the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    /// Signed amount, negative for the sending side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
}

impl Operation {
    /// A transfer leg as it appears in a constructed transaction
    pub fn transfer(index: u64, address: Address, value: i128) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier {
                index,
                network_index: None,
            },
            operation_type: OPERATION_TRANSFER.to_string(),
            status: None,
            account: Some(address.into()),
            amount: Some(Amount::flow(value)),
        }
    }

    /// A transfer leg as it was indexed from a sealed block
    pub fn completed(index: u64, network_index: u64, address: Address, value: i128) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier {
                index,
                network_index: Some(network_index),
            },
            status: Some(STATUS_COMPLETED.to_string()),
            ..Operation::transfer(index, address, value)
        }
    }
}

/// Public key used for verifying signatures
///
/// [API Spec](https://www.rosetta-api.org/docs/models/PublicKey.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicKey {
    /// Hex encoded public key bytes
    pub hex_bytes: String,
    /// Curve type associated with the key
    pub curve_type: String,
}

/// Signature containing the signing payload and signature bytes
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Signature.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Signature {
    /// Payload that was signed
    pub signing_payload: SigningPayload,
    /// Public key of the signer
    pub public_key: PublicKey,
    /// Type of the signature
    pub signature_type: String,
    /// Hex encoded `r || s` signature
    pub hex_bytes: String,
}

/// Signing payload to be signed by the payer
///
/// [API Spec](https://www.rosetta-api.org/docs/models/SigningPayload.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SigningPayload {
    /// Account that must produce the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<AccountIdentifier>,
    /// Hex encoded hash of the envelope message
    pub hex_bytes: String,
    /// Type of the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<String>,
}

/// A transaction as indexed on the chain
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Transaction.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Transaction {
    /// Transaction identifier
    pub transaction_identifier: TransactionIdentifier,
    /// Operations decoded from the token events of the transaction
    pub operations: Vec<Operation>,
}

/// Options returned by preprocess and passed on unchanged to metadata
///
/// The account is the proposer of the transaction, whose key sequence number metadata looks up.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConstructionOptions {
    #[serde(default)]
    pub account_identifier: AccountIdentifier,
}

/// Metadata returned by metadata and passed on unchanged to payloads
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConstructionMetadata {
    /// Reference block of the transaction, determining when it expires
    pub current_block_identifier: BlockIdentifier,
    /// Sequence number of the proposal key at the reference block
    pub sequence_number: u64,
}
