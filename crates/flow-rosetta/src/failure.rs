// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Failure taxonomy
//!
//! Every way a request can be rejected is a [`Failure`] variant carrying the values needed to
//! explain it.  Format failures describe malformed requests, all other failures describe
//! requests that are well formed but invalid against the chain.

use crate::chain::Address;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Human readable explanation of a failure with additional ordered key/value context
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Description {
    pub text: String,
    pub fields: Vec<(&'static str, Value)>,
}

impl Description {
    pub fn new(text: impl Into<String>) -> Self {
        Description {
            text: text.into(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)?;
        if !self.fields.is_empty() {
            let fields: Vec<_> = self
                .fields
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect();
            write!(f, " ({})", fields.join(", "))?;
        }
        Ok(())
    }
}

fn addresses(list: &[Address]) -> String {
    list.iter()
        .map(Address::to_hex)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Failure {
    #[error("incomplete block identifier: {description}")]
    IncompleteBlock { description: Description },
    #[error("invalid block hash length (want: {want_length}, have: {have_length}): {description}")]
    InvalidBlockHash {
        description: Description,
        want_length: usize,
        have_length: usize,
    },
    #[error(
        "invalid account address length (want: {want_length}, have: {have_length}): {description}"
    )]
    InvalidAccountAddress {
        description: Description,
        want_length: usize,
        have_length: usize,
    },
    #[error(
        "invalid transaction hash length (want: {want_length}, have: {have_length}): {description}"
    )]
    InvalidTransactionHash {
        description: Description,
        want_length: usize,
        have_length: usize,
    },
    #[error("missing required field ({field}): {description}")]
    MissingField {
        description: Description,
        field: &'static str,
    },
    #[error("invalid blockchain (have: {have}, want: {want}): {description}")]
    InvalidBlockchain {
        description: Description,
        have: String,
        want: String,
    },
    #[error("invalid network (have: {have}, want: {want}): {description}")]
    InvalidNetwork {
        description: Description,
        have: String,
        want: String,
    },
    #[error("invalid block: {description}")]
    InvalidBlock { description: Description },
    #[error("unknown block (index: {index}, hash: {hash}): {description}")]
    UnknownBlock {
        description: Description,
        index: u64,
        hash: String,
    },
    #[error("invalid account (address: {address}): {description}")]
    InvalidAccount {
        description: Description,
        address: String,
    },
    #[error("invalid currency (symbol: {symbol}, decimals: {decimals}): {description}")]
    InvalidCurrency {
        description: Description,
        symbol: String,
        decimals: u32,
    },
    #[error("unknown currency (symbol: {symbol}, decimals: {decimals}): {description}")]
    UnknownCurrency {
        description: Description,
        symbol: String,
        decimals: u32,
    },
    #[error("invalid transaction (hash: {hash}): {description}")]
    InvalidTransaction {
        description: Description,
        hash: String,
    },
    #[error("unknown transaction (hash: {hash}): {description}")]
    UnknownTransaction {
        description: Description,
        hash: String,
    },
    #[error("invalid operations (have: {have}, want: {want}): {description}")]
    InvalidOperations {
        description: Description,
        have: usize,
        want: usize,
    },
    #[error("invalid transaction intent: {description}")]
    InvalidIntent { description: Description },
    #[error(
        "invalid transaction authorizers (have: [{}], want: [{}]): {description}",
        addresses(.have),
        addresses(.want)
    )]
    InvalidAuthorizers {
        description: Description,
        have: Vec<Address>,
        want: Vec<Address>,
    },
    #[error("invalid transaction payer (have: {have}, want: {want}): {description}")]
    InvalidPayer {
        description: Description,
        have: Address,
        want: Address,
    },
    #[error("invalid transaction proposer (have: {have}, want: {want}): {description}")]
    InvalidProposer {
        description: Description,
        have: Address,
        want: Address,
    },
    #[error("invalid transaction signature: {description}")]
    InvalidSignature { description: Description },
    #[error("invalid number of signatures (have: {have}, want: {want}): {description}")]
    InvalidSignatures {
        description: Description,
        have: usize,
        want: usize,
    },
    #[error("invalid account key (height: {height}, address: {address}, index: {index}): {description}")]
    InvalidKey {
        description: Description,
        height: u64,
        address: Address,
        index: u32,
    },
    #[error("invalid transaction script: {description}")]
    InvalidScript {
        description: Description,
        script: String,
    },
    #[error("invalid number of arguments (have: {have}, want: {want}): {description}")]
    InvalidArguments {
        description: Description,
        have: usize,
        want: usize,
    },
    #[error("invalid transaction amount (amount: {amount}): {description}")]
    InvalidAmount {
        description: Description,
        amount: String,
    },
    #[error("invalid transaction receiver (receiver: {receiver}): {description}")]
    InvalidReceiver {
        description: Description,
        receiver: String,
    },
    #[error("invalid transaction payload (encoding: {encoding}): {description}")]
    InvalidPayload {
        description: Description,
        encoding: String,
    },
}

impl Failure {
    pub fn description(&self) -> &Description {
        use Failure::*;
        match self {
            IncompleteBlock { description }
            | InvalidBlockHash { description, .. }
            | InvalidAccountAddress { description, .. }
            | InvalidTransactionHash { description, .. }
            | MissingField { description, .. }
            | InvalidBlockchain { description, .. }
            | InvalidNetwork { description, .. }
            | InvalidBlock { description }
            | UnknownBlock { description, .. }
            | InvalidAccount { description, .. }
            | InvalidCurrency { description, .. }
            | UnknownCurrency { description, .. }
            | InvalidTransaction { description, .. }
            | UnknownTransaction { description, .. }
            | InvalidOperations { description, .. }
            | InvalidIntent { description }
            | InvalidAuthorizers { description, .. }
            | InvalidPayer { description, .. }
            | InvalidProposer { description, .. }
            | InvalidSignature { description }
            | InvalidSignatures { description, .. }
            | InvalidKey { description, .. }
            | InvalidScript { description, .. }
            | InvalidArguments { description, .. }
            | InvalidAmount { description, .. }
            | InvalidReceiver { description, .. }
            | InvalidPayload { description, .. } => description,
        }
    }

    /// Machine readable details: the mismatched values followed by the description fields
    pub fn details(&self) -> Map<String, Value> {
        use Failure::*;
        let mut details = Map::new();
        let mut insert = |key: &str, value: Value| {
            details.insert(key.to_string(), value);
        };
        let hex_list =
            |list: &[Address]| Value::from(list.iter().map(Address::to_hex).collect::<Vec<_>>());

        match self {
            InvalidBlockHash {
                want_length,
                have_length,
                ..
            }
            | InvalidAccountAddress {
                want_length,
                have_length,
                ..
            }
            | InvalidTransactionHash {
                want_length,
                have_length,
                ..
            } => {
                insert("want_length", Value::from(*want_length));
                insert("have_length", Value::from(*have_length));
            },
            MissingField { field, .. } => insert("field", Value::from(*field)),
            InvalidBlockchain { have, want, .. } => {
                insert("have_blockchain", Value::from(have.as_str()));
                insert("want_blockchain", Value::from(want.as_str()));
            },
            InvalidNetwork { have, want, .. } => {
                insert("have_network", Value::from(have.as_str()));
                insert("want_network", Value::from(want.as_str()));
            },
            UnknownBlock { index, hash, .. } => {
                insert("index", Value::from(*index));
                insert("hash", Value::from(hash.as_str()));
            },
            InvalidAccount { address, .. } => insert("address", Value::from(address.as_str())),
            InvalidCurrency {
                symbol, decimals, ..
            }
            | UnknownCurrency {
                symbol, decimals, ..
            } => {
                insert("symbol", Value::from(symbol.as_str()));
                insert("decimals", Value::from(*decimals));
            },
            InvalidTransaction { hash, .. } | UnknownTransaction { hash, .. } => {
                insert("hash", Value::from(hash.as_str()))
            },
            InvalidOperations { have, want, .. } => {
                insert("have_operations", Value::from(*have));
                insert("want_operations", Value::from(*want));
            },
            InvalidAuthorizers { have, want, .. } => {
                insert("have_authorizers", hex_list(have));
                insert("want_authorizers", hex_list(want));
            },
            InvalidPayer { have, want, .. } => {
                insert("have_payer", Value::from(have.to_hex()));
                insert("want_payer", Value::from(want.to_hex()));
            },
            InvalidProposer { have, want, .. } => {
                insert("have_proposer", Value::from(have.to_hex()));
                insert("want_proposer", Value::from(want.to_hex()));
            },
            InvalidSignatures { have, want, .. } => {
                insert("have_signatures", Value::from(*have));
                insert("want_signatures", Value::from(*want));
            },
            InvalidKey {
                height,
                address,
                index,
                ..
            } => {
                insert("height", Value::from(*height));
                insert("account", Value::from(address.to_hex()));
                insert("index", Value::from(*index));
            },
            InvalidScript { script, .. } => insert("script", Value::from(script.as_str())),
            InvalidArguments { have, want, .. } => {
                insert("have_arguments", Value::from(*have));
                insert("want_arguments", Value::from(*want));
            },
            InvalidAmount { amount, .. } => insert("amount", Value::from(amount.as_str())),
            InvalidReceiver { receiver, .. } => {
                insert("receiver", Value::from(receiver.as_str()))
            },
            InvalidPayload { encoding, .. } => {
                insert("encoding", Value::from(encoding.as_str()))
            },
            IncompleteBlock { .. }
            | InvalidBlock { .. }
            | InvalidIntent { .. }
            | InvalidSignature { .. } => {},
        }

        for (key, value) in &self.description().fields {
            insert(key, value.clone());
        }
        details
    }
}
