// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Identifiers for the Rosetta API
//!
//! [Spec](https://www.rosetta-api.org/docs/api_identifiers.html)

use crate::{
    chain::{Address, Header, Identifier},
    BLOCKCHAIN,
};
use serde::{Deserialize, Serialize};

/// Account identifier, specified as a hex encoded Flow address (without leading 0x)
///
/// [API Spec](https://www.rosetta-api.org/docs/models/AccountIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountIdentifier {
    /// Hex encoded address, 16 characters
    #[serde(default)]
    pub address: String,
}

impl From<Address> for AccountIdentifier {
    fn from(address: Address) -> Self {
        AccountIdentifier {
            address: address.to_hex(),
        }
    }
}

/// Identifier of a block, its height and its ID
///
/// [API Spec](https://www.rosetta-api.org/docs/models/BlockIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockIdentifier {
    /// Height of the block
    pub index: u64,
    /// Hex encoded block ID
    pub hash: String,
}

impl BlockIdentifier {
    pub fn new(height: u64, id: Identifier) -> Self {
        BlockIdentifier {
            index: height,
            hash: id.to_hex(),
        }
    }
}

impl From<&Header> for BlockIdentifier {
    fn from(header: &Header) -> Self {
        BlockIdentifier::new(header.height, header.id)
    }
}

/// Partial block identifier for lookups, either field may be left out
///
/// [API Spec](https://www.rosetta-api.org/docs/models/PartialBlockIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PartialBlockIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PartialBlockIdentifier {
    pub fn by_height(height: u64) -> Self {
        PartialBlockIdentifier {
            index: Some(height),
            hash: None,
        }
    }

    pub fn by_hash(hash: impl Into<String>) -> Self {
        PartialBlockIdentifier {
            index: None,
            hash: Some(hash.into()),
        }
    }

    /// Whether neither the height nor the hash were provided
    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.hash.as_deref().map_or(true, str::is_empty)
    }
}

impl From<BlockIdentifier> for PartialBlockIdentifier {
    fn from(block: BlockIdentifier) -> Self {
        PartialBlockIdentifier {
            index: Some(block.index),
            hash: Some(block.hash),
        }
    }
}

/// Identifier of a network, always `flow` with the chain as the network
///
/// [API Spec](https://www.rosetta-api.org/docs/models/NetworkIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkIdentifier {
    #[serde(default)]
    pub blockchain: String,
    #[serde(default)]
    pub network: String,
}

impl NetworkIdentifier {
    pub fn new(network: impl Into<String>) -> Self {
        NetworkIdentifier {
            blockchain: BLOCKCHAIN.to_string(),
            network: network.into(),
        }
    }
}

/// Identifies an operation within a transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/models/OperationIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationIdentifier {
    /// Position of the operation within the transaction
    pub index: u64,
    /// Index of the underlying event on the chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<u64>,
}

/// Hex encoded Flow transaction ID
///
/// [API Spec](https://www.rosetta-api.org/docs/models/TransactionIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionIdentifier {
    #[serde(default)]
    pub hash: String,
}

impl From<Identifier> for TransactionIdentifier {
    fn from(id: Identifier) -> Self {
        TransactionIdentifier { hash: id.to_hex() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_block_identifier() {
        let empty: PartialBlockIdentifier = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
        assert!(PartialBlockIdentifier::by_hash("").is_empty());
        assert!(!PartialBlockIdentifier::by_height(0).is_empty());
        assert_eq!(
            serde_json::to_value(PartialBlockIdentifier::by_height(47)).unwrap(),
            json!({"index": 47})
        );
    }

    #[test]
    fn test_missing_network_fields_default_to_empty() {
        let network: NetworkIdentifier =
            serde_json::from_value(json!({"network": "flow-localnet"})).unwrap();
        assert_eq!(network.blockchain, "");
        assert_eq!(network.network, "flow-localnet");
    }
}
