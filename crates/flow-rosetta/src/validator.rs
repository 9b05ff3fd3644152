// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Validation of Rosetta identifiers against the chain configuration and the index
//!
//! Malformed identifiers produce format failures, well formed identifiers which do not match
//! the chain produce semantic failures.

use crate::{
    backend::Index,
    chain::{strip_hex_prefix, Address, Identifier, Params, ADDRESS_LENGTH, IDENTIFIER_LENGTH},
    error::{ServiceError, ServiceResult},
    failure::{Description, Failure},
    types::{
        AccountIdentifier, BlockIdentifier, Currency, NetworkIdentifier, PartialBlockIdentifier,
        TransactionIdentifier,
    },
    BLOCKCHAIN,
};
use std::sync::Arc;
use tracing::trace;

/// Number of blocks after which a reference block is too old to build a transaction on
pub const REFERENCE_BLOCK_EXPIRY: u64 = 600;

const HEX_LENGTH_ADDRESS: usize = ADDRESS_LENGTH * 2;
const HEX_LENGTH_IDENTIFIER: usize = IDENTIFIER_LENGTH * 2;

pub struct Validator {
    params: Arc<Params>,
    index: Arc<dyn Index>,
}

impl Validator {
    pub fn new(params: Arc<Params>, index: Arc<dyn Index>) -> Self {
        Validator { params, index }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The identifier this server answers for
    pub fn network_identifier(&self) -> NetworkIdentifier {
        NetworkIdentifier::new(self.params.chain_id.as_str())
    }

    /// Checks the request targets this blockchain and network
    pub fn network(&self, network: &NetworkIdentifier) -> Result<(), Failure> {
        if network.blockchain.is_empty() {
            return Err(Failure::MissingField {
                description: Description::new("blockchain identifier: blockchain field is empty"),
                field: "blockchain",
            });
        }
        if network.network.is_empty() {
            return Err(Failure::MissingField {
                description: Description::new("blockchain identifier: network field is empty"),
                field: "network",
            });
        }
        if network.blockchain != BLOCKCHAIN {
            return Err(Failure::InvalidBlockchain {
                description: Description::new("invalid blockchain identifier"),
                have: network.blockchain.clone(),
                want: BLOCKCHAIN.to_string(),
            });
        }
        let want = self.params.chain_id.as_str();
        if network.network != want {
            return Err(Failure::InvalidNetwork {
                description: Description::new("invalid network identifier"),
                have: network.network.clone(),
                want: want.to_string(),
            });
        }
        Ok(())
    }

    /// Resolves a block identifier to the height and ID of an indexed block
    pub async fn block(&self, block: &PartialBlockIdentifier) -> ServiceResult<(u64, Identifier)> {
        trace!(block = ?block, "validating block identifier");
        let hash = block.hash.as_deref().filter(|hash| !hash.is_empty());

        let block_id = match hash {
            Some(hash) => Some(parse_block_hash(hash)?),
            None => None,
        };

        let height = match (block.index, block_id) {
            (Some(height), _) => height,
            (None, Some(block_id)) => match self.index.height_for_block(&block_id).await? {
                Some(height) => height,
                None => {
                    return Err(Failure::UnknownBlock {
                        description: Description::new("block hash has not been indexed"),
                        index: 0,
                        hash: block_id.to_hex(),
                    }
                    .into())
                },
            },
            (None, None) => {
                return Err(Failure::IncompleteBlock {
                    description: Description::new(
                        "block identifier: at least one of hash or index is required",
                    ),
                }
                .into())
            },
        };

        let first = self.index.first().await?;
        if height < first {
            return Err(Failure::UnknownBlock {
                description: Description::new("block index is below first indexed height")
                    .with("first_index", first),
                index: height,
                hash: hash.unwrap_or_default().to_string(),
            }
            .into());
        }
        let last = self.index.last().await?;
        if height > last {
            return Err(Failure::UnknownBlock {
                description: Description::new("block index is above last indexed height")
                    .with("last_index", last),
                index: height,
                hash: hash.unwrap_or_default().to_string(),
            }
            .into());
        }

        let header = self.index.header(height).await?;
        if let Some(block_id) = block_id {
            if header.id != block_id {
                return Err(Failure::InvalidBlock {
                    description: Description::new("block hash does not match known hash for height")
                        .with("index", height)
                        .with("have_hash", block_id.to_hex())
                        .with("want_hash", header.id.to_hex()),
                }
                .into());
            }
        }

        Ok((height, header.id))
    }

    /// Resolves the reference block of a transaction, rejecting blocks too old to build on
    pub async fn reference_block(&self, block: &BlockIdentifier) -> ServiceResult<(u64, Identifier)> {
        let (height, block_id) = self.block(&block.clone().into()).await?;
        let last = self.index.last().await?;
        if last.saturating_sub(height) > REFERENCE_BLOCK_EXPIRY {
            return Err(Failure::InvalidBlock {
                description: Description::new("reference block has expired")
                    .with("index", height)
                    .with("last_index", last)
                    .with("expiry", REFERENCE_BLOCK_EXPIRY),
            }
            .into());
        }
        Ok((height, block_id))
    }

    pub fn account(&self, account: &AccountIdentifier) -> Result<Address, Failure> {
        let hex = strip_hex_prefix(&account.address);
        if hex.len() != HEX_LENGTH_ADDRESS {
            return Err(Failure::InvalidAccountAddress {
                description: Description::new("account address has wrong length"),
                want_length: HEX_LENGTH_ADDRESS,
                have_length: hex.len(),
            });
        }
        let address = Address::from_hex(hex).map_err(|err| Failure::InvalidAccount {
            description: Description::new("account address is not a valid hex-encoded string")
                .with("error", err.to_string()),
            address: account.address.clone(),
        })?;
        if !self.params.chain_id.is_valid_address(&address) {
            return Err(Failure::InvalidAccount {
                description: Description::new("account address is not valid for chain")
                    .with("chain", self.params.chain_id.as_str()),
                address: account.address.clone(),
            });
        }
        Ok(address)
    }

    pub fn currency(&self, currency: &Currency) -> Result<(), Failure> {
        let token = self
            .params
            .token(&currency.symbol)
            .ok_or_else(|| Failure::UnknownCurrency {
                description: Description::new("currency symbol has not been configured"),
                symbol: currency.symbol.clone(),
                decimals: currency.decimals,
            })?;
        if token.decimals != currency.decimals {
            return Err(Failure::InvalidCurrency {
                description: Description::new("currency decimals do not match configuration")
                    .with("want_decimals", token.decimals),
                symbol: currency.symbol.clone(),
                decimals: currency.decimals,
            });
        }
        Ok(())
    }

    pub fn transaction(&self, transaction: &TransactionIdentifier) -> Result<Identifier, Failure> {
        if transaction.hash.len() != HEX_LENGTH_IDENTIFIER {
            return Err(Failure::InvalidTransactionHash {
                description: Description::new("transaction hash has wrong length"),
                want_length: HEX_LENGTH_IDENTIFIER,
                have_length: transaction.hash.len(),
            });
        }
        Identifier::from_hex(&transaction.hash).map_err(|err| Failure::InvalidTransaction {
            description: Description::new("transaction hash is not a valid hex-encoded string")
                .with("error", err.to_string()),
            hash: transaction.hash.clone(),
        })
    }
}

fn parse_block_hash(hash: &str) -> Result<Identifier, ServiceError> {
    if hash.len() != HEX_LENGTH_IDENTIFIER {
        return Err(Failure::InvalidBlockHash {
            description: Description::new("block hash has wrong length"),
            want_length: HEX_LENGTH_IDENTIFIER,
            have_length: hash.len(),
        }
        .into());
    }
    Identifier::from_hex(hash).map_err(|err| {
        Failure::InvalidBlock {
            description: Description::new("block hash is not a valid hex-encoded string")
                .with("error", err.to_string()),
        }
        .into()
    })
}
