// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Capabilities the adapter consumes from the chain
//!
//! Implemented by the upstream HTTP clients in [`crate::client`], and by in-memory doubles in
//! tests.

use crate::chain::{cadence::Value, AccountKey, Address, Event, Header, Identifier, Transaction};
use async_trait::async_trait;

/// Read access to the indexed chain
#[async_trait]
pub trait Index: Send + Sync {
    /// Height of the first indexed block
    async fn first(&self) -> anyhow::Result<u64>;

    /// Height of the last indexed block
    async fn last(&self) -> anyhow::Result<u64>;

    async fn header(&self, height: u64) -> anyhow::Result<Header>;

    /// Height of the block with the given ID, `None` if it was never indexed
    async fn height_for_block(&self, block_id: &Identifier) -> anyhow::Result<Option<u64>>;

    /// IDs of the transactions of a block, in execution order
    async fn transactions_by_height(&self, height: u64) -> anyhow::Result<Vec<Identifier>>;

    /// Events of a block, restricted to the given types
    async fn events(&self, height: u64, types: &[String]) -> anyhow::Result<Vec<Event>>;
}

/// Execution against the state at a given height
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Public key of an account at the given key index
    async fn key(&self, height: u64, address: &Address, index: u32) -> anyhow::Result<AccountKey>;

    async fn script(
        &self,
        height: u64,
        script: &[u8],
        arguments: &[Value],
    ) -> anyhow::Result<Value>;
}

/// Broadcasts signed transactions to the network
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Returns the identifier the network assigned to the transaction
    async fn transaction(&self, transaction: &Transaction) -> anyhow::Result<Identifier>;
}
