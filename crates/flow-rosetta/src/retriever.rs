// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Read path of the Data API
//!
//! The retriever validates identifiers, reads blocks and events from the [`Index`] and runs
//! balance scripts through the [`Invoker`].

use crate::{
    backend::{Index, Invoker},
    chain::{cadence::Value, Event, Identifier, Params},
    converter::{Conversion, Converter},
    error::ServiceResult,
    failure::{Description, Failure},
    scripts::Generator,
    types::{
        AccountIdentifier, Amount, Block, BlockIdentifier, Currency, Operation,
        PartialBlockIdentifier, Transaction, TransactionIdentifier,
    },
    validator::Validator,
};
use anyhow::anyhow;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default number of transactions returned inline with a block
pub const DEFAULT_TRANSACTION_LIMIT: usize = 200;

pub struct Retriever {
    params: Arc<Params>,
    index: Arc<dyn Index>,
    validator: Arc<Validator>,
    generator: Arc<dyn Generator>,
    invoker: Arc<dyn Invoker>,
    converter: Converter,
    transaction_limit: usize,
}

impl Retriever {
    pub fn new(
        params: Arc<Params>,
        index: Arc<dyn Index>,
        validator: Arc<Validator>,
        generator: Arc<dyn Generator>,
        invoker: Arc<dyn Invoker>,
        transaction_limit: usize,
    ) -> anyhow::Result<Self> {
        let converter = Converter::new(generator.as_ref())?;
        Ok(Retriever {
            params,
            index,
            validator,
            generator,
            invoker,
            converter,
            transaction_limit,
        })
    }

    /// First indexed block and its timestamp
    pub async fn oldest(&self) -> ServiceResult<(BlockIdentifier, u64)> {
        let first = self.index.first().await?;
        let header = self.index.header(first).await?;
        Ok((BlockIdentifier::from(&header), header.timestamp))
    }

    /// Last indexed block and its timestamp
    pub async fn current(&self) -> ServiceResult<(BlockIdentifier, u64)> {
        let last = self.index.last().await?;
        let header = self.index.header(last).await?;
        Ok((BlockIdentifier::from(&header), header.timestamp))
    }

    /// Balances of an account at the end of a block
    ///
    /// An empty currency list returns the balance of every configured token.
    pub async fn balances(
        &self,
        block: &PartialBlockIdentifier,
        account: &AccountIdentifier,
        currencies: &[Currency],
    ) -> ServiceResult<(BlockIdentifier, Vec<Amount>)> {
        let (height, block_id) = self.validator.block(block).await?;
        let address = self.validator.account(account)?;

        let currencies = if currencies.is_empty() {
            self.params
                .tokens
                .values()
                .map(|token| Currency {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                })
                .collect()
        } else {
            for currency in currencies {
                self.validator.currency(currency)?;
            }
            currencies.to_vec()
        };

        let mut balances = Vec::with_capacity(currencies.len());
        for currency in currencies {
            let script = self.generator.get_balance(&currency.symbol)?;
            let result = self
                .invoker
                .script(height, &script, &[Value::Address(address)])
                .await?;
            let Value::UFix64(balance) = result else {
                return Err(anyhow!("invalid balance type ({:?})", result).into());
            };
            balances.push(Amount {
                value: balance.atomic().to_string(),
                currency,
            });
        }

        Ok((BlockIdentifier::new(height, block_id), balances))
    }

    /// A block with its transactions, and the identifiers of the transactions above the limit
    pub async fn block(
        &self,
        block: &PartialBlockIdentifier,
    ) -> ServiceResult<(Block, Vec<TransactionIdentifier>)> {
        let (height, block_id) = self.validator.block(block).await?;
        let header = self.index.header(height).await?;

        // The first indexed block has no indexed parent, so it is its own parent
        let first = self.index.first().await?;
        let parent = if height == first {
            BlockIdentifier::new(height, block_id)
        } else {
            BlockIdentifier::new(height - 1, header.parent_id)
        };

        let transaction_ids = self.index.transactions_by_height(height).await?;
        let events = self.index.events(height, &self.converter.event_types()).await?;
        let mut events = events
            .into_iter()
            .into_group_map_by(|event| event.transaction_id);

        let mut transactions = Vec::new();
        let mut other_transactions = Vec::new();
        for (position, transaction_id) in transaction_ids.into_iter().enumerate() {
            if position >= self.transaction_limit {
                other_transactions.push(TransactionIdentifier::from(transaction_id));
                continue;
            }
            let events = events.remove(&transaction_id).unwrap_or_default();
            transactions.push(Transaction {
                transaction_identifier: transaction_id.into(),
                operations: self.operations(transaction_id, events)?,
            });
        }

        trace!(
            height,
            transactions = transactions.len(),
            other_transactions = other_transactions.len(),
            "retrieved block"
        );

        let block = Block {
            block_identifier: BlockIdentifier::new(height, block_id),
            parent_block_identifier: parent,
            timestamp: header.timestamp,
            transactions,
        };
        Ok((block, other_transactions))
    }

    /// A single transaction of a block
    pub async fn transaction(
        &self,
        block: &PartialBlockIdentifier,
        transaction: &TransactionIdentifier,
    ) -> ServiceResult<Transaction> {
        if block.index.is_none() {
            return Err(Failure::MissingField {
                description: Description::new("block identifier: index field is missing"),
                field: "index",
            }
            .into());
        }
        let (height, block_id) = self.validator.block(block).await?;
        let transaction_id = self.validator.transaction(transaction)?;

        let transaction_ids = self.index.transactions_by_height(height).await?;
        if !transaction_ids.contains(&transaction_id) {
            return Err(Failure::UnknownTransaction {
                description: Description::new("transaction not found in block")
                    .with("index", height)
                    .with("block", block_id.to_hex()),
                hash: transaction_id.to_hex(),
            }
            .into());
        }

        let events: Vec<Event> = self
            .index
            .events(height, &self.converter.event_types())
            .await?
            .into_iter()
            .filter(|event| event.transaction_id == transaction_id)
            .collect();

        Ok(Transaction {
            transaction_identifier: transaction_id.into(),
            operations: self.operations(transaction_id, events)?,
        })
    }

    /// Sequence number of an account key at a block
    pub async fn sequence(
        &self,
        block: &PartialBlockIdentifier,
        account: &AccountIdentifier,
        index: u32,
    ) -> ServiceResult<u64> {
        let (height, _) = self.validator.block(block).await?;
        let address = self.validator.account(account)?;
        let key = self.invoker.key(height, &address, index).await?;
        Ok(key.sequence_number)
    }

    /// Converts the token events of one transaction, in emission order
    fn operations(
        &self,
        transaction_id: Identifier,
        mut events: Vec<Event>,
    ) -> anyhow::Result<Vec<Operation>> {
        events.sort_by_key(|event| event.event_index);

        let mut operations = Vec::new();
        for event in &events {
            match self
                .converter
                .event_to_operation(operations.len() as u64, event)?
            {
                Conversion::Operation(operation) => operations.push(operation),
                Conversion::Skip(reason) => debug!(
                    transaction = %transaction_id,
                    event_index = event.event_index,
                    reason = ?reason,
                    "skipping event"
                ),
            }
        }
        Ok(operations)
    }
}

