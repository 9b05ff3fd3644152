// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    chain::{cadence::UFix64, Address},
    failure::{Description, Failure},
    transactor::Transactor,
    types::Operation,
    OPERATION_TRANSFER,
};

/// Gas limit of constructed transfers
pub const DEFAULT_GAS_LIMIT: u64 = 9999;

const TRANSFER_OPERATIONS: usize = 2;

/// What a transfer transaction does, independent of its encoding
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Intent {
    pub from: Address,
    pub to: Address,
    pub amount: UFix64,
    pub payer: Address,
    pub proposer: Address,
    pub gas_limit: u64,
}

impl Transactor {
    /// Derives the transfer described by a pair of operations
    pub fn derive_intent(&self, operations: &[Operation]) -> Result<Intent, Failure> {
        if operations.len() != TRANSFER_OPERATIONS {
            return Err(Failure::InvalidOperations {
                description: Description::new("transfer requires exactly two operations"),
                have: operations.len(),
                want: TRANSFER_OPERATIONS,
            });
        }

        for operation in operations {
            if operation.operation_type != OPERATION_TRANSFER {
                return Err(Failure::InvalidIntent {
                    description: Description::new("only transfer operations are supported")
                        .with("index", operation.operation_identifier.index)
                        .with("type", operation.operation_type.as_str()),
                });
            }
        }

        let mut addresses = [Address::ZERO; TRANSFER_OPERATIONS];
        for (address, operation) in addresses.iter_mut().zip(operations) {
            let account = operation.account.clone().unwrap_or_default();
            *address = self.validator.account(&account)?;
        }
        for amount in operations.iter().filter_map(|operation| operation.amount.as_ref()) {
            self.validator.currency(&amount.currency)?;
        }

        let mut values = [0i64; TRANSFER_OPERATIONS];
        for (value, operation) in values.iter_mut().zip(operations) {
            let amount = operation.amount.as_ref().ok_or_else(|| Failure::InvalidIntent {
                description: Description::new("operation amount is missing")
                    .with("index", operation.operation_identifier.index),
            })?;
            *value = amount.value.parse().map_err(|_| Failure::InvalidIntent {
                description: Description::new("operation amount is not a valid integer")
                    .with("index", operation.operation_identifier.index)
                    .with("amount", amount.value.as_str()),
            })?;
        }

        let [first, second] = values;
        if first.checked_neg() != Some(second) {
            return Err(Failure::InvalidIntent {
                description: Description::new("operation amounts do not cancel out")
                    .with("first_amount", first)
                    .with("second_amount", second),
            });
        }
        if first == 0 {
            return Err(Failure::InvalidIntent {
                description: Description::new("transfer amount is zero"),
            });
        }

        let (from, to, amount) = if first < 0 {
            (addresses[0], addresses[1], second)
        } else {
            (addresses[1], addresses[0], first)
        };

        Ok(Intent {
            from,
            to,
            amount: UFix64(amount.unsigned_abs()),
            payer: from,
            proposer: from,
            gas_limit: DEFAULT_GAS_LIMIT,
        })
    }
}
