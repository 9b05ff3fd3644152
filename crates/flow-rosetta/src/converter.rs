// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Conversion of token events into Rosetta operations

use crate::{
    chain::{cadence::Value, Event},
    scripts::Generator,
    types::Operation,
    FLOW_SYMBOL,
};
use anyhow::{anyhow, bail};

/// Why an event produced no operation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The event is not a token deposit or withdrawal
    Unsupported,
    /// Tokens moved to or from a vault not stored in an account, e.g. during minting
    NoAddress,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Conversion {
    Operation(Operation),
    Skip(SkipReason),
}

/// Turns token deposit and withdrawal events into transfer operations
pub struct Converter {
    deposit_type: String,
    withdrawal_type: String,
}

impl Converter {
    pub fn new(generator: &dyn Generator) -> anyhow::Result<Self> {
        Ok(Converter {
            deposit_type: generator.tokens_deposited(FLOW_SYMBOL)?,
            withdrawal_type: generator.tokens_withdrawn(FLOW_SYMBOL)?,
        })
    }

    /// Event types the converter understands
    pub fn event_types(&self) -> Vec<String> {
        vec![self.deposit_type.clone(), self.withdrawal_type.clone()]
    }

    /// Converts an event, `index` is the position of the operation within its transaction
    pub fn event_to_operation(&self, index: u64, event: &Event) -> anyhow::Result<Conversion> {
        let withdrawal = if event.event_type == self.withdrawal_type {
            true
        } else if event.event_type == self.deposit_type {
            false
        } else {
            return Ok(Conversion::Skip(SkipReason::Unsupported));
        };

        let Value::Event(composite) = Value::from_json(&event.payload)? else {
            bail!("event payload is not an event ({})", event.event_type);
        };
        let [amount, account] = composite.fields.as_slice() else {
            bail!(
                "invalid number of event fields (have: {}, want: 2)",
                composite.fields.len()
            );
        };

        let Value::UFix64(amount) = &amount.value else {
            bail!("invalid amount field type ({:?})", amount.value);
        };
        let address = match account.value.clone().into_inner() {
            None => return Ok(Conversion::Skip(SkipReason::NoAddress)),
            Some(Value::Address(address)) => address,
            Some(other) => return Err(anyhow!("invalid account field type ({:?})", other)),
        };

        let mut value = i128::from(amount.atomic());
        if withdrawal {
            value = -value;
        }

        Ok(Conversion::Operation(Operation::completed(
            index,
            u64::from(event.event_index),
            address,
            value,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::{ChainId, Identifier, Params},
        scripts::ScriptGenerator,
        types::AccountIdentifier,
        STATUS_COMPLETED,
    };
    use serde_json::json;
    use std::sync::Arc;

    const WITHDRAWN: &str = "A.0ae53cb6e3f42a79.FlowToken.TokensWithdrawn";
    const DEPOSITED: &str = "A.0ae53cb6e3f42a79.FlowToken.TokensDeposited";

    fn converter() -> Converter {
        let generator = ScriptGenerator::new(Arc::new(Params::for_chain(ChainId::Localnet))).unwrap();
        Converter::new(&generator).unwrap()
    }

    fn event(event_type: &str, payload: serde_json::Value) -> Event {
        Event {
            event_type: event_type.to_string(),
            transaction_id: Identifier::new([1u8; 32]),
            transaction_index: 0,
            event_index: 3,
            payload: payload.to_string().into_bytes(),
        }
    }

    fn payload(id: &str, account: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "Event",
            "value": {
                "id": id,
                "fields": [
                    {"name": "amount", "value": {"type": "UFix64", "value": "5.00000000"}},
                    {"name": "from", "value": {"type": "Optional", "value": account}},
                ]
            }
        })
    }

    #[test]
    fn test_withdrawal_is_negative() {
        let event = event(
            WITHDRAWN,
            payload(
                WITHDRAWN,
                json!({"type": "Address", "value": "0xe2f72218abeec2b9"}),
            ),
        );
        let Conversion::Operation(operation) = converter().event_to_operation(0, &event).unwrap()
        else {
            panic!("expected an operation");
        };

        assert_eq!(operation.operation_identifier.index, 0);
        assert_eq!(operation.operation_identifier.network_index, Some(3));
        assert_eq!(operation.status.as_deref(), Some(STATUS_COMPLETED));
        assert_eq!(
            operation.account,
            Some(AccountIdentifier {
                address: "e2f72218abeec2b9".to_string()
            })
        );
        assert_eq!(operation.amount.unwrap().value, "-500000000");
    }

    #[test]
    fn test_deposit_is_positive() {
        let event = event(
            DEPOSITED,
            payload(
                DEPOSITED,
                json!({"type": "Address", "value": "0x06909bc5ba14c266"}),
            ),
        );
        let Conversion::Operation(operation) = converter().event_to_operation(1, &event).unwrap()
        else {
            panic!("expected an operation");
        };
        assert_eq!(operation.amount.unwrap().value, "500000000");
    }

    #[test]
    fn test_skipped_events() {
        let converter = converter();

        let minted = event(DEPOSITED, payload(DEPOSITED, json!(null)));
        assert_eq!(
            converter.event_to_operation(0, &minted).unwrap(),
            Conversion::Skip(SkipReason::NoAddress)
        );

        let other = event("A.1654653399040a61.FlowFees.FeesDeducted", json!({}));
        assert_eq!(
            converter.event_to_operation(0, &other).unwrap(),
            Conversion::Skip(SkipReason::Unsupported)
        );
    }

    #[test]
    fn test_malformed_events() {
        let converter = converter();

        let not_json = Event {
            payload: b"{".to_vec(),
            ..event(DEPOSITED, json!({}))
        };
        assert!(converter.event_to_operation(0, &not_json).is_err());

        let missing_field = event(
            DEPOSITED,
            json!({
                "type": "Event",
                "value": {
                    "id": DEPOSITED,
                    "fields": [{"name": "amount", "value": {"type": "UFix64", "value": "1.0"}}]
                }
            }),
        );
        assert!(converter.event_to_operation(0, &missing_field).is_err());
    }
}
