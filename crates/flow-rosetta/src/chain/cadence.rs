// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! JSON-Cadence values
//!
//! Script arguments, script results and event payloads are exchanged with Flow as
//! `{"type": ..., "value": ...}` objects.  Only the types the adapter reads or writes are
//! modelled here.

use crate::chain::Address;
use anyhow::{anyhow, bail};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Number of decimal places of a `UFix64`
pub const UFIX64_DECIMALS: u32 = 8;
const UFIX64_FACTOR: u64 = 10u64.pow(UFIX64_DECIMALS);

/// A JSON-Cadence value
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Bool(bool),
    String(String),
    Address(#[serde(with = "address_literal")] Address),
    UFix64(UFix64),
    UInt64(#[serde(with = "u64_string")] u64),
    Optional(Option<Box<Value>>),
    Array(Vec<Value>),
    Event(Composite),
}

impl Value {
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Value> {
        serde_json::from_slice(bytes).map_err(|err| anyhow!("invalid JSON-Cadence value: {}", err))
    }

    pub fn to_json(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Unwraps optionals, returning `None` for a nil value
    pub fn into_inner(self) -> Option<Value> {
        match self {
            Value::Optional(inner) => inner.and_then(|value| value.into_inner()),
            value => Some(value),
        }
    }
}

/// The body of a Cadence event or struct
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Composite {
    pub id: String,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// Unsigned fixed point number with 8 decimals, stored in atomic units
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UFix64(pub u64);

impl UFix64 {
    pub fn atomic(&self) -> u64 {
        self.0
    }
}

impl Display for UFix64 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / UFIX64_FACTOR,
            self.0 % UFIX64_FACTOR
        )
    }
}

impl FromStr for UFix64 {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));
        if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid UFix64 integer part ({})", s);
        }
        if fraction.len() > UFIX64_DECIMALS as usize
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            bail!("invalid UFix64 fractional part ({})", s);
        }

        let integer: u64 = integer.parse()?;
        let padded = format!("{:0<width$}", fraction, width = UFIX64_DECIMALS as usize);
        let fraction: u64 = padded.parse()?;

        integer
            .checked_mul(UFIX64_FACTOR)
            .and_then(|value| value.checked_add(fraction))
            .map(UFix64)
            .ok_or_else(|| anyhow!("UFix64 overflow ({})", s))
    }
}

impl Serialize for UFix64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for UFix64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        UFix64::from_str(&value).map_err(D::Error::custom)
    }
}

mod address_literal {
    use crate::chain::Address;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_hex_literal())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let value = String::deserialize(deserializer)?;
        Address::from_hex(&value).map_err(D::Error::custom)
    }
}

mod u64_string {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ufix64_parsing() {
        assert_eq!(UFix64::from_str("5.0").unwrap(), UFix64(500_000_000));
        assert_eq!(UFix64::from_str("0.00000001").unwrap(), UFix64(1));
        assert_eq!(UFix64::from_str("42").unwrap(), UFix64(4_200_000_000));
        assert_eq!(UFix64(500_000_000).to_string(), "5.00000000");

        assert!(UFix64::from_str("0.000000001").is_err());
        assert!(UFix64::from_str("-1.0").is_err());
        assert!(UFix64::from_str(".5").is_err());
        assert!(UFix64::from_str("184467440737.09551616").is_err());
    }

    #[test]
    fn test_argument_encoding() {
        let amount = Value::UFix64(UFix64(500_000_000));
        assert_eq!(
            serde_json::to_value(&amount).unwrap(),
            json!({"type": "UFix64", "value": "5.00000000"})
        );

        let receiver = Value::Address(Address::from_hex("06909bc5ba14c266").unwrap());
        assert_eq!(
            serde_json::to_value(&receiver).unwrap(),
            json!({"type": "Address", "value": "0x06909bc5ba14c266"})
        );
    }

    #[test]
    fn test_event_decoding() {
        let payload = json!({
            "type": "Event",
            "value": {
                "id": "A.0ae53cb6e3f42a79.FlowToken.TokensWithdrawn",
                "fields": [
                    {"name": "amount", "value": {"type": "UFix64", "value": "5.00000000"}},
                    {"name": "from", "value": {"type": "Optional", "value": {"type": "Address", "value": "0xe2f72218abeec2b9"}}}
                ]
            }
        });
        let value = Value::from_json(payload.to_string().as_bytes()).unwrap();
        let Value::Event(event) = value else {
            panic!("expected an event");
        };
        assert_eq!(event.fields.len(), 2);
        assert_eq!(
            event.fields[1].value.clone().into_inner(),
            Some(Value::Address(Address::from_hex("e2f72218abeec2b9").unwrap()))
        );

        let nil = json!({"type": "Optional", "value": null});
        let value: Value = serde_json::from_value(nil).unwrap();
        assert_eq!(value.into_inner(), None);
    }
}
