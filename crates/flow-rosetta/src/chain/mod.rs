// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Flow chain model
//!
//! Native representations of the Flow objects the adapter reads from the index and writes to
//! the network.  Everything here is independent of the Rosetta schema.

use anyhow::{anyhow, bail};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

pub mod cadence;
pub mod crypto;
pub mod params;
pub mod transaction;

pub use crypto::{AccountKey, HashAlgorithm, SignatureAlgorithm};
pub use params::{ChainId, Params, Token};
pub use transaction::{ProposalKey, Transaction, TransactionSignature};

/// Length in bytes of a Flow account address
pub const ADDRESS_LENGTH: usize = 8;
/// Length in bytes of a Flow block or transaction identifier
pub const IDENTIFIER_LENGTH: usize = 32;

/// Strips an optional `0x` prefix from a hex string
pub fn strip_hex_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x").unwrap_or(hex)
}

/// A Flow account address
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        let hex = strip_hex_prefix(hex);
        if hex.len() != ADDRESS_LENGTH * 2 {
            bail!(
                "invalid address length (want: {}, have: {})",
                ADDRESS_LENGTH * 2,
                hex.len()
            );
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Address(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex with the `0x` prefix, as used by Cadence
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The address as a big-endian integer
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex = String::deserialize(deserializer)?;
            Address::from_hex(&hex).map_err(D::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Address)
        }
    }
}

/// A Flow block or transaction identifier
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    pub const ZERO: Identifier = Identifier([0u8; IDENTIFIER_LENGTH]);

    pub const fn new(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Identifier(bytes)
    }

    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        if hex.len() != IDENTIFIER_LENGTH * 2 {
            return Err(anyhow!(
                "invalid identifier length (want: {}, have: {})",
                IDENTIFIER_LENGTH * 2,
                hex.len()
            ));
        }
        let mut bytes = [0u8; IDENTIFIER_LENGTH];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Identifier(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let bytes: [u8; IDENTIFIER_LENGTH] = bytes
            .try_into()
            .map_err(|_| anyhow!("invalid identifier length {}", bytes.len()))?;
        Ok(Identifier(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Identifier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::from_hex(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex = String::deserialize(deserializer)?;
            Identifier::from_hex(&hex).map_err(D::Error::custom)
        } else {
            <[u8; IDENTIFIER_LENGTH]>::deserialize(deserializer).map(Identifier)
        }
    }
}

/// Header of an indexed block
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Header {
    pub chain_id: ChainId,
    pub id: Identifier,
    pub parent_id: Identifier,
    pub height: u64,
    /// Milliseconds since the UNIX epoch
    pub timestamp: u64,
}

/// An event emitted by a transaction, with its JSON-Cadence payload
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub transaction_id: Identifier,
    pub transaction_index: u32,
    pub event_index: u32,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let address = Address::from_hex("0xe2f72218abeec2b9").unwrap();
        assert_eq!(address.to_hex(), "e2f72218abeec2b9");
        assert_eq!(address.to_hex_literal(), "0xe2f72218abeec2b9");
        assert_eq!(address, Address::from_str("e2f72218abeec2b9").unwrap());

        assert!(Address::from_hex("e2f72218abeec2b").is_err());
        assert!(Address::from_hex("e2f72218abeec2bz").is_err());
    }

    #[test]
    fn test_identifier_serde() {
        let hex = "810c9d25535107ba8729b1f26af2552e63d7b38b1e4cb8c848498faea1354cbd";
        let id = Identifier::from_hex(hex).unwrap();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", hex));
        assert_eq!(serde_json::from_str::<Identifier>(&json).unwrap(), id);

        let bytes = bcs::to_bytes(&id).unwrap();
        assert_eq!(bytes.len(), IDENTIFIER_LENGTH);
        assert_eq!(bcs::from_bytes::<Identifier>(&bytes).unwrap(), id);
    }
}
