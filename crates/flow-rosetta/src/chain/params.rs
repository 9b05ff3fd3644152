// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{chain::Address, FLOW_DECIMALS, FLOW_SYMBOL};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

/// The Flow networks the server can be attached to
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChainId {
    Mainnet,
    Testnet,
    Emulator,
    Localnet,
}

/// Columns of the parity-check matrix of the [64, 45] linear code Flow derives addresses from
const PARITY_CHECK_COLUMNS: [u32; 64] = [
    0x00001, 0x00002, 0x00004, 0x00008, 0x00010, 0x00020, 0x00040, 0x00080, 0x00100, 0x00200,
    0x00400, 0x00800, 0x01000, 0x02000, 0x04000, 0x08000, 0x10000, 0x20000, 0x40000, 0x7328d,
    0x6689a, 0x6112f, 0x6084b, 0x433fd, 0x42aab, 0x41951, 0x233ce, 0x22a81, 0x21948, 0x1ef60,
    0x1deca, 0x1c639, 0x1bdd8, 0x1a535, 0x194ac, 0x18c46, 0x1632b, 0x1529b, 0x14a43, 0x13184,
    0x12942, 0x118c1, 0x0f812, 0x0e027, 0x0d00e, 0x0c83c, 0x0b01d, 0x0a831, 0x0982b, 0x07034,
    0x0682a, 0x05819, 0x03807, 0x007d2, 0x00727, 0x0068e, 0x0067c, 0x0059d, 0x004eb, 0x003b4,
    0x0036a, 0x002d9, 0x001c7, 0x0003f,
];

impl ChainId {
    const EMULATOR: &'static str = "flow-emulator";
    const LOCALNET: &'static str = "flow-localnet";
    const MAINNET: &'static str = "flow-mainnet";
    const TESTNET: &'static str = "flow-testnet";

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Mainnet => Self::MAINNET,
            ChainId::Testnet => Self::TESTNET,
            ChainId::Emulator => Self::EMULATOR,
            ChainId::Localnet => Self::LOCALNET,
        }
    }

    /// Offset applied to every code word of the chain, so an address is valid on one chain only
    fn code_word(&self) -> u64 {
        match self {
            ChainId::Mainnet => 0,
            ChainId::Testnet => 0x6834_ba37_b398_0209,
            ChainId::Emulator | ChainId::Localnet => 0x1cb1_5985_7af0_2018,
        }
    }

    /// Checks that an address was generated for this chain
    ///
    /// The zero address of every chain is rejected.
    pub fn is_valid_address(&self, address: &Address) -> bool {
        let code_word = address.to_u64() ^ self.code_word();
        if code_word == 0 {
            return false;
        }
        let parity = PARITY_CHECK_COLUMNS
            .iter()
            .enumerate()
            .filter(|(bit, _)| (code_word >> bit) & 1 == 1)
            .fold(0, |parity, (_, column)| parity ^ column);
        parity == 0
    }
}

impl FromStr for ChainId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            Self::MAINNET => Ok(ChainId::Mainnet),
            Self::TESTNET => Ok(ChainId::Testnet),
            Self::EMULATOR => Ok(ChainId::Emulator),
            Self::LOCALNET => Ok(ChainId::Localnet),
            _ => Err(anyhow!("unknown chain ID {}", s)),
        }
    }
}

impl TryFrom<String> for ChainId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChainId::from_str(&value)
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.as_str().to_string()
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fungible token deployed on the chain, as rendered into Cadence templates
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Token {
    pub symbol: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub address: Address,
    /// Public path of the balance capability
    pub balance: String,
    /// Public path of the receiver capability
    pub receiver: String,
    /// Storage path of the vault
    pub vault: String,
    pub decimals: u32,
}

/// Chain specific contract locations
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Params {
    pub chain_id: ChainId,
    pub fungible_token: Address,
    pub tokens: BTreeMap<String, Token>,
}

impl Params {
    pub fn for_chain(chain_id: ChainId) -> Params {
        let (fungible_token, flow_token) = match chain_id {
            ChainId::Mainnet => (
                Address::new([0xf2, 0x33, 0xdc, 0xee, 0x88, 0xfe, 0x0a, 0xbe]),
                Address::new([0x16, 0x54, 0x65, 0x33, 0x99, 0x04, 0x0a, 0x61]),
            ),
            ChainId::Testnet => (
                Address::new([0x9a, 0x07, 0x66, 0xd9, 0x3b, 0x66, 0x08, 0xb7]),
                Address::new([0x7e, 0x60, 0xdf, 0x04, 0x2a, 0x9c, 0x08, 0x68]),
            ),
            ChainId::Emulator | ChainId::Localnet => (
                Address::new([0xee, 0x82, 0x85, 0x6b, 0xf2, 0x0e, 0x2a, 0xa6]),
                Address::new([0x0a, 0xe5, 0x3c, 0xb6, 0xe3, 0xf4, 0x2a, 0x79]),
            ),
        };

        let flow = Token {
            symbol: FLOW_SYMBOL.to_string(),
            type_name: "FlowToken".to_string(),
            address: flow_token,
            balance: "/public/flowTokenBalance".to_string(),
            receiver: "/public/flowTokenReceiver".to_string(),
            vault: "/storage/flowTokenVault".to_string(),
            decimals: FLOW_DECIMALS,
        };

        let mut tokens = BTreeMap::new();
        tokens.insert(flow.symbol.clone(), flow);

        Params {
            chain_id,
            fungible_token,
            tokens,
        }
    }

    pub fn token(&self, symbol: &str) -> Option<&Token> {
        self.tokens.get(symbol)
    }
}
