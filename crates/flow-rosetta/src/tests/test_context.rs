// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    backend::{Index, Invoker, Submitter},
    chain::{
        cadence::{UFix64, Value as CadenceValue},
        AccountKey, Address, ChainId, Event, HashAlgorithm, Header, Identifier, Params,
        SignatureAlgorithm, Transaction,
    },
    config::RosettaConfig,
    routes,
    transactor::Transactor,
    RosettaContext,
};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use p256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use std::sync::Arc;
use warp::{
    http::{header::CONTENT_TYPE, Response},
    hyper::body::Bytes,
};

pub const SENDER: &str = "e2f72218abeec2b9";
pub const RECEIVER: &str = "06909bc5ba14c266";
pub const NETWORK: &str = "flow-localnet";

pub const FIRST_HEIGHT: u64 = 10;
pub const LAST_HEIGHT: u64 = 173;
/// Height of the only block moving tokens
pub const TRANSFER_HEIGHT: u64 = 47;
pub const SEQUENCE_NUMBER: u64 = 7;

/// Balance of the sender before and after the transfer, in atomic units
pub const BALANCE_BEFORE: u64 = 1_000_000_000;
pub const BALANCE_AFTER: u64 = 500_000_000;
pub const TRANSFER_AMOUNT: u64 = 500_000_000;

const GENESIS_TIMESTAMP: u64 = 1_634_000_000_000;
const WITHDRAWN: &str = "A.0ae53cb6e3f42a79.FlowToken.TokensWithdrawn";
const DEPOSITED: &str = "A.0ae53cb6e3f42a79.FlowToken.TokensDeposited";

pub fn block_id(height: u64) -> Identifier {
    Identifier::from_slice(&Sha3_256::digest(&height.to_be_bytes())).unwrap()
}

/// The transfer of [`TRANSFER_HEIGHT`]
pub fn transfer_transaction_id() -> Identifier {
    Identifier::new([0x11; 32])
}

/// A transaction of [`TRANSFER_HEIGHT`] which moves no tokens
pub fn other_transaction_id() -> Identifier {
    Identifier::new([0x22; 32])
}

pub fn signing_key() -> SigningKey {
    // A fixed non-zero scalar below the curve order
    SigningKey::from_slice(&[7u8; 32]).unwrap()
}

fn token_event(event_type: &str, field: &str, address: &str, event_index: u32) -> Event {
    let payload = json!({
        "type": "Event",
        "value": {
            "id": event_type,
            "fields": [
                {"name": "amount", "value": {"type": "UFix64", "value": UFix64(TRANSFER_AMOUNT).to_string()}},
                {"name": field, "value": {"type": "Optional", "value": {"type": "Address", "value": format!("0x{}", address)}}},
            ]
        }
    });
    Event {
        event_type: event_type.to_string(),
        transaction_id: transfer_transaction_id(),
        transaction_index: 0,
        event_index,
        payload: payload.to_string().into_bytes(),
    }
}

/// Index of a localnet chain with a single transfer from [`SENDER`] to [`RECEIVER`]
pub struct MemoryIndex {
    last: u64,
}

#[async_trait]
impl Index for MemoryIndex {
    async fn first(&self) -> anyhow::Result<u64> {
        Ok(FIRST_HEIGHT)
    }

    async fn last(&self) -> anyhow::Result<u64> {
        Ok(self.last)
    }

    async fn header(&self, height: u64) -> anyhow::Result<Header> {
        if !(FIRST_HEIGHT..=self.last).contains(&height) {
            bail!("height {} not indexed", height);
        }
        Ok(Header {
            chain_id: ChainId::Localnet,
            id: block_id(height),
            parent_id: block_id(height.saturating_sub(1)),
            height,
            timestamp: GENESIS_TIMESTAMP + height * 1000,
        })
    }

    async fn height_for_block(&self, id: &Identifier) -> anyhow::Result<Option<u64>> {
        Ok((FIRST_HEIGHT..=self.last).find(|height| block_id(*height) == *id))
    }

    async fn transactions_by_height(&self, height: u64) -> anyhow::Result<Vec<Identifier>> {
        if height == TRANSFER_HEIGHT {
            Ok(vec![transfer_transaction_id(), other_transaction_id()])
        } else {
            Ok(vec![])
        }
    }

    async fn events(&self, height: u64, types: &[String]) -> anyhow::Result<Vec<Event>> {
        if height != TRANSFER_HEIGHT {
            return Ok(vec![]);
        }
        // Emitted out of order to check operations follow the event index
        let events = vec![
            token_event(DEPOSITED, "to", RECEIVER, 1),
            token_event(WITHDRAWN, "from", SENDER, 0),
        ];
        Ok(events
            .into_iter()
            .filter(|event| types.contains(&event.event_type))
            .collect())
    }
}

/// Executes against the state of [`MemoryIndex`], every account holds the same key
pub struct MemoryInvoker {
    key: AccountKey,
}

impl MemoryInvoker {
    pub fn new() -> Self {
        let point = signing_key().verifying_key().to_encoded_point(false);
        MemoryInvoker {
            key: AccountKey {
                index: 0,
                public_key: point.as_bytes()[1..].to_vec(),
                signature_algorithm: SignatureAlgorithm::EcdsaP256,
                hash_algorithm: HashAlgorithm::Sha3_256,
                weight: 1000,
                sequence_number: SEQUENCE_NUMBER,
                revoked: false,
            },
        }
    }
}

#[async_trait]
impl Invoker for MemoryInvoker {
    async fn key(&self, _height: u64, _address: &Address, index: u32) -> anyhow::Result<AccountKey> {
        if index != self.key.index {
            bail!("account key {} not found", index);
        }
        Ok(self.key.clone())
    }

    async fn script(
        &self,
        height: u64,
        _script: &[u8],
        arguments: &[CadenceValue],
    ) -> anyhow::Result<CadenceValue> {
        let [CadenceValue::Address(address)] = arguments else {
            return Err(anyhow!("unexpected script arguments {:?}", arguments));
        };
        let balance = match address.to_hex().as_str() {
            SENDER if height < TRANSFER_HEIGHT => BALANCE_BEFORE,
            SENDER => BALANCE_AFTER,
            RECEIVER if height < TRANSFER_HEIGHT => 0,
            RECEIVER => TRANSFER_AMOUNT,
            _ => 0,
        };
        Ok(CadenceValue::UFix64(UFix64(balance)))
    }
}

/// Accepts every transaction under its canonical identifier
pub struct MemorySubmitter;

#[async_trait]
impl Submitter for MemorySubmitter {
    async fn transaction(&self, transaction: &Transaction) -> anyhow::Result<Identifier> {
        transaction.id()
    }
}

pub fn test_config() -> RosettaConfig {
    serde_yaml::from_str(
        "dps_api_url: http://127.0.0.1:5005/\naccess_api_url: http://127.0.0.1:9000/\nsmart_status_codes: true\n",
    )
    .unwrap()
}

pub fn new_test_context() -> TestContext {
    new_test_context_with_config(test_config())
}

pub fn new_test_context_with_config(config: RosettaConfig) -> TestContext {
    new_test_context_with(config, LAST_HEIGHT)
}

/// Context over an index which has grown to `last_height`
pub fn new_test_context_with_last_height(last_height: u64) -> TestContext {
    new_test_context_with(test_config(), last_height)
}

fn new_test_context_with(config: RosettaConfig, last_height: u64) -> TestContext {
    let context = RosettaContext::new(
        Params::for_chain(ChainId::Localnet),
        Arc::new(MemoryIndex { last: last_height }),
        Arc::new(MemoryInvoker::new()),
        Arc::new(MemorySubmitter),
        &config,
    )
    .unwrap();
    TestContext::new(config, context)
}

#[derive(Clone)]
pub struct TestContext {
    #[allow(dead_code)]
    pub config: RosettaConfig,
    expect_status_code: u16,
    pub inner: RosettaContext,
}

impl TestContext {
    pub fn new(config: RosettaConfig, context: RosettaContext) -> Self {
        Self {
            config,
            expect_status_code: 200,
            inner: context,
        }
    }

    pub fn transactor(&self) -> &Transactor {
        &self.inner.transactor
    }

    pub fn expect_status_code(&self, status_code: u16) -> Self {
        let mut ret = self.clone();
        ret.expect_status_code = status_code;
        ret
    }

    /// Signs a hex encoded payload with the key every test account holds
    pub fn sign(&self, payload: &str) -> String {
        let digest = hex::decode(payload).unwrap();
        let signature: Signature = signing_key().sign_prehash(&digest).unwrap();
        hex::encode(signature.to_bytes())
    }

    /// SEC1 encoded public key of [`TestContext::sign`]
    pub fn public_key(&self) -> String {
        hex::encode(signing_key().verifying_key().to_encoded_point(false).as_bytes())
    }

    pub async fn post(&self, path: &str, body: Value) -> Value {
        self.execute(
            warp::test::request()
                .method("POST")
                .path(path)
                .json(&body),
        )
        .await
    }

    pub async fn reply(&self, req: warp::test::RequestBuilder) -> Response<Bytes> {
        req.reply(&routes(self.inner.clone())).await
    }

    pub async fn execute(&self, req: warp::test::RequestBuilder) -> Value {
        let resp = self.reply(req).await;

        let headers = resp.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let body = serde_json::from_slice(resp.body()).expect("response body is JSON");
        assert_eq!(
            self.expect_status_code,
            resp.status(),
            "\nresponse: {}",
            pretty(&body)
        );

        body
    }
}

pub fn network_identifier() -> Value {
    json!({"blockchain": "flow", "network": NETWORK})
}

pub fn pretty(val: &Value) -> String {
    serde_json::to_string_pretty(val).unwrap() + "\n"
}
