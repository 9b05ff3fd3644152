// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! HTTP clients for the upstream services
//!
//! [`DpsClient`] reads the index and executes scripts against indexed state, [`AccessClient`]
//! submits transactions to an access node.  Both exchange JSON; identifiers, addresses and
//! payloads are hex encoded.

use crate::{
    backend::{Index, Invoker, Submitter},
    chain::{cadence::Value, AccountKey, Address, Event, Header, Identifier, Transaction},
};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client as ReqwestClient, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;
use tracing::trace;
use url::Url;

const JSON: &str = "application/json";

#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transaction_ids: Vec<Identifier>,
}

#[derive(Debug, Serialize)]
struct EventsRequest<'a> {
    height: u64,
    types: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    events: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct KeyRequest<'a> {
    height: u64,
    address: &'a Address,
    index: u32,
}

#[derive(Debug, Serialize)]
struct ScriptRequest<'a> {
    height: u64,
    #[serde(with = "hex::serde")]
    script: &'a [u8],
    arguments: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    result: Value,
}

#[derive(Debug, Serialize)]
struct SubmitRequest {
    transaction: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    transaction_id: Identifier,
}

/// Client for the index and execution API
#[derive(Debug, Clone)]
pub struct DpsClient {
    address: Url,
    inner: ReqwestClient,
}

impl DpsClient {
    pub fn new(address: Url) -> DpsClient {
        DpsClient {
            address,
            inner: ReqwestClient::new(),
        }
    }

    async fn make_get<O: DeserializeOwned>(&self, path: &str) -> anyhow::Result<O> {
        let response = self.inner.get(self.address.join(path)?).send().await?;
        parse_response(response).await
    }

    async fn make_call<'a, I: Serialize + Debug, O: DeserializeOwned>(
        &'a self,
        path: &'static str,
        request: &'a I,
    ) -> anyhow::Result<O> {
        post(&self.inner, &self.address, path, request).await
    }
}

#[async_trait]
impl Index for DpsClient {
    async fn first(&self) -> anyhow::Result<u64> {
        let response: HeightResponse = self.make_get("first").await?;
        Ok(response.height)
    }

    async fn last(&self) -> anyhow::Result<u64> {
        let response: HeightResponse = self.make_get("last").await?;
        Ok(response.height)
    }

    async fn header(&self, height: u64) -> anyhow::Result<Header> {
        self.make_get(&format!("headers/{}", height)).await
    }

    async fn height_for_block(&self, block_id: &Identifier) -> anyhow::Result<Option<u64>> {
        let url = self.address.join(&format!("blocks/{}/height", block_id))?;
        let response = self.inner.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response: HeightResponse = parse_response(response).await?;
        Ok(Some(response.height))
    }

    async fn transactions_by_height(&self, height: u64) -> anyhow::Result<Vec<Identifier>> {
        let response: TransactionsResponse =
            self.make_get(&format!("transactions/{}", height)).await?;
        Ok(response.transaction_ids)
    }

    async fn events(&self, height: u64, types: &[String]) -> anyhow::Result<Vec<Event>> {
        let response: EventsResponse = self
            .make_call("events", &EventsRequest { height, types })
            .await?;
        Ok(response.events)
    }
}

#[async_trait]
impl Invoker for DpsClient {
    async fn key(&self, height: u64, address: &Address, index: u32) -> anyhow::Result<AccountKey> {
        self.make_call("key", &KeyRequest {
            height,
            address,
            index,
        })
        .await
    }

    async fn script(
        &self,
        height: u64,
        script: &[u8],
        arguments: &[Value],
    ) -> anyhow::Result<Value> {
        let response: ScriptResponse = self
            .make_call("script", &ScriptRequest {
                height,
                script,
                arguments,
            })
            .await?;
        Ok(response.result)
    }
}

/// Client for the transaction API of an access node
#[derive(Debug, Clone)]
pub struct AccessClient {
    address: Url,
    inner: ReqwestClient,
}

impl AccessClient {
    pub fn new(address: Url) -> AccessClient {
        AccessClient {
            address,
            inner: ReqwestClient::new(),
        }
    }
}

#[async_trait]
impl Submitter for AccessClient {
    async fn transaction(&self, transaction: &Transaction) -> anyhow::Result<Identifier> {
        let request = SubmitRequest {
            transaction: transaction.encode()?,
        };
        let response: SubmitResponse =
            post(&self.inner, &self.address, "transactions", &request).await?;
        Ok(response.transaction_id)
    }
}

async fn post<I: Serialize + Debug, O: DeserializeOwned>(
    client: &ReqwestClient,
    address: &Url,
    path: &'static str,
    request: &I,
) -> anyhow::Result<O> {
    trace!(path, request = ?request, "upstream call");
    let response = client
        .post(address.join(path)?)
        .header(CONTENT_TYPE, JSON)
        .body(serde_json::to_string(request)?)
        .send()
        .await?;
    parse_response(response).await
}

async fn parse_response<O: DeserializeOwned>(response: Response) -> anyhow::Result<O> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("Failed API with: {} {}", status, body));
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{cadence::UFix64, ChainId, HashAlgorithm, SignatureAlgorithm};
    use httpmock::prelude::*;
    use serde_json::json;

    const BLOCK_ID: &str = "810c9d25535107ba8729b1f26af2552e63d7b38b1e4cb8c848498faea1354cbd";

    fn client(server: &MockServer) -> DpsClient {
        DpsClient::new(Url::parse(&server.base_url()).unwrap())
    }

    #[tokio::test]
    async fn test_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/headers/47");
                then.status(200).json_body(json!({
                    "chain_id": "flow-localnet",
                    "id": BLOCK_ID,
                    "parent_id": BLOCK_ID,
                    "height": 47,
                    "timestamp": 1_634_000_000_000u64,
                }));
            })
            .await;

        let header = client(&server).header(47).await.unwrap();
        mock.assert_async().await;
        assert_eq!(header.chain_id, ChainId::Localnet);
        assert_eq!(header.height, 47);
        assert_eq!(header.id.to_hex(), BLOCK_ID);
    }

    #[tokio::test]
    async fn test_unknown_block_height() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/blocks/{}/height", BLOCK_ID));
                then.status(404);
            })
            .await;

        let block_id = Identifier::from_hex(BLOCK_ID).unwrap();
        assert_eq!(client(&server).height_for_block(&block_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_script() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/script").json_body(json!({
                    "height": 47,
                    "script": hex::encode("pub fun main() {}"),
                    "arguments": [{"type": "Address", "value": "0xe2f72218abeec2b9"}],
                }));
                then.status(200)
                    .json_body(json!({"result": {"type": "UFix64", "value": "10.00000000"}}));
            })
            .await;

        let address = Address::from_hex("e2f72218abeec2b9").unwrap();
        let result = client(&server)
            .script(47, b"pub fun main() {}", &[Value::Address(address)])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(result, Value::UFix64(UFix64(1_000_000_000)));
    }

    #[tokio::test]
    async fn test_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/key")
                    .json_body(json!({"height": 47, "address": "e2f72218abeec2b9", "index": 0}));
                then.status(200).json_body(json!({
                    "index": 0,
                    "public_key": "ab".repeat(64),
                    "signature_algorithm": "ECDSA_P256",
                    "hash_algorithm": "SHA3_256",
                    "weight": 1000,
                    "sequence_number": 7,
                    "revoked": false,
                }));
            })
            .await;

        let address = Address::from_hex("e2f72218abeec2b9").unwrap();
        let key = client(&server).key(47, &address, 0).await.unwrap();
        assert_eq!(key.sequence_number, 7);
        assert_eq!(key.signature_algorithm, SignatureAlgorithm::EcdsaP256);
        assert_eq!(key.hash_algorithm, HashAlgorithm::Sha3_256);
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transactions");
                then.status(500).body("connection refused");
            })
            .await;

        let client = AccessClient::new(Url::parse(&server.base_url()).unwrap());
        let err = client
            .transaction(&Transaction::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
