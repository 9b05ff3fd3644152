// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    chain::{cadence::Value as CadenceValue, Address, Transaction},
    transactor::decode_transaction,
    tests::test_context::{
        block_id, network_identifier, new_test_context, new_test_context_with_last_height,
        TestContext, LAST_HEIGHT, RECEIVER, SENDER, SEQUENCE_NUMBER,
    },
};
use serde_json::{json, Value};

const AMOUNT: i128 = 500_000_000;

fn transfer_operations(amount: i128) -> Value {
    json!([
        {
            "operation_identifier": {"index": 0},
            "type": "TRANSFER",
            "account": {"address": SENDER},
            "amount": {"value": (-amount).to_string(), "currency": {"symbol": "FLOW", "decimals": 8}},
        },
        {
            "operation_identifier": {"index": 1},
            "type": "TRANSFER",
            "account": {"address": RECEIVER},
            "amount": {"value": amount.to_string(), "currency": {"symbol": "FLOW", "decimals": 8}},
        },
    ])
}

fn signature(context: &TestContext, payload: &Value, signature: String) -> Value {
    json!({
        "signing_payload": payload,
        "public_key": {"hex_bytes": context.public_key(), "curve_type": "secp256r1"},
        "signature_type": "ecdsa",
        "hex_bytes": signature,
    })
}

/// Runs preprocess, metadata and payloads, returning the unsigned transaction and its payload
async fn unsigned_transfer(context: &TestContext) -> (String, Value) {
    let resp = context
        .post(
            "/construction/preprocess",
            json!({
                "network_identifier": network_identifier(),
                "operations": transfer_operations(AMOUNT),
            }),
        )
        .await;
    let options = resp["options"].clone();

    let resp = context
        .post(
            "/construction/metadata",
            json!({"network_identifier": network_identifier(), "options": options}),
        )
        .await;
    let metadata = resp["metadata"].clone();

    let resp = context
        .post(
            "/construction/payloads",
            json!({
                "network_identifier": network_identifier(),
                "operations": transfer_operations(AMOUNT),
                "metadata": metadata,
            }),
        )
        .await;
    let payloads = resp["payloads"].as_array().unwrap();
    assert_eq!(payloads.len(), 1);
    (
        resp["unsigned_transaction"].as_str().unwrap().to_string(),
        payloads[0].clone(),
    )
}

async fn combine(context: &TestContext, unsigned: &str, payload: &Value) -> String {
    let signed = context.sign(payload["hex_bytes"].as_str().unwrap());
    let resp = context
        .post(
            "/construction/combine",
            json!({
                "network_identifier": network_identifier(),
                "unsigned_transaction": unsigned,
                "signatures": [signature(context, payload, signed)],
            }),
        )
        .await;
    resp["signed_transaction"].as_str().unwrap().to_string()
}

async fn parse(context: &TestContext, transaction: &str, signed: bool) -> Value {
    context
        .post(
            "/construction/parse",
            json!({
                "network_identifier": network_identifier(),
                "signed": signed,
                "transaction": transaction,
            }),
        )
        .await
}

/// Re-encodes an unsigned transaction after changing it
fn tamper(unsigned: &str, change: impl FnOnce(&mut Transaction)) -> String {
    let mut transaction = decode_transaction(unsigned).unwrap();
    change(&mut transaction);
    transaction.encode().unwrap()
}

#[tokio::test]
async fn test_preprocess_and_metadata() {
    let context = new_test_context();

    let resp = context
        .post(
            "/construction/preprocess",
            json!({
                "network_identifier": network_identifier(),
                "operations": transfer_operations(AMOUNT),
            }),
        )
        .await;
    assert_eq!(
        resp,
        json!({"options": {"account_identifier": {"address": SENDER}}})
    );

    let resp = context
        .post(
            "/construction/metadata",
            json!({"network_identifier": network_identifier(), "options": resp["options"]}),
        )
        .await;
    assert_eq!(
        resp["metadata"],
        json!({
            "current_block_identifier": {"index": LAST_HEIGHT, "hash": block_id(LAST_HEIGHT).to_hex()},
            "sequence_number": SEQUENCE_NUMBER,
        })
    );
    assert_eq!(resp["suggested_fee"][0]["value"], "0");
}

#[tokio::test]
async fn test_transfer_round_trip() {
    let context = new_test_context();
    let (unsigned, payload) = unsigned_transfer(&context).await;

    assert_eq!(payload["account_identifier"], json!({"address": SENDER}));
    assert_eq!(payload["signature_type"], "ecdsa");
    assert_eq!(payload["hex_bytes"].as_str().unwrap().len(), 64);

    let resp = parse(&context, &unsigned, false).await;
    assert_eq!(resp["operations"], transfer_operations(AMOUNT));
    assert!(resp.get("account_identifier_signers").is_none());
    assert_eq!(resp["metadata"]["sequence_number"], SEQUENCE_NUMBER);
    assert_eq!(
        resp["metadata"]["current_block_identifier"]["index"],
        LAST_HEIGHT
    );

    let signed = combine(&context, &unsigned, &payload).await;
    assert_ne!(signed, unsigned);

    let resp = parse(&context, &signed, true).await;
    assert_eq!(resp["operations"], transfer_operations(AMOUNT));
    assert_eq!(
        resp["account_identifier_signers"],
        json!([{"address": SENDER}])
    );

    let hash = context
        .post(
            "/construction/hash",
            json!({"network_identifier": network_identifier(), "signed_transaction": signed}),
        )
        .await;
    let submit = context
        .post(
            "/construction/submit",
            json!({"network_identifier": network_identifier(), "signed_transaction": signed}),
        )
        .await;
    assert_eq!(hash, submit);
    assert_eq!(
        hash["transaction_identifier"]["hash"],
        decode_transaction(&signed).unwrap().id().unwrap().to_hex()
    );
}

#[tokio::test]
async fn test_invalid_intents() {
    let context = new_test_context().expect_status_code(422);

    let mut operations = transfer_operations(AMOUNT);
    let extra = operations[0].clone();
    operations.as_array_mut().unwrap().push(extra);
    let resp = context
        .post(
            "/construction/preprocess",
            json!({"network_identifier": network_identifier(), "operations": operations}),
        )
        .await;
    assert_eq!(resp["code"], 3);
    assert_eq!(resp["description"], "transaction operations are invalid");
    assert_eq!(resp["details"]["have_operations"], 3);

    let mut operations = transfer_operations(AMOUNT);
    operations[1]["amount"]["value"] = json!("1");
    let resp = context
        .post(
            "/construction/preprocess",
            json!({"network_identifier": network_identifier(), "operations": operations}),
        )
        .await;
    assert_eq!(resp["code"], 12);
}

#[tokio::test]
async fn test_preprocess_rejects_receiver_of_other_chain() {
    let context = new_test_context().expect_status_code(422);

    for receiver in ["0000000000000000", "1654653399040a61"] {
        let mut operations = transfer_operations(AMOUNT);
        operations[1]["account"]["address"] = json!(receiver);
        let resp = context
            .post(
                "/construction/preprocess",
                json!({"network_identifier": network_identifier(), "operations": operations}),
            )
            .await;
        assert_eq!(resp["code"], 5);
    }
}

#[tokio::test]
async fn test_account_format_is_checked_before_amounts() {
    let context = new_test_context().expect_status_code(400);

    let mut operations = transfer_operations(AMOUNT);
    operations[0]["account"]["address"] = json!("abcd");
    operations[1]["amount"]["value"] = json!("1");
    let resp = context
        .post(
            "/construction/preprocess",
            json!({"network_identifier": network_identifier(), "operations": operations}),
        )
        .await;
    assert_eq!(resp["code"], 3);
    assert_eq!(resp["details"]["have_length"], 4);
}

#[tokio::test]
async fn test_metadata_invalid_account() {
    let context = new_test_context();
    let resp = context
        .expect_status_code(400)
        .post(
            "/construction/metadata",
            json!({
                "network_identifier": network_identifier(),
                "options": {"account_identifier": {"address": "0x1234"}},
            }),
        )
        .await;
    assert_eq!(resp["code"], 3);
}

#[tokio::test]
async fn test_expired_reference_block() {
    let context = new_test_context_with_last_height(900);
    let resp = context
        .expect_status_code(422)
        .post(
            "/construction/payloads",
            json!({
                "network_identifier": network_identifier(),
                "operations": transfer_operations(AMOUNT),
                "metadata": {
                    "current_block_identifier": {"index": 100, "hash": block_id(100).to_hex()},
                    "sequence_number": SEQUENCE_NUMBER,
                },
            }),
        )
        .await;
    assert_eq!(resp["code"], 7);
    assert_eq!(resp["details"]["expiry"], 600);
}

#[tokio::test]
async fn test_parse_invalid_envelopes() {
    let context = new_test_context();
    let (unsigned, _) = unsigned_transfer(&context).await;
    let context = context.expect_status_code(422);

    let resp = parse(&context, &tamper(&unsigned, |tx| tx.authorizers.clear()), false).await;
    assert_eq!(resp["code"], 13);
    assert_eq!(resp["details"]["have_authorizers"], json!([]));
    assert_eq!(resp["details"]["want_authorizers"], json!([SENDER]));

    let receiver = Address::from_hex(RECEIVER).unwrap();
    let resp = parse(&context, &tamper(&unsigned, |tx| tx.payer = receiver), false).await;
    assert_eq!(resp["code"], 14);

    let resp = parse(
        &context,
        &tamper(&unsigned, |tx| tx.proposal_key.address = Address::ZERO),
        false,
    )
    .await;
    assert_eq!(resp["code"], 15);

    let resp = parse(
        &context,
        &tamper(&unsigned, |tx| tx.script = b"transaction {}".to_vec()),
        false,
    )
    .await;
    assert_eq!(resp["code"], 16);

    let resp = parse(&context, &tamper(&unsigned, |tx| tx.arguments.truncate(1)), false).await;
    assert_eq!(resp["code"], 17);

    let zero = CadenceValue::Address(Address::ZERO).to_json().unwrap();
    let resp = parse(&context, &tamper(&unsigned, |tx| tx.arguments[1] = zero), false).await;
    assert_eq!(resp["code"], 19);
    assert_eq!(resp["details"]["receiver"], Address::ZERO.to_hex());

    let resp = parse(&context, "zz", false).await;
    assert_eq!(resp["code"], 22);
    assert_eq!(resp["details"]["encoding"], "hex");

    let resp = parse(&context, "0102", false).await;
    assert_eq!(resp["code"], 22);
    assert_eq!(resp["details"]["encoding"], "bcs");

    let resp = parse(&context, &unsigned, true).await;
    assert_eq!(resp["code"], 23);
}

#[tokio::test]
async fn test_combine_invalid_signatures() {
    let context = new_test_context();
    let (unsigned, payload) = unsigned_transfer(&context).await;
    let context = context.expect_status_code(422);
    let valid = context.sign(payload["hex_bytes"].as_str().unwrap());

    let combine = |signatures: Value| {
        context.post(
            "/construction/combine",
            json!({
                "network_identifier": network_identifier(),
                "unsigned_transaction": unsigned,
                "signatures": signatures,
            }),
        )
    };

    let resp = combine(json!([])).await;
    assert_eq!(resp["code"], 23);

    let resp = combine(json!([
        signature(&context, &payload, valid.clone()),
        signature(&context, &payload, valid.clone()),
    ]))
    .await;
    assert_eq!(resp["code"], 23);
    assert_eq!(resp["details"]["have_signatures"], 2);

    let other = context.sign(&"00".repeat(32));
    let resp = combine(json!([signature(&context, &payload, other)])).await;
    assert_eq!(resp["code"], 20);

    let mut wrong_type = signature(&context, &payload, valid.clone());
    wrong_type["signature_type"] = json!("ed25519");
    let resp = combine(json!([wrong_type])).await;
    assert_eq!(resp["code"], 20);

    let mut wrong_signer = signature(&context, &payload, valid.clone());
    wrong_signer["signing_payload"]["account_identifier"]["address"] = json!(RECEIVER);
    let resp = combine(json!([wrong_signer])).await;
    assert_eq!(resp["code"], 20);

    let mut wrong_key = signature(&context, &payload, valid.clone());
    wrong_key["public_key"]["hex_bytes"] = json!(format!("04{}", "ab".repeat(64)));
    let resp = combine(json!([wrong_key])).await;
    assert_eq!(resp["code"], 21);

    let mut malformed_key = signature(&context, &payload, valid);
    malformed_key["public_key"]["hex_bytes"] = json!("zz");
    let resp = combine(json!([malformed_key])).await;
    assert_eq!(resp["code"], 21);
    assert_eq!(
        resp["description"],
        "public key is not a valid hex-encoded string"
    );
    assert!(resp["details"]["error"].is_string());
}
