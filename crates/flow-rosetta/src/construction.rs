// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Construction APIs
//!
//! The construction APIs break down transactions into composable parts that are
//! used to be generic across blockchains.  A flow of operations can be found
//! in the [specifications](https://www.rosetta-api.org/docs/construction_api_introduction.html)
//!
//! This is broken down in the following flow:
//!
//! * Preprocess (based on operations) names the proposer whose key metadata reads
//! * Metadata fetches onchain information e.g. reference block and sequence number
//! * Payloads generates an unsigned transaction and the payload the payer signs
//! * Application outside signs the payload
//! * Combine puts the signature with the unsigned transaction
//! * Submit submits the signed transaction to the blockchain
//!
//! Parse decodes transactions of any step back into operations, and hash returns the
//! identifier of a signed transaction for lookup.

use crate::{
    common::{check_network, handle_request, json_body, with_context},
    error::{ApiError, ApiResult},
    transactor::decode_transaction,
    types::{
        Amount, ConstructionCombineRequest, ConstructionCombineResponse, ConstructionHashRequest,
        ConstructionMetadata, ConstructionMetadataRequest, ConstructionMetadataResponse,
        ConstructionOptions, ConstructionParseRequest, ConstructionParseResponse,
        ConstructionPayloadsRequest, ConstructionPayloadsResponse, ConstructionPreprocessRequest,
        ConstructionPreprocessResponse, ConstructionSubmitRequest, TransactionIdentifierResponse,
    },
    RosettaContext,
};
use tracing::{debug, info};
use warp::Filter;

pub fn combine_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "combine")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_combine))
}

pub fn hash_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "hash")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_hash))
}

pub fn metadata_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "metadata")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_metadata))
}

pub fn parse_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "parse")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_parse))
}

pub fn payloads_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "payloads")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_payloads))
}

pub fn preprocess_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "preprocess")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_preprocess))
}

pub fn submit_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "submit")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(construction_submit))
}

/// Construction combine command (OFFLINE)
///
/// Verifies the payer signature and attaches it to the unsigned transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructioncombine)
async fn construction_combine(
    request: ConstructionCombineRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionCombineResponse> {
    debug!("/construction/combine {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let unsigned = decode_transaction(&request.unsigned_transaction)
        .map_err(|err| ApiError::processing("unable to parse transaction", err.into()))?;

    let signed = server_context
        .transactor
        .attach_signatures(unsigned, &request.signatures)
        .await
        .map_err(|err| ApiError::processing("unable to sign transaction", err))?;

    let signed_transaction = signed
        .encode()
        .map_err(|err| ApiError::processing("unable to sign transaction", err.into()))?;

    Ok(ConstructionCombineResponse { signed_transaction })
}

/// Construction hash command (OFFLINE)
///
/// Hash a transaction to get its identifier for lookup
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionhash)
async fn construction_hash(
    request: ConstructionHashRequest,
    server_context: RosettaContext,
) -> ApiResult<TransactionIdentifierResponse> {
    debug!("/construction/hash {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let transaction = decode_transaction(&request.signed_transaction)
        .map_err(|err| ApiError::processing("unable to parse transaction", err.into()))?;

    let transaction_identifier = server_context
        .transactor
        .transaction_identifier(&transaction)
        .map_err(|err| ApiError::processing("unable to retrieve transaction identifier", err))?;

    Ok(TransactionIdentifierResponse {
        transaction_identifier,
    })
}

/// Construction metadata command
///
/// Uses the latest indexed block as reference block, and retrieves the sequence number of the
/// proposer key at that block
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionmetadata)
async fn construction_metadata(
    request: ConstructionMetadataRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionMetadataResponse> {
    debug!("/construction/metadata {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let account = &request.options.account_identifier;
    server_context
        .validator
        .account(account)
        .map_err(|err| ApiError::processing("unable to retrieve account key sequence number", err.into()))?;

    let retriever = &server_context.retriever;
    let (current, _) = retriever
        .current()
        .await
        .map_err(|err| ApiError::processing("unable to retrieve current block", err))?;

    let sequence_number = retriever
        .sequence(&current.clone().into(), account, 0)
        .await
        .map_err(|err| {
            ApiError::processing("unable to retrieve account key sequence number", err)
        })?;

    Ok(ConstructionMetadataResponse {
        metadata: ConstructionMetadata {
            current_block_identifier: current,
            sequence_number,
        },
        suggested_fee: vec![Amount::flow(i128::from(server_context.suggested_fee))],
    })
}

/// Construction parse command (OFFLINE)
///
/// Decodes an unsigned or signed transaction into its operations, signed transactions also
/// return their verified signer
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionparse)
async fn construction_parse(
    request: ConstructionParseRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionParseResponse> {
    debug!("/construction/parse {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let parser = server_context
        .transactor
        .parse_transaction(&request.transaction)
        .map_err(|err| ApiError::processing("unable to parse transaction", err.into()))?;

    let operations = parser
        .operations()
        .map_err(|err| ApiError::processing("unable to parse transaction", err))?;

    let account_identifier_signers = if request.signed {
        let signers = parser
            .signers()
            .await
            .map_err(|err| ApiError::processing("unable to parse transaction", err))?;
        Some(signers)
    } else {
        None
    };

    let current_block_identifier = parser.reference_block().await.map_err(|err| {
        ApiError::processing("unable to retrieve transaction reference block", err)
    })?;

    Ok(ConstructionParseResponse {
        operations,
        account_identifier_signers,
        metadata: Some(ConstructionMetadata {
            current_block_identifier,
            sequence_number: parser.sequence(),
        }),
    })
}

/// Construction payloads command (OFFLINE)
///
/// Constructs the unsigned transaction and the payload the payer must sign
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionpayloads)
async fn construction_payloads(
    request: ConstructionPayloadsRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionPayloadsResponse> {
    debug!("/construction/payloads {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let transactor = &server_context.transactor;
    let intent = transactor
        .derive_intent(&request.operations)
        .map_err(|err| ApiError::processing("unable to determine transaction intent", err.into()))?;

    let metadata = &request.metadata;
    let transaction = transactor
        .compile_transaction(
            &metadata.current_block_identifier,
            &intent,
            metadata.sequence_number,
        )
        .await
        .map_err(|err| ApiError::processing("unable to construct transaction", err))?;

    let payload = transactor
        .hash_payload(&transaction, intent.payer)
        .await
        .map_err(|err| ApiError::processing("unable to hash signing payload", err))?;

    let unsigned_transaction = transaction
        .encode()
        .map_err(|err| ApiError::processing("unable to construct transaction", err.into()))?;

    Ok(ConstructionPayloadsResponse {
        unsigned_transaction,
        payloads: vec![payload],
    })
}

/// Construction preprocess command (OFFLINE)
///
/// Validates the operations, the proposer is the account metadata must look up
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionpreprocess)
async fn construction_preprocess(
    request: ConstructionPreprocessRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionPreprocessResponse> {
    debug!("/construction/preprocess {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let intent = server_context
        .transactor
        .derive_intent(&request.operations)
        .map_err(|err| ApiError::processing("unable to determine transaction intent", err.into()))?;

    Ok(ConstructionPreprocessResponse {
        options: ConstructionOptions {
            account_identifier: intent.proposer.into(),
        },
    })
}

/// Construction submit command (ONLINE)
///
/// Submits the signed transaction to the network
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionsubmit)
async fn construction_submit(
    request: ConstructionSubmitRequest,
    server_context: RosettaContext,
) -> ApiResult<TransactionIdentifierResponse> {
    debug!("/construction/submit {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let transaction = decode_transaction(&request.signed_transaction)
        .map_err(|err| ApiError::processing("unable to parse transaction", err.into()))?;

    let transaction_identifier = server_context
        .transactor
        .submit_transaction(&transaction)
        .await
        .map_err(|err| ApiError::processing("unable to submit transaction", err))?;

    info!(
        transaction = %transaction_identifier.hash,
        "submitted transaction"
    );

    Ok(TransactionIdentifierResponse {
        transaction_identifier,
    })
}
