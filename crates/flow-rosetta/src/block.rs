// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Block API
//!
//! See: [Block API Spec](https://www.rosetta-api.org/docs/BlockApi.html)

use crate::{
    common::{check_network, handle_request, json_body, with_context},
    error::{ApiError, ApiResult},
    types::{BlockRequest, BlockResponse, BlockTransactionRequest, BlockTransactionResponse},
    RosettaContext,
};
use tracing::debug;
use warp::Filter;

pub fn block_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("block")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(block))
}

pub fn block_transaction_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("block" / "transaction")
        .and(warp::post())
        .and(json_body(server_context.content_length_limit))
        .and(with_context(server_context))
        .and_then(handle_request(block_transaction))
}

/// Retrieves a block by height, ID or both
///
/// Transactions above the configured limit are only listed as `other_transactions`.
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html#block)
async fn block(request: BlockRequest, server_context: RosettaContext) -> ApiResult<BlockResponse> {
    debug!("/block {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let (block, other_transactions) = server_context
        .retriever
        .block(&request.block_identifier)
        .await
        .map_err(|err| ApiError::processing("unable to retrieve block", err))?;

    Ok(BlockResponse {
        block,
        other_transactions,
    })
}

/// Retrieves a transaction of a block identified by height, optionally with its ID
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html#blocktransaction)
async fn block_transaction(
    request: BlockTransactionRequest,
    server_context: RosettaContext,
) -> ApiResult<BlockTransactionResponse> {
    debug!("/block/transaction {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let transaction = server_context
        .retriever
        .transaction(&request.block_identifier, &request.transaction_identifier)
        .await
        .map_err(|err| ApiError::processing("unable to retrieve transaction", err))?;

    Ok(BlockTransactionResponse { transaction })
}
