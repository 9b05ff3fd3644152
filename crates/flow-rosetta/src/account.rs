// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Account API
//!
//! See: [Account API Spec](https://www.rosetta-api.org/docs/AccountApi.html)

use crate::{
    common::{check_network, handle_request, json_body, with_context},
    error::{ApiError, ApiResult},
    types::{AccountBalanceRequest, AccountBalanceResponse},
    RosettaContext,
};
use tracing::{debug, trace};
use warp::Filter;

/// Account routes e.g. balance
pub fn routes(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post().and(
        warp::path!("account" / "balance")
            .and(json_body(server_context.content_length_limit))
            .and(with_context(server_context))
            .and_then(handle_request(account_balance)),
    )
}

/// Account balance command
///
/// Without a block identifier the balance at the latest indexed block is returned.
///
/// [API Spec](https://www.rosetta-api.org/docs/AccountApi.html#accountbalance)
async fn account_balance(
    request: AccountBalanceRequest,
    server_context: RosettaContext,
) -> ApiResult<AccountBalanceResponse> {
    debug!("/account/balance {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let retriever = &server_context.retriever;
    let block = match request.block_identifier {
        Some(block) if !block.is_empty() => block,
        _ => {
            let (current, _) = retriever
                .current()
                .await
                .map_err(|err| ApiError::processing("unable to retrieve current block", err))?;
            current.into()
        },
    };

    let currencies = request.currencies.unwrap_or_default();
    let (block_identifier, balances) = retriever
        .balances(&block, &request.account_identifier, &currencies)
        .await
        .map_err(|err| ApiError::processing("unable to retrieve balances", err))?;

    trace!(
        account = %request.account_identifier.address,
        block = block_identifier.index,
        balances = ?balances,
        "retrieved balances"
    );

    Ok(AccountBalanceResponse {
        block_identifier,
        balances,
    })
}
