// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Network API
//!
//! See: [Network API Spec](https://www.rosetta-api.org/docs/NetworkApi.html)

use crate::{
    common::{check_network, handle_request, json_body, with_context},
    error::{self, ApiError, ApiResult},
    types::{
        Allow, MetadataRequest, NetworkListResponse, NetworkOptionsResponse, NetworkRequest,
        NetworkStatusResponse, OperationStatus, Version,
    },
    RosettaContext, MIDDLEWARE_VERSION, NODE_VERSION, OPERATION_TRANSFER, ROSETTA_VERSION,
    STATUS_COMPLETED,
};
use tracing::debug;
use warp::Filter;

pub fn routes(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let limit = server_context.content_length_limit;
    warp::post().and(
        warp::path!("network" / "list")
            .and(json_body(limit))
            .and(with_context(server_context.clone()))
            .and_then(handle_request(network_list))
            .or(warp::path!("network" / "options")
                .and(json_body(limit))
                .and(with_context(server_context.clone()))
                .and_then(handle_request(network_options)))
            .or(warp::path!("network" / "status")
                .and(json_body(limit))
                .and(with_context(server_context))
                .and_then(handle_request(network_status))),
    )
}

/// List [`NetworkIdentifier`](crate::types::NetworkIdentifier)s supported by this server
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networklist)
async fn network_list(
    request: MetadataRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkListResponse> {
    debug!("/network/list {:?}", request);

    Ok(NetworkListResponse {
        network_identifiers: vec![server_context.validator.network_identifier()],
    })
}

/// Versions and the operation statuses, operation types and errors this server can return
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networkoptions)
async fn network_options(
    request: NetworkRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkOptionsResponse> {
    debug!("/network/options {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let version = Version {
        rosetta_version: ROSETTA_VERSION.to_string(),
        node_version: NODE_VERSION.to_string(),
        middleware_version: MIDDLEWARE_VERSION.to_string(),
    };

    let allow = Allow {
        operation_statuses: vec![OperationStatus {
            status: STATUS_COMPLETED.to_string(),
            successful: true,
        }],
        operation_types: vec![OPERATION_TRANSFER.to_string()],
        errors: error::all(),
        historical_balance_lookup: true,
    };

    Ok(NetworkOptionsResponse { version, allow })
}

/// Current, genesis and oldest indexed blocks
///
/// The index may start after the root of the chain, so genesis is the oldest indexed block.
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networkstatus)
async fn network_status(
    request: NetworkRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkStatusResponse> {
    debug!("/network/status {:?}", request);
    check_network(&request.network_identifier, &server_context)?;

    let retriever = &server_context.retriever;
    let (oldest, _) = retriever
        .oldest()
        .await
        .map_err(|err| ApiError::processing("unable to retrieve oldest block", err))?;
    let (current, timestamp) = retriever
        .current()
        .await
        .map_err(|err| ApiError::processing("unable to retrieve current block", err))?;

    Ok(NetworkStatusResponse {
        current_block_identifier: current,
        current_block_timestamp: timestamp,
        genesis_block_identifier: oldest.clone(),
        oldest_block_identifier: oldest,
        peers: vec![],
    })
}
