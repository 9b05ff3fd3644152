// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by all endpoints

use crate::{
    error::{ApiError, ApiResult},
    types::NetworkIdentifier,
    RosettaContext,
};
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::Infallible, future::Future};
use warp::{hyper::body::Bytes, Filter, Reply};

/// Default limit on the size of request bodies
pub const DEFAULT_CONTENT_LENGTH_LIMIT: u64 = 4 * 1024 * 1024;

/// Passes the server context to a handler
pub fn with_context(
    context: RosettaContext,
) -> impl Filter<Extract = (RosettaContext,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}

/// Decodes a JSON request body
///
/// Bodies that are not valid JSON for the request type are rejected with an invalid encoding
/// error, instead of the plain text rejection of `warp::body::json`.
pub fn json_body<T: DeserializeOwned + Send>(
    content_length_limit: u64,
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(content_length_limit)
        .and(warp::body::bytes())
        .and_then(|body: Bytes| async move {
            serde_json::from_slice::<T>(&body)
                .map_err(|err| warp::reject::custom(ApiError::invalid_encoding(err)))
        })
}

/// Wraps an endpoint, turning its result into a JSON reply
///
/// Errors keep their status code only if smart status codes are enabled, otherwise every error
/// is returned with a 500.
pub fn handle_request<'a, F, R, Fut, O>(
    handler: F,
) -> impl Fn(R, RosettaContext) -> BoxFuture<'a, Result<Box<dyn Reply>, Infallible>> + Clone + Copy
where
    F: FnOnce(R, RosettaContext) -> Fut + Clone + Copy + Send + 'a,
    R: Send + 'a,
    Fut: Future<Output = ApiResult<O>> + Send + 'a,
    O: Serialize,
{
    move |request, context| {
        let smart_status_codes = context.smart_status_codes;
        Box::pin(async move {
            match handler(request, context).await {
                Ok(response) => Ok(Box::new(warp::reply::json(&response)) as Box<dyn Reply>),
                Err(err) if smart_status_codes => Ok(Box::new(err.into_response()) as Box<dyn Reply>),
                Err(err) => Ok(Box::new(err.without_smart_status().into_response()) as Box<dyn Reply>),
            }
        })
    }
}

/// Checks that a request is for the network this server is attached to
pub fn check_network(network: &NetworkIdentifier, context: &RosettaContext) -> ApiResult<()> {
    context.validator.network(network).map_err(ApiError::format)
}
