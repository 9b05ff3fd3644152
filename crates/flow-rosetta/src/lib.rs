// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Flow Rosetta API
//!
//! Serves the Data and Construction APIs of [Rosetta](https://www.rosetta-api.org/docs/Reference.html)
//! for Flow, on top of an index of the chain.

#![forbid(unsafe_code)]

use crate::{
    backend::{Index, Invoker, Submitter},
    chain::Params,
    client::{AccessClient, DpsClient},
    config::RosettaConfig,
    error::ApiError,
    retriever::Retriever,
    scripts::{Generator, ScriptGenerator},
    transactor::Transactor,
    validator::Validator,
};
use anyhow::Context;
use futures::{future, FutureExt};
use std::{convert::Infallible, future::Future, sync::Arc, time::Duration};
use tokio::{signal, sync::oneshot, task::JoinHandle};
use tracing::{debug, debug_span, info, warn};
use warp::{
    http::{HeaderValue, Method, StatusCode},
    reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType},
    Filter, Rejection, Reply,
};

mod account;
mod block;
mod construction;
mod network;

pub mod backend;
pub mod chain;
pub mod client;
pub mod common;
pub mod config;
pub mod converter;
pub mod error;
pub mod failure;
pub mod retriever;
pub mod scripts;
pub mod transactor;
pub mod types;
pub mod validator;

#[cfg(test)]
pub(crate) mod tests;

pub const BLOCKCHAIN: &str = "flow";
pub const FLOW_SYMBOL: &str = "FLOW";
pub const FLOW_DECIMALS: u32 = 8;
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const OPERATION_TRANSFER: &str = "TRANSFER";
pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NODE_VERSION: &str = "0.23.9";
pub const ROSETTA_VERSION: &str = "1.4.10";

/// Rosetta API context for use on all APIs
#[derive(Clone)]
pub struct RosettaContext {
    pub validator: Arc<Validator>,
    pub retriever: Arc<Retriever>,
    pub transactor: Arc<Transactor>,
    /// Return 400 and 422 for request errors instead of 500 for every error
    pub smart_status_codes: bool,
    pub content_length_limit: u64,
    /// Fee suggested for transfers, in atomic units
    pub suggested_fee: u64,
}

impl RosettaContext {
    pub fn new(
        params: Params,
        index: Arc<dyn Index>,
        invoker: Arc<dyn Invoker>,
        submitter: Arc<dyn Submitter>,
        config: &RosettaConfig,
    ) -> anyhow::Result<Self> {
        let params = Arc::new(params);
        let generator: Arc<dyn Generator> = Arc::new(ScriptGenerator::new(params.clone())?);
        let validator = Arc::new(Validator::new(params.clone(), index.clone()));
        let retriever = Retriever::new(
            params,
            index,
            validator.clone(),
            generator.clone(),
            invoker.clone(),
            config.transaction_limit,
        )?;
        let transactor = Transactor::new(validator.clone(), generator, invoker, submitter);

        Ok(RosettaContext {
            validator,
            retriever: Arc::new(retriever),
            transactor: Arc::new(transactor),
            smart_status_codes: config.smart_status_codes,
            content_length_limit: config.content_length_limit,
            suggested_fee: config.suggested_fee,
        })
    }
}

/// Time in-flight requests get to finish once shutdown was requested
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates HTTP server (warp-based) for Rosetta
///
/// The server stops on interrupt or termination, the returned handle completes once it is down.
pub fn bootstrap(
    config: RosettaConfig,
) -> anyhow::Result<(tokio::runtime::Runtime, JoinHandle<anyhow::Result<()>>)> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("rosetta")
        .enable_all()
        .build()
        .context("[rosetta] failed to create runtime")?;

    debug!("Starting up Rosetta server with {:?}", config);
    let context = runtime.block_on(connect(&config))?;
    let server = runtime.spawn(serve(config, context, shutdown_signal()));
    Ok((runtime, server))
}

/// Connects to the upstream services and detects the chain from the first indexed block
async fn connect(config: &RosettaConfig) -> anyhow::Result<RosettaContext> {
    let dps = Arc::new(DpsClient::new(config.dps_api_url.clone()));
    let access = Arc::new(AccessClient::new(config.access_api_url.clone()));

    let first = dps.first().await.context("could not retrieve first height")?;
    let root = dps
        .header(first)
        .await
        .context("could not retrieve root header")?;
    info!(chain = %root.chain_id, height = first, "detected chain from root block");

    RosettaContext::new(
        Params::for_chain(root.chain_id),
        dps.clone(),
        dps,
        access,
        config,
    )
}

/// Serves the API until `shutdown` completes, then drains in-flight requests
async fn serve(
    config: RosettaConfig,
    context: RosettaContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let routes = routes(context);
    let (stopping_tx, stopping_rx) = oneshot::channel();
    let shutdown = async move {
        shutdown.await;
        info!("Shutting down Rosetta server");
        let _ = stopping_tx.send(());
    };

    let server = match (&config.tls_cert_path, &config.tls_key_path) {
        (Some(cert_path), Some(key_path)) => {
            let (address, server) = warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(config.listen_address, shutdown);
            info!(%address, "Rosetta server listening with TLS");
            server.boxed()
        },
        _ => {
            let (address, server) = warp::serve(routes)
                .try_bind_with_graceful_shutdown(config.listen_address, shutdown)
                .with_context(|| format!("could not bind to {}", config.listen_address))?;
            info!(%address, "Rosetta server listening");
            server.boxed()
        },
    };

    let deadline = async move {
        match stopping_rx.await {
            Ok(()) => tokio::time::sleep(SHUTDOWN_TIMEOUT).await,
            Err(_) => future::pending().await,
        }
    };

    tokio::select! {
        _ = server => info!("Rosetta server stopped"),
        _ = deadline => warn!(
            timeout = ?SHUTDOWN_TIMEOUT,
            "Rosetta server stopped before in-flight requests finished"
        ),
    }
    Ok(())
}

/// Completes on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("unable to listen for interrupt: {}", err);
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            },
            Err(err) => {
                warn!("unable to listen for termination: {}", err);
                future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Collection of all routes for the server
pub fn routes(
    context: RosettaContext,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let smart_status_codes = context.smart_status_codes;
    account::routes(context.clone())
        .or(block::block_route(context.clone()))
        .or(block::block_transaction_route(context.clone()))
        .or(construction::combine_route(context.clone()))
        .or(construction::hash_route(context.clone()))
        .or(construction::metadata_route(context.clone()))
        .or(construction::parse_route(context.clone()))
        .or(construction::payloads_route(context.clone()))
        .or(construction::preprocess_route(context.clone()))
        .or(construction::submit_route(context.clone()))
        .or(network::routes(context))
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec![Method::GET, Method::POST])
                .allow_headers(vec![warp::http::header::CONTENT_TYPE]),
        )
        .recover(move |err| handle_rejection(err, smart_status_codes))
        .with(warp::trace::trace(|info| {
            debug_span!(
                "request",
                method = %info.method(),
                path = %info.path(),
            )
        }))
}

/// Handle error codes from warp
async fn handle_rejection(
    err: Rejection,
    smart_status_codes: bool,
) -> Result<impl Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::rejection(StatusCode::NOT_FOUND, "Not Found")
    } else if let Some(cause) = err.find::<warp::cors::CorsForbidden>() {
        ApiError::rejection(StatusCode::FORBIDDEN, cause.to_string())
    } else if let Some(cause) = err.find::<LengthRequired>() {
        ApiError::rejection(StatusCode::LENGTH_REQUIRED, cause.to_string())
    } else if let Some(cause) = err.find::<PayloadTooLarge>() {
        ApiError::rejection(StatusCode::PAYLOAD_TOO_LARGE, cause.to_string())
    } else if let Some(cause) = err.find::<UnsupportedMediaType>() {
        ApiError::rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, cause.to_string())
    } else if let Some(cause) = err.find::<MethodNotAllowed>() {
        ApiError::rejection(StatusCode::METHOD_NOT_ALLOWED, cause.to_string())
    } else {
        ApiError::rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unexpected error: {:?}", err),
        )
    };

    let error = if smart_status_codes {
        error
    } else {
        error.without_smart_status()
    };
    let mut rep = error.into_response();
    rep.headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    Ok(rep)
}
