// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use clap::Parser;
use flow_rosetta::{
    bootstrap,
    common::DEFAULT_CONTENT_LENGTH_LIMIT,
    config::{RosettaConfig, DEFAULT_LISTEN_ADDRESS, DEFAULT_LOG_LEVEL},
    retriever::DEFAULT_TRANSACTION_LIMIT,
};
use std::{net::SocketAddr, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args: RosettaServerArgs = RosettaServerArgs::parse();
    let config = args.into_config()?;
    init_logging(&config.log_level, config.log_json);

    // Run until there is an interrupt
    let (runtime, server) = bootstrap(config)?;
    runtime.block_on(server)?
}

/// `RUST_LOG` takes precedence over the configured level
fn init_logging(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Flow Rosetta API Server
///
/// Provides an implementation of [Rosetta](https://www.rosetta-api.org/docs/Reference.html) on Flow.
#[derive(Debug, Parser)]
#[clap(name = "flow-rosetta", author, version, propagate_version = true)]
pub struct RosettaServerArgs {
    /// YAML configuration file, replaces all other flags when given
    #[clap(short = 'f', long)]
    config_path: Option<PathBuf>,
    /// Listen address for the server. e.g. 127.0.0.1:8080
    #[clap(long, default_value = DEFAULT_LISTEN_ADDRESS)]
    listen_address: SocketAddr,
    /// URL of the index and execution API. e.g. http://127.0.0.1:5005/
    #[clap(long, env = "FLOW_ROSETTA_DPS_API_URL", default_value = "http://127.0.0.1:5005/")]
    dps_api_url: url::Url,
    /// URL of the access node API used to submit transactions
    #[clap(
        long,
        env = "FLOW_ROSETTA_ACCESS_API_URL",
        default_value = "http://127.0.0.1:9000/"
    )]
    access_api_url: url::Url,
    /// Path to TLS cert for HTTPS support
    #[clap(long)]
    tls_cert_path: Option<String>,
    /// Path to TLS key for HTTPS support
    #[clap(long)]
    tls_key_path: Option<String>,
    /// Limit to content length on all requests
    #[clap(long, default_value_t = DEFAULT_CONTENT_LENGTH_LIMIT)]
    content_length_limit: u64,
    /// Maximum number of transactions returned with a block
    #[clap(long, default_value_t = DEFAULT_TRANSACTION_LIMIT)]
    transaction_limit: usize,
    /// Return 400 and 422 status codes for invalid requests instead of 500
    #[clap(long)]
    smart_status_codes: bool,
    /// Suggested transfer fee in atomic units
    #[clap(long, default_value_t = 0)]
    suggested_fee: u64,
    /// Log level, overridden by RUST_LOG
    #[clap(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    /// Log as JSON lines
    #[clap(long)]
    log_json: bool,
}

impl RosettaServerArgs {
    fn into_config(self) -> anyhow::Result<RosettaConfig> {
        if let Some(path) = self.config_path {
            return RosettaConfig::load(&path);
        }
        Ok(RosettaConfig {
            listen_address: self.listen_address,
            tls_cert_path: self.tls_cert_path,
            tls_key_path: self.tls_key_path,
            content_length_limit: self.content_length_limit,
            dps_api_url: self.dps_api_url,
            access_api_url: self.access_api_url,
            transaction_limit: self.transaction_limit,
            smart_status_codes: self.smart_status_codes,
            suggested_fee: self.suggested_fee,
            log_level: self.log_level,
            log_json: self.log_json,
        })
    }
}
