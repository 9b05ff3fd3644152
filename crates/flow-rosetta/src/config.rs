// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{common::DEFAULT_CONTENT_LENGTH_LIMIT, retriever::DEFAULT_TRANSACTION_LIMIT};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, net::SocketAddr, path::Path};
use url::Url;

pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration of the Rosetta server
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RosettaConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key_path: Option<String>,
    #[serde(default = "default_content_length_limit")]
    pub content_length_limit: u64,
    /// Index and execution API
    pub dps_api_url: Url,
    /// Access node used to submit transactions
    pub access_api_url: Url,
    /// Maximum number of transactions returned with a block
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: usize,
    #[serde(default)]
    pub smart_status_codes: bool,
    /// Suggested transfer fee in atomic units
    #[serde(default)]
    pub suggested_fee: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_content_length_limit() -> u64 {
    DEFAULT_CONTENT_LENGTH_LIMIT
}

fn default_transaction_limit() -> usize {
    DEFAULT_TRANSACTION_LIMIT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl RosettaConfig {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let mut file = File::open(path).map_err(|e| {
            anyhow::anyhow!("Unable to open file {}. Error: {}", path.display(), e)
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            anyhow::anyhow!("Unable to read file {}. Error: {}", path.display(), e)
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Unable to read yaml {}. Error: {}", path.display(), e)
        })
    }
}
