// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Cadence script generation
//!
//! Scripts and event types depend on where the token contracts are deployed, so they are
//! rendered from templates with the chain [`Params`].

use crate::chain::{Params, Token};
use anyhow::{anyhow, Context};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;

const GET_BALANCE: &str = "get_balance";
const TRANSFER_TOKENS: &str = "transfer_tokens";
const TOKENS_DEPOSITED: &str = "tokens_deposited";
const TOKENS_WITHDRAWN: &str = "tokens_withdrawn";

/// Produces chain specific scripts and event types for a token
pub trait Generator: Send + Sync {
    /// Script returning the balance of the account given as its only argument
    fn get_balance(&self, symbol: &str) -> anyhow::Result<Vec<u8>>;

    /// Transaction sending `amount` tokens from the signer to `to`
    fn transfer_tokens(&self, symbol: &str) -> anyhow::Result<Vec<u8>>;

    /// Type of the event emitted when tokens are deposited into a vault
    fn tokens_deposited(&self, symbol: &str) -> anyhow::Result<String>;

    /// Type of the event emitted when tokens are withdrawn from a vault
    fn tokens_withdrawn(&self, symbol: &str) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct TemplateData<'a> {
    params: &'a Params,
    token: &'a Token,
}

/// [`Generator`] rendering the templates shipped with the crate
pub struct ScriptGenerator {
    params: Arc<Params>,
    registry: Handlebars<'static>,
}

impl ScriptGenerator {
    pub fn new(params: Arc<Params>) -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        for (name, template) in [
            (GET_BALANCE, include_str!("../templates/get_balance.cdc")),
            (TRANSFER_TOKENS, include_str!("../templates/transfer_tokens.cdc")),
            (TOKENS_DEPOSITED, include_str!("../templates/tokens_deposited.tmpl")),
            (TOKENS_WITHDRAWN, include_str!("../templates/tokens_withdrawn.tmpl")),
        ] {
            registry
                .register_template_string(name, template)
                .with_context(|| format!("could not parse template {}", name))?;
        }

        Ok(ScriptGenerator { params, registry })
    }

    fn render(&self, template: &str, symbol: &str) -> anyhow::Result<String> {
        let token = self
            .params
            .token(symbol)
            .ok_or_else(|| anyhow!("invalid token symbol ({})", symbol))?;
        let data = TemplateData {
            params: &self.params,
            token,
        };
        self.registry
            .render(template, &data)
            .with_context(|| format!("could not render template {}", template))
    }
}

impl Generator for ScriptGenerator {
    fn get_balance(&self, symbol: &str) -> anyhow::Result<Vec<u8>> {
        self.render(GET_BALANCE, symbol).map(String::into_bytes)
    }

    fn transfer_tokens(&self, symbol: &str) -> anyhow::Result<Vec<u8>> {
        self.render(TRANSFER_TOKENS, symbol).map(String::into_bytes)
    }

    fn tokens_deposited(&self, symbol: &str) -> anyhow::Result<String> {
        self.render(TOKENS_DEPOSITED, symbol)
    }

    fn tokens_withdrawn(&self, symbol: &str) -> anyhow::Result<String> {
        self.render(TOKENS_WITHDRAWN, symbol)
    }
}
