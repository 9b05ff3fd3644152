// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Errors returned by the API
//!
//! Failures are turned into Rosetta errors at the API boundary by walking ordered mapping
//! tables, the first matching entry decides the HTTP status and the error definition.

use crate::{failure::Failure, types};
use serde_json::{Map, Value};
use thiserror::Error;
use warp::{http::StatusCode, reply::Reply};

pub type ApiResult<T> = Result<T, ApiError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error of the services behind the API: either a known failure or an unexpected error
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Failure(#[from] Failure),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Static part of a Rosetta error, never changes between occurrences
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ErrorDefinition {
    pub code: u32,
    pub message: &'static str,
    pub retriable: bool,
}

impl ErrorDefinition {
    const fn new(code: u32, message: &'static str, retriable: bool) -> Self {
        ErrorDefinition {
            code,
            message,
            retriable,
        }
    }

    pub fn to_error(self) -> types::Error {
        types::Error {
            code: self.code,
            message: self.message.to_string(),
            retriable: self.retriable,
            description: None,
            details: None,
        }
    }
}

pub const ERROR_INTERNAL: ErrorDefinition = ErrorDefinition::new(1, "internal error", true);
pub const ERROR_INVALID_ENCODING: ErrorDefinition =
    ErrorDefinition::new(2, "invalid request encoding", false);
pub const ERROR_INVALID_FORMAT: ErrorDefinition =
    ErrorDefinition::new(3, "invalid request format", false);
pub const ERROR_INVALID_NETWORK: ErrorDefinition =
    ErrorDefinition::new(4, "invalid network identifier", false);
pub const ERROR_INVALID_ACCOUNT: ErrorDefinition =
    ErrorDefinition::new(5, "invalid account identifier", false);
pub const ERROR_INVALID_CURRENCY: ErrorDefinition =
    ErrorDefinition::new(6, "invalid currency identifier", false);
pub const ERROR_INVALID_BLOCK: ErrorDefinition =
    ErrorDefinition::new(7, "invalid block identifier", false);
pub const ERROR_INVALID_TRANSACTION: ErrorDefinition =
    ErrorDefinition::new(8, "invalid transaction identifier", false);
pub const ERROR_UNKNOWN_BLOCK: ErrorDefinition = ErrorDefinition::new(9, "unknown block", true);
pub const ERROR_UNKNOWN_CURRENCY: ErrorDefinition =
    ErrorDefinition::new(10, "unknown currency", false);
pub const ERROR_UNKNOWN_TRANSACTION: ErrorDefinition =
    ErrorDefinition::new(11, "unknown transaction", false);
pub const ERROR_INVALID_INTENT: ErrorDefinition =
    ErrorDefinition::new(12, "invalid transaction intent", false);
pub const ERROR_INVALID_AUTHORIZERS: ErrorDefinition =
    ErrorDefinition::new(13, "invalid transaction authorizers", false);
pub const ERROR_INVALID_PAYER: ErrorDefinition =
    ErrorDefinition::new(14, "invalid transaction payer", false);
pub const ERROR_INVALID_PROPOSER: ErrorDefinition =
    ErrorDefinition::new(15, "invalid transaction proposer", false);
pub const ERROR_INVALID_SCRIPT: ErrorDefinition =
    ErrorDefinition::new(16, "invalid transaction script", false);
pub const ERROR_INVALID_ARGUMENTS: ErrorDefinition =
    ErrorDefinition::new(17, "invalid transaction arguments", false);
pub const ERROR_INVALID_AMOUNT: ErrorDefinition =
    ErrorDefinition::new(18, "invalid transaction amount", false);
pub const ERROR_INVALID_RECEIVER: ErrorDefinition =
    ErrorDefinition::new(19, "invalid transaction receiver", false);
pub const ERROR_INVALID_SIGNATURE: ErrorDefinition =
    ErrorDefinition::new(20, "invalid transaction signature", false);
pub const ERROR_INVALID_KEY: ErrorDefinition =
    ErrorDefinition::new(21, "invalid account key", false);
pub const ERROR_INVALID_PAYLOAD: ErrorDefinition =
    ErrorDefinition::new(22, "invalid transaction payload", false);
pub const ERROR_INVALID_SIGNATURES: ErrorDefinition =
    ErrorDefinition::new(23, "invalid transaction signatures", false);

/// Every error the API can return, listed by `/network/options`
pub fn all() -> Vec<types::Error> {
    [
        ERROR_INTERNAL,
        ERROR_INVALID_ENCODING,
        ERROR_INVALID_FORMAT,
        ERROR_INVALID_NETWORK,
        ERROR_INVALID_ACCOUNT,
        ERROR_INVALID_CURRENCY,
        ERROR_INVALID_BLOCK,
        ERROR_INVALID_TRANSACTION,
        ERROR_UNKNOWN_BLOCK,
        ERROR_UNKNOWN_CURRENCY,
        ERROR_UNKNOWN_TRANSACTION,
        ERROR_INVALID_INTENT,
        ERROR_INVALID_AUTHORIZERS,
        ERROR_INVALID_PAYER,
        ERROR_INVALID_PROPOSER,
        ERROR_INVALID_SCRIPT,
        ERROR_INVALID_ARGUMENTS,
        ERROR_INVALID_AMOUNT,
        ERROR_INVALID_RECEIVER,
        ERROR_INVALID_SIGNATURE,
        ERROR_INVALID_KEY,
        ERROR_INVALID_PAYLOAD,
        ERROR_INVALID_SIGNATURES,
    ]
    .into_iter()
    .map(ErrorDefinition::to_error)
    .collect()
}

const INVALID_JSON: &str = "request does not contain valid JSON-encoded body";
const INVALID_OPERATIONS: &str = "transaction operations are invalid";

/// One row of a mapping table
struct Mapping {
    matches: fn(&Failure) -> bool,
    status: StatusCode,
    definition: ErrorDefinition,
    /// Replaces the failure's own description
    description: Option<&'static str>,
}

macro_rules! mapping {
    ($variant:ident, $status:expr, $definition:expr) => {
        Mapping {
            matches: |failure| matches!(failure, Failure::$variant { .. }),
            status: $status,
            definition: $definition,
            description: None,
        }
    };
    ($variant:ident, $status:expr, $definition:expr, $description:expr) => {
        Mapping {
            matches: |failure| matches!(failure, Failure::$variant { .. }),
            status: $status,
            definition: $definition,
            description: Some($description),
        }
    };
}

/// Failures of request validation
const FORMAT_ERRORS: &[Mapping] = &[
    mapping!(InvalidBlockHash, StatusCode::BAD_REQUEST, ERROR_INVALID_FORMAT),
    mapping!(InvalidAccountAddress, StatusCode::BAD_REQUEST, ERROR_INVALID_FORMAT),
    mapping!(InvalidTransactionHash, StatusCode::BAD_REQUEST, ERROR_INVALID_FORMAT),
    mapping!(IncompleteBlock, StatusCode::BAD_REQUEST, ERROR_INVALID_FORMAT),
    mapping!(MissingField, StatusCode::BAD_REQUEST, ERROR_INVALID_FORMAT),
    mapping!(InvalidNetwork, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_NETWORK),
    mapping!(InvalidBlockchain, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_NETWORK),
];

/// Failures of request processing
const API_ERRORS: &[Mapping] = &[
    mapping!(InvalidNetwork, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_NETWORK),
    mapping!(InvalidBlockchain, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_NETWORK),
    mapping!(InvalidBlock, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_BLOCK),
    mapping!(UnknownBlock, StatusCode::UNPROCESSABLE_ENTITY, ERROR_UNKNOWN_BLOCK),
    mapping!(InvalidAccount, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_ACCOUNT),
    mapping!(InvalidCurrency, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_CURRENCY),
    mapping!(UnknownCurrency, StatusCode::UNPROCESSABLE_ENTITY, ERROR_UNKNOWN_CURRENCY),
    mapping!(InvalidTransaction, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_TRANSACTION),
    mapping!(UnknownTransaction, StatusCode::UNPROCESSABLE_ENTITY, ERROR_UNKNOWN_TRANSACTION),
    mapping!(InvalidAuthorizers, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_AUTHORIZERS),
    mapping!(InvalidPayer, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_PAYER),
    mapping!(InvalidProposer, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_PROPOSER),
    mapping!(InvalidSignature, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_SIGNATURE),
    mapping!(InvalidSignatures, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_SIGNATURES),
    mapping!(
        InvalidOperations,
        StatusCode::UNPROCESSABLE_ENTITY,
        ERROR_INVALID_FORMAT,
        INVALID_OPERATIONS
    ),
    mapping!(InvalidIntent, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_INTENT),
    mapping!(InvalidKey, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_KEY),
    mapping!(InvalidScript, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_SCRIPT),
    mapping!(InvalidArguments, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_ARGUMENTS),
    mapping!(InvalidAmount, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_AMOUNT),
    mapping!(InvalidReceiver, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_RECEIVER),
    mapping!(InvalidPayload, StatusCode::UNPROCESSABLE_ENTITY, ERROR_INVALID_PAYLOAD),
];

fn lookup(table: &[Mapping], failure: &Failure) -> Option<ApiError> {
    table
        .iter()
        .find(|mapping| (mapping.matches)(failure))
        .map(|mapping| {
            let description = mapping
                .description
                .map(str::to_string)
                .unwrap_or_else(|| failure.description().text.clone());
            ApiError::new(
                mapping.status,
                mapping.definition,
                description,
                failure.details(),
            )
        })
}

/// A Rosetta error with the HTTP status it is returned with
#[derive(Clone, Debug, Error)]
#[error("{} ({})", .error.message, .status)]
pub struct ApiError {
    status: StatusCode,
    error: types::Error,
}

impl ApiError {
    fn new(
        status: StatusCode,
        definition: ErrorDefinition,
        description: impl Into<String>,
        details: Map<String, Value>,
    ) -> Self {
        let mut error = definition.to_error();
        error.description = Some(description.into());
        error.details = (!details.is_empty()).then_some(details);
        ApiError { status, error }
    }

    fn with_error(status: StatusCode, definition: ErrorDefinition, description: &str, err: impl ToString) -> Self {
        let mut details = Map::new();
        details.insert("error".to_string(), Value::from(err.to_string()));
        ApiError::new(status, definition, description, details)
    }

    /// Body that could not be decoded into the request type
    pub fn invalid_encoding(err: impl ToString) -> Self {
        ApiError::with_error(
            StatusCode::BAD_REQUEST,
            ERROR_INVALID_ENCODING,
            INVALID_JSON,
            err,
        )
    }

    /// Failure found while validating the shape of a request
    pub fn format(failure: Failure) -> Self {
        lookup(FORMAT_ERRORS, &failure).unwrap_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_FORMAT,
                failure.to_string(),
                Map::new(),
            )
        })
    }

    /// Error while processing a request, `description` explains the step that failed
    pub fn processing(description: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::Failure(failure) => {
                if let Some(error) = lookup(FORMAT_ERRORS, &failure) {
                    return error;
                }
                lookup(API_ERRORS, &failure).unwrap_or_else(|| {
                    ApiError::with_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ERROR_INTERNAL,
                        description,
                        failure,
                    )
                })
            },
            ServiceError::Internal(err) => ApiError::with_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_INTERNAL,
                description,
                format!("{:#}", err),
            ),
        }
    }

    /// Error for rejections of the HTTP layer itself
    pub fn rejection(status: StatusCode, description: impl Into<String>) -> Self {
        let definition = if status.is_server_error() {
            ERROR_INTERNAL
        } else {
            ERROR_INVALID_FORMAT
        };
        ApiError::new(status, definition, description, Map::new())
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> u32 {
        self.error.code
    }

    pub fn retriable(&self) -> bool {
        self.error.retriable
    }

    pub fn into_error(self) -> types::Error {
        self.error
    }

    /// Collapses the status to 500 for clients expecting the original Rosetta behaviour
    pub fn without_smart_status(mut self) -> Self {
        self.status = StatusCode::INTERNAL_SERVER_ERROR;
        self
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError::format(failure)
    }
}

impl warp::reject::Reject for ApiError {}

impl Reply for ApiError {
    fn into_response(self) -> warp::reply::Response {
        let status = self.status;
        warp::reply::with_status(warp::reply::json(&self.into_error()), status).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chain::Address, failure::Description};
    use serde_json::json;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = all();
        let mut codes: Vec<_> = errors.iter().map(|error| error.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(|error| error.description.is_none()));
    }

    #[test]
    fn test_format_failures_map_to_bad_request() {
        let error = ApiError::processing(
            "unable to retrieve block",
            Failure::InvalidBlockHash {
                description: Description::new("block hash has wrong length"),
                want_length: 64,
                have_length: 63,
            }
            .into(),
        );
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), ERROR_INVALID_FORMAT.code);

        let error = ApiError::format(Failure::InvalidNetwork {
            description: Description::new("invalid network identifier"),
            have: "flow-testnet".to_string(),
            want: "flow-localnet".to_string(),
        });
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error.into_error().details,
            Some(
                json!({"have_network": "flow-testnet", "want_network": "flow-localnet"})
                    .as_object()
                    .cloned()
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_authorizers_and_keys_are_mapped() {
        let sender = Address::from_hex("e2f72218abeec2b9").unwrap();
        let error = ApiError::processing(
            "unable to parse transaction",
            Failure::InvalidAuthorizers {
                description: Description::new("invalid number of authorizers"),
                have: vec![],
                want: vec![sender],
            }
            .into(),
        );
        assert_eq!(error.code(), ERROR_INVALID_AUTHORIZERS.code);

        let error = ApiError::processing(
            "unable to sign transaction",
            Failure::InvalidKey {
                description: Description::new("account key is revoked"),
                height: 10,
                address: sender,
                index: 0,
            }
            .into(),
        );
        assert_eq!(error.code(), ERROR_INVALID_KEY.code);
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_operations_use_fixed_description() {
        let error = ApiError::processing(
            "unable to determine transaction intent",
            Failure::InvalidOperations {
                description: Description::new("invalid number of operations"),
                have: 3,
                want: 2,
            }
            .into(),
        );
        let error = error.into_error();
        assert_eq!(error.code, ERROR_INVALID_FORMAT.code);
        assert_eq!(error.description.as_deref(), Some(INVALID_OPERATIONS));
    }

    #[test]
    fn test_internal_errors_keep_cause() {
        let error = ApiError::processing(
            "unable to submit transaction",
            anyhow::anyhow!("connection refused").into(),
        );
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.retriable());

        let error = error.into_error();
        assert_eq!(
            error.description.as_deref(),
            Some("unable to submit transaction")
        );
        assert_eq!(error.details.unwrap()["error"], json!("connection refused"));
    }
}
