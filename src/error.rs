//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Error types returned by the datastore write engine.

use thiserror::Error;

/// A convenience wrapper around `Result` for `yangstore::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The `error-type` of an `rpc-error` body, per RFC 6241 Appendix A.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorType {
    Transport,
    Rpc,
    Protocol,
    Application,
}

/// A NETCONF `rpc-error` body.
///
/// Carries the fields recognized by this crate's callers: `error-type`,
/// `error-tag`, `error-app-tag`, `error-path`, `error-info`, and
/// `error-message`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RpcError {
    pub error_type: ErrorType,
    pub error_tag: &'static str,
    pub error_app_tag: Option<String>,
    pub error_path: Option<String>,
    pub error_info: Option<String>,
    pub error_message: String,
}

impl RpcError {
    fn new(error_tag: &'static str, message: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Application,
            error_tag,
            error_app_tag: None,
            error_path: None,
            error_info: None,
            error_message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }

    pub fn data_exists(message: impl Into<String>) -> Self {
        Self::new("data-exists", message)
    }

    pub fn data_missing(message: impl Into<String>) -> Self {
        Self::new("data-missing", message)
    }

    pub fn unknown_element(name: &str) -> Self {
        Self::new(
            "unknown-element",
            format!("Unassigned YANG spec for element \"{name}\""),
        )
    }

    pub fn missing_attribute(attr: &str, message: impl Into<String>) -> Self {
        Self::new("missing-attribute", message).with_app_tag(attr)
    }

    pub fn bad_attribute(attr: &str) -> Self {
        Self::new(
            "bad-attribute",
            format!("Unresolved attribute prefix (no namespace?) on \"{attr}\""),
        )
        .with_app_tag(attr)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        let mut e = Self::new("access-denied", message);
        e.error_type = ErrorType::Protocol;
        e
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new("operation-failed", message)
    }

    fn with_app_tag(mut self, tag: &str) -> Self {
        self.error_app_tag = Some(format!("<bad-attribute>{tag}</bad-attribute>"));
        self
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_tag, self.error_message)
    }
}

/// Enum listing possible errors from the datastore write engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A protocol error: surfaced to the client as an `rpc-error` body.
    #[error("{0}")]
    Protocol(RpcError),

    /// NACM denied the requested action.
    #[error("{0}")]
    Access(RpcError),

    /// A schema-level error: mismatched YANG bindings, absent modules, etc.
    /// Fatal during development; becomes `operation-failed` at runtime.
    #[error("schema error: {0}")]
    Schema(String),

    /// An I/O error while reading or writing a datastore file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The `rpc-error` body to hand back to the client, if this error is
    /// one of the protocol-visible kinds.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            Error::Protocol(e) | Error::Access(e) => Some(e),
            Error::Schema(_) | Error::Io(_) => None,
        }
    }

    pub fn data_exists(message: impl Into<String>) -> Self {
        Error::Protocol(RpcError::data_exists(message))
    }

    pub fn data_missing(message: impl Into<String>) -> Self {
        Error::Protocol(RpcError::data_missing(message))
    }

    pub fn unknown_element(name: &str) -> Self {
        Error::Protocol(RpcError::unknown_element(name))
    }

    pub fn missing_attribute(attr: &str, message: impl Into<String>) -> Self {
        Error::Protocol(RpcError::missing_attribute(attr, message))
    }

    pub fn bad_attribute(attr: &str) -> Self {
        Error::Protocol(RpcError::bad_attribute(attr))
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Error::Access(RpcError::access_denied(message))
    }
}
