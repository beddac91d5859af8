// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the hierarchical error system for the event pipeline
//! domain. Errors are organized into logical categories so that callers can
//! handle them systematically while logs retain the full detail.
//!
//! ## Error Categories
//!
//! ### Ingress Errors
//! - **Unavailable**: The processor has been closed
//! - **BadRequest**: A notify/forward precondition was violated
//! - **InternalLoop**: This processor already appears in a forwarded event's
//!   audit trail
//!
//! ### Construction Errors
//! - **BuildError**: Stack construction failures (unknown class, missing
//!   service, duplicate names) - never surfaced to runtime clients
//! - **InvalidConfiguration**: Malformed or missing configuration settings
//!
//! ### Runtime Errors
//! - **PluginError**: Action plugin failures, surfaced only to the module
//!   layer which converts them into the module's `onError` action
//! - **ValidationError**: Event data validation failures
//!
//! ### Infrastructure Errors
//! - **IoError**: File system failures
//! - **SerializationError**: JSON/TOML encoding and decoding failures
//! - **NotFound**: A named resource (stack, catalog entry) is absent
//! - **InternalError**: Unexpected system failures
//!
//! ## Propagation Policy
//!
//! Construction-time errors fail fast: no partial processor starts. Ingress
//! errors return to the caller with a low-cardinality kind; detail goes to
//! the log together with the peer identity. Runtime plugin errors never
//! bubble past the stack engine.

use thiserror::Error;

/// Domain-specific errors for the event processing system.
///
/// Each variant includes a descriptive message and is designed to provide
/// clear information about what went wrong and potentially how to fix it.
#[derive(Error, Debug, Clone)]
pub enum EventError {
    #[error("event processor unavailable")]
    Unavailable,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forward loop detected: {0}")]
    InternalLoop(String),

    #[error("build error: {0}")]
    BuildError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("plugin error: {0}")]
    PluginError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl EventError {
    /// Creates a new bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Creates a new forward loop error
    pub fn internal_loop(msg: impl Into<String>) -> Self {
        Self::InternalLoop(msg.into())
    }

    /// Creates a new build error
    pub fn build_error(msg: impl Into<String>) -> Self {
        Self::BuildError(msg.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new plugin error
    pub fn plugin_error(msg: impl Into<String>) -> Self {
        Self::PluginError(msg.into())
    }

    /// Creates a new validation error
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Creates a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Checks if the error is an ingress rejection (client-visible)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EventError::Unavailable | EventError::BadRequest(_) | EventError::InternalLoop(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            EventError::Unavailable => "unavailable",
            EventError::BadRequest(_) => "bad-request",
            EventError::InternalLoop(_) => "forward-loop",
            EventError::BuildError(_) => "build",
            EventError::InvalidConfiguration(_) => "configuration",
            EventError::PluginError(_) => "plugin",
            EventError::ValidationError(_) => "validation",
            EventError::NotFound(_) => "not-found",
            EventError::IoError(_) => "io",
            EventError::SerializationError(_) => "serialization",
            EventError::InternalError(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        EventError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(EventError::Unavailable.category(), "unavailable");
        assert_eq!(EventError::bad_request("x").category(), "bad-request");
        assert_eq!(EventError::build_error("x").category(), "build");
        assert_eq!(EventError::plugin_error("x").category(), "plugin");
    }

    #[test]
    fn test_is_rejection() {
        assert!(EventError::Unavailable.is_rejection());
        assert!(EventError::bad_request("id not empty").is_rejection());
        assert!(EventError::internal_loop("self in trail").is_rejection());
        assert!(!EventError::build_error("unknown class").is_rejection());
        assert!(!EventError::plugin_error("exec failed").is_rejection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EventError = io_err.into();
        assert!(matches!(err, EventError::IoError(_)));
    }
}
