//! Transport abstraction for roomsync.
//!
//! This module provides a pluggable transport layer that abstracts the
//! request/response exchange with the room service (HTTP, mock for testing).
//!
//! # Design
//!
//! The transport is request-oriented: one [`Transport::get`] call per page.
//! It owns everything about the wire (URL prefix, authentication headers,
//! timeouts) and returns the decoded [`ApiResponse`] envelope. Interpreting
//! the envelope's `code` is left to the caller.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_response(ApiResponse::ok(page_json));
//! let response = transport.get(&ApiRequest::get("/v1/rooms/r1/users")).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpTransport, HttpTransportConfig};
pub use mock::MockTransport;

use async_trait::async_trait;
use roomsync_types::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request could not be completed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Response body was not a valid envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transport could not be built from its configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// No response arrived in time.
    #[error("request timeout")]
    Timeout,

    /// Connection closed before a response arrived.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Transport trait for issuing listing requests.
///
/// Implementations handle the underlying exchange (HTTPS, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET and return the decoded envelope.
    ///
    /// A non-success `code` inside a well-formed envelope is not a transport
    /// error; it is returned as-is.
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
