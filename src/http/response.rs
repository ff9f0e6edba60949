//! Response construction.
//!
//! # Responsibilities
//! - Pass successful upstream payloads through byte for byte
//! - Build the fixed-shape JSON-RPC error object for gateway failures
//!
//! # Design Decisions
//! - Error responses are HTTP 200 with a JSON-RPC `error` object
//! - Upstream URLs never appear in client-facing messages

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;

/// JSON-RPC error codes used by the gateway.
pub mod codes {
    /// Invalid input: parse failures, decode failures and policy denials.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Upstream dispatch failed.
    pub const INTERNAL_ERROR: i64 = -32603;
}

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Fixed error wire shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub error: ErrorObject,
}

impl ErrorResponse {
    pub fn new(id: i64, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error: ErrorObject {
                code,
                message: message.into(),
            },
        }
    }

    pub fn invalid_params(id: i64, message: impl Into<String>) -> Self {
        Self::new(id, codes::INVALID_PARAMS, message)
    }

    pub fn internal(id: i64, message: impl Into<String>) -> Self {
        Self::new(id, codes::INTERNAL_ERROR, message)
    }

    pub fn to_bytes(&self) -> Bytes {
        // Serializing a struct of strings and integers cannot fail.
        serde_json::to_vec(self).map(Bytes::from).unwrap_or_default()
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        json_response(self.to_bytes())
    }
}

/// Wrap raw JSON bytes in a 200 response without touching them.
pub fn json_response(body: Bytes) -> Response {
    let mut response = (StatusCode::OK, Body::from(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
