//! Admission verdicts and decode failure types.

use thiserror::Error;

/// Malformed input at any parsing boundary.
///
/// Every decode stage (envelope JSON, parameter shape, hex, RLP) reports its
/// failure through this type; nothing in the admission path panics on
/// adversarial input.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Request body is not a valid JSON-RPC envelope.
    #[error("decode error: invalid request envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// Positional parameter is absent.
    #[error("decode error: missing parameter {0}")]
    MissingParam(usize),

    /// Positional parameter has the wrong JSON type.
    #[error("decode error: parameter {index} must be {expected}")]
    ParamShape { index: usize, expected: &'static str },

    /// Object parameter lacks a required field.
    #[error("decode error: missing field `{0}`")]
    MissingField(&'static str),

    /// Object field has the wrong JSON type.
    #[error("decode error: field `{field}` must be {expected}")]
    FieldShape { field: &'static str, expected: &'static str },

    /// Raw transaction is not `0x`-prefixed.
    #[error("decode error: hex string without 0x prefix")]
    MissingHexPrefix,

    /// Raw transaction contains invalid hex.
    #[error("decode error: invalid hex: {0}")]
    Hex(#[from] alloy::hex::FromHexError),

    /// Raw transaction decoded to zero bytes.
    #[error("decode error: empty transaction")]
    EmptyTransaction,

    /// Malformed RLP item header or truncated payload.
    #[error("decode error: invalid rlp: {0}")]
    Rlp(#[from] alloy::rlp::Error),

    /// Top-level RLP item is a string, not a list.
    #[error("decode error: transaction is not an rlp list")]
    NotAList,

    /// Bytes remain after the transaction payload.
    #[error("decode error: trailing bytes after transaction")]
    TrailingBytes,

    /// Transaction list has an unexpected number of fields.
    #[error("decode error: expected 7 or 9 transaction fields, got {0}")]
    FieldCount(usize),

    /// A transaction field is a list where a string is required, or vice versa.
    #[error("decode error: transaction field {0} has the wrong rlp type")]
    FieldType(usize),

    /// Destination field is neither empty nor 20 bytes.
    #[error("decode error: destination must be 20 bytes, got {0}")]
    AddressLength(usize),

    /// EIP-2718 typed envelope failed to decode.
    #[error("decode error: invalid typed transaction: {0}")]
    TypedTransaction(String),
}

/// Why a well-formed request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("not allowed method")]
    MethodNotAllowed,

    #[error("contract not in whitelist")]
    ContractNotWhitelisted,

    #[error("contract creation not allowed")]
    ContractCreation,

    /// Method passed the allow list but has no admission rule.
    #[error("method not supported by gateway policy")]
    Unsupported,
}

/// Outcome of admission control for a single request.
#[derive(Debug)]
pub enum Verdict {
    Allowed,
    Denied(DenyReason),
    DecodeError(DecodeError),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Denied(_))
    }

    pub fn is_decode_error(&self) -> bool {
        matches!(self, Verdict::DecodeError(_))
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Denied(_) => "denied",
            Verdict::DecodeError(_) => "decode_error",
        }
    }
}

impl From<DecodeError> for Verdict {
    fn from(err: DecodeError) -> Self {
        Verdict::DecodeError(err)
    }
}
