//! Destination recovery for `eth_sendRawTransaction` payloads.
//!
//! # Pipeline
//! ```text
//! "0x..." hex string
//!     → hex decode (0x prefix required)
//!     → first byte > 0x7f: legacy RLP list, walked item by item
//!       first byte <= 0x7f: EIP-2718 typed envelope via alloy
//!     → destination field (index 3 for legacy)
//! ```
//!
//! Each stage returns a [`DecodeError`]; the decoder never indexes past the
//! input or panics on adversarial bytes.

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::Address;
use alloy::rlp::Header;

use crate::security::types::DecodeError;

/// Index of the destination field in a legacy transaction list.
const DESTINATION_INDEX: usize = 3;

/// Legacy list with the signature components nested in a single list.
const COMPACT_FIELD_COUNT: usize = 7;

/// Canonical legacy list with flat `v`, `r`, `s`.
const CANONICAL_FIELD_COUNT: usize = 9;

/// Number of leading scalar fields (nonce, gas price, gas limit, to, value, data).
const SCALAR_FIELD_COUNT: usize = 6;

/// Recover the destination of a hex-encoded signed transaction.
///
/// Returns `Ok(None)` for contract creation (empty destination).
pub fn destination(raw: &str) -> Result<Option<Address>, DecodeError> {
    let bytes = decode_hex(raw)?;
    let first = *bytes.first().ok_or(DecodeError::EmptyTransaction)?;

    if first > 0x7f {
        legacy_destination(&bytes)
    } else {
        typed_destination(&bytes)
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(DecodeError::MissingHexPrefix)?;
    Ok(alloy::hex::decode(digits)?)
}

/// A single RLP item borrowed from the input.
struct Item<'a> {
    list: bool,
    payload: &'a [u8],
}

fn next_item<'a>(buf: &mut &'a [u8]) -> Result<Item<'a>, DecodeError> {
    let header = Header::decode(buf)?;
    // Header::decode guarantees at least `payload_length` bytes remain.
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(Item {
        list: header.list,
        payload,
    })
}

fn legacy_destination(bytes: &[u8]) -> Result<Option<Address>, DecodeError> {
    let mut buf = bytes;
    let envelope = next_item(&mut buf)?;
    if !envelope.list {
        return Err(DecodeError::NotAList);
    }
    if !buf.is_empty() {
        return Err(DecodeError::TrailingBytes);
    }

    let mut payload = envelope.payload;
    let mut fields = Vec::with_capacity(CANONICAL_FIELD_COUNT);
    while !payload.is_empty() {
        fields.push(next_item(&mut payload)?);
    }

    match fields.len() {
        COMPACT_FIELD_COUNT => {
            if !fields[SCALAR_FIELD_COUNT].list {
                return Err(DecodeError::FieldType(SCALAR_FIELD_COUNT));
            }
        }
        CANONICAL_FIELD_COUNT => {
            if let Some(index) = fields[SCALAR_FIELD_COUNT..]
                .iter()
                .position(|field| field.list)
            {
                return Err(DecodeError::FieldType(SCALAR_FIELD_COUNT + index));
            }
        }
        count => return Err(DecodeError::FieldCount(count)),
    }

    if let Some(index) = fields[..SCALAR_FIELD_COUNT].iter().position(|field| field.list) {
        return Err(DecodeError::FieldType(index));
    }

    let to = fields[DESTINATION_INDEX].payload;
    match to.len() {
        0 => Ok(None),
        20 => Ok(Some(Address::from_slice(to))),
        len => Err(DecodeError::AddressLength(len)),
    }
}

fn typed_destination(bytes: &[u8]) -> Result<Option<Address>, DecodeError> {
    let mut buf = bytes;
    let envelope = TxEnvelope::decode_2718(&mut buf)
        .map_err(|e| DecodeError::TypedTransaction(e.to_string()))?;
    if !buf.is_empty() {
        return Err(DecodeError::TrailingBytes);
    }
    Ok(envelope.to())
}
