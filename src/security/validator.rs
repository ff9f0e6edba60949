//! Request admission policy.
//!
//! # Rules
//! ```text
//! limitation off                      → Allowed
//! method not in allowed set           → Denied
//! eth_getBalance / eth_getTransactionReceipt
//!                                     → Allowed
//! eth_call / eth_estimateGas          → params[0].to in contract whitelist
//! eth_sendRawTransaction              → decoded destination in contract whitelist
//! anything else                       → Denied
//! ```
//!
//! Being in the allowed-method set is necessary but not sufficient: a method
//! without a rule above is refused.

use std::collections::HashSet;

use crate::http::request::{Params, RequestData};
use crate::security::raw_tx;
use crate::security::types::{DecodeError, DenyReason, Verdict};

/// Compiled whitelist tables for admission control.
#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    method_limitation_enabled: bool,
    allowed_methods: HashSet<String>,
    /// Lowercase hex addresses.
    contract_whitelist: HashSet<String>,
}

impl RequestValidator {
    /// Compile the method and contract lists into lookup sets.
    pub fn new<M, C>(method_limitation_enabled: bool, allowed_methods: M, contract_whitelist: C) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            method_limitation_enabled,
            allowed_methods: allowed_methods.into_iter().map(Into::into).collect(),
            contract_whitelist: contract_whitelist
                .into_iter()
                .map(|address| normalize_address(address.as_ref()))
                .collect(),
        }
    }

    pub fn method_limitation_enabled(&self) -> bool {
        self.method_limitation_enabled
    }

    /// Case-sensitive membership in the allowed-method set.
    pub fn is_allowed_method(&self, method: &str) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Case-insensitive membership in the contract whitelist.
    pub fn in_whitelist(&self, address: &str) -> bool {
        self.contract_whitelist.contains(&normalize_address(address))
    }

    pub fn allowed_method_count(&self) -> usize {
        self.allowed_methods.len()
    }

    pub fn whitelist_len(&self) -> usize {
        self.contract_whitelist.len()
    }

    /// Classify a request against the policy.
    pub fn validate(&self, req: &RequestData) -> Verdict {
        if !self.method_limitation_enabled {
            return Verdict::Allowed;
        }

        if !self.is_allowed_method(&req.method) {
            return Verdict::Denied(DenyReason::MethodNotAllowed);
        }

        let checked = match req.method.as_str() {
            "eth_getBalance" | "eth_getTransactionReceipt" => return Verdict::Allowed,
            "eth_call" | "eth_estimateGas" => self.check_call(&req.params),
            "eth_sendRawTransaction" => self.check_raw_transaction(&req.params),
            _ => return Verdict::Denied(DenyReason::Unsupported),
        };

        match checked {
            Ok(None) => Verdict::Allowed,
            Ok(Some(reason)) => Verdict::Denied(reason),
            Err(err) => Verdict::DecodeError(err),
        }
    }

    fn check_call(&self, params: &Params) -> Result<Option<DenyReason>, DecodeError> {
        let to = params.string_field(0, "to")?;
        Ok(self.contract_verdict(to))
    }

    fn check_raw_transaction(&self, params: &Params) -> Result<Option<DenyReason>, DecodeError> {
        let raw = params.string(0)?;
        match raw_tx::destination(raw)? {
            Some(to) => Ok(self.contract_verdict(&alloy::hex::encode_prefixed(to))),
            None => Ok(Some(DenyReason::ContractCreation)),
        }
    }

    fn contract_verdict(&self, to: &str) -> Option<DenyReason> {
        if self.in_whitelist(to) {
            None
        } else {
            Some(DenyReason::ContractNotWhitelisted)
        }
    }
}

fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
