//! Inbound JSON-RPC envelope parsing.
//!
//! # Responsibilities
//! - Parse the request body once into [`RequestData`]
//! - Expose positional parameters through fallible, shape-checked accessors
//! - Recover a best-effort id from bodies that fail to parse
//!
//! # Design Decisions
//! - The original body bytes are what gets forwarded; `RequestData` is only
//!   consulted for admission control
//! - Missing or `null` envelope fields default (empty method, id 0, no
//!   params); present fields of the wrong type are a decode failure

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::security::types::DecodeError;

/// Id used in error responses when none can be recovered.
pub const DEFAULT_ID: i64 = 0;

/// A parsed JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RequestData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jsonrpc: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Params,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequestData {
    /// Parse a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Ordered, heterogeneous positional parameters.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Params(Vec<Value>);

impl Params {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Value, DecodeError> {
        self.0.get(index).ok_or(DecodeError::MissingParam(index))
    }

    /// Parameter `index` as a JSON object.
    pub fn object(&self, index: usize) -> Result<&Map<String, Value>, DecodeError> {
        self.get(index)?.as_object().ok_or(DecodeError::ParamShape {
            index,
            expected: "an object",
        })
    }

    /// Parameter `index` as a string.
    pub fn string(&self, index: usize) -> Result<&str, DecodeError> {
        self.get(index)?.as_str().ok_or(DecodeError::ParamShape {
            index,
            expected: "a string",
        })
    }

    /// String field `field` of the object at parameter `index`.
    pub fn string_field(&self, index: usize, field: &'static str) -> Result<&str, DecodeError> {
        self.object(index)?
            .get(field)
            .ok_or(DecodeError::MissingField(field))?
            .as_str()
            .ok_or(DecodeError::FieldShape {
                field,
                expected: "a string",
            })
    }
}

/// Recover the numeric id of a body that failed to parse as [`RequestData`].
pub fn best_effort_id(body: &[u8]) -> i64 {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("id").and_then(Value::as_i64))
        .unwrap_or(DEFAULT_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let body = br#"{"jsonrpc":"2.0","id":7,"method":"eth_call","params":[{"to":"0x01"},"latest"]}"#;
        let req = RequestData::from_slice(body).unwrap();

        assert_eq!(req.jsonrpc, "2.0");
        assert_eq!(req.id, 7);
        assert_eq!(req.method, "eth_call");
        assert_eq!(req.params.len(), 2);
        assert_eq!(req.params.string_field(0, "to").unwrap(), "0x01");
        assert_eq!(req.params.string(1).unwrap(), "latest");
    }

    #[test]
    fn test_missing_fields_default() {
        let req = RequestData::from_slice(br#"{"method":"eth_blockNumber"}"#).unwrap();
        assert_eq!(req.id, DEFAULT_ID);
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_null_fields_default() {
        let req = RequestData::from_slice(
            br#"{"jsonrpc":null,"id":null,"method":"eth_blockNumber","params":null}"#,
        )
        .unwrap();
        assert_eq!(req.jsonrpc, "");
        assert_eq!(req.id, DEFAULT_ID);
        assert_eq!(req.method, "eth_blockNumber");
        assert!(req.params.is_empty());

        let req = RequestData::from_slice(br#"{"id":3,"method":null}"#).unwrap();
        assert_eq!(req.id, 3);
        assert!(req.method.is_empty());
    }

    #[test]
    fn test_malformed_envelopes() {
        let bodies: [&[u8]; 5] = [
            b"not json",
            br#"{"id":"abc","method":"eth_call"}"#,
            br#"{"id":1,"method":42}"#,
            br#"{"id":1,"method":"eth_call","params":{"to":"0x01"}}"#,
            br#"[{"id":1}]"#,
        ];
        for body in bodies {
            let err = RequestData::from_slice(body).unwrap_err();
            assert!(matches!(err, DecodeError::Envelope(_)));
        }
    }

    #[test]
    fn test_param_accessors() {
        let params = Params::new(vec![json!({ "to": 5 }), json!(1)]);

        assert!(matches!(params.get(2), Err(DecodeError::MissingParam(2))));
        assert!(matches!(params.object(1), Err(DecodeError::ParamShape { index: 1, .. })));
        assert!(matches!(params.string(0), Err(DecodeError::ParamShape { index: 0, .. })));
        assert!(matches!(
            params.string_field(0, "to"),
            Err(DecodeError::FieldShape { field: "to", .. })
        ));
        assert!(matches!(
            params.string_field(0, "from"),
            Err(DecodeError::MissingField("from"))
        ));
    }

    #[test]
    fn test_best_effort_id() {
        assert_eq!(best_effort_id(br#"{"id":12,"method":5}"#), 12);
        assert_eq!(best_effort_id(br#"{"id":"x"}"#), DEFAULT_ID);
        assert_eq!(best_effort_id(b"{broken"), DEFAULT_ID);
    }
}
