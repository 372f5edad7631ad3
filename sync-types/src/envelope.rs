//! Request/response envelope for the room listing service.
//!
//! Every response carries a numeric `code` (0 = success), a human-readable
//! `msg`, and an endpoint-specific `data` payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::WireError;

/// The `code` value of a successful response.
pub const SUCCESS_CODE: i64 = 0;

/// One logical GET against the listing service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Path relative to the service prefix (e.g. `/v1/rooms/r1/users`).
    pub path: String,
    /// Query parameters, in the order they are sent.
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a request for the given path with no query parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up the first value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Decoded response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Status code (0 = success).
    pub code: i64,
    /// Server message, meaningful on failure.
    #[serde(default)]
    pub msg: String,
    /// Endpoint-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Server timestamp, when the envelope carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

impl ApiResponse {
    /// Build a successful response around a payload.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            code: SUCCESS_CODE,
            msg: "Success".into(),
            data,
            ts: None,
        }
    }

    /// Build a failure response.
    pub fn rejected(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: serde_json::Value::Null,
            ts: None,
        }
    }

    /// Check if the server reported success.
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Decode the payload, surfacing non-success as [`WireError::Rejected`].
    pub fn into_data<D: DeserializeOwned>(self) -> Result<D, WireError> {
        if !self.is_success() {
            return Err(WireError::Rejected {
                code: self.code,
                message: self.msg,
            });
        }
        serde_json::from_value(self.data).map_err(WireError::Deserialization)
    }

    /// Parse an envelope from a JSON body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(WireError::Deserialization)
    }

    /// Encode the envelope as a JSON body.
    pub fn to_vec(&self) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(self).map_err(WireError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_params_keep_order() {
        let req = ApiRequest::get("/v1/rooms/r1/users")
            .with_param("count", 1000)
            .with_param("nextId", "c1");
        assert_eq!(req.param("count"), Some("1000"));
        assert_eq!(req.param("nextId"), Some("c1"));
        assert_eq!(req.param("missing"), None);
        assert_eq!(req.query[0].0, "count");
    }

    #[test]
    fn rejected_response_surfaces_message() {
        let resp = ApiResponse::rejected(30403100, "token expired");
        let err = resp.into_data::<serde_json::Value>().unwrap_err();
        match err {
            WireError::Rejected { code, message } => {
                assert_eq!(code, 30403100);
                assert_eq!(message, "token expired");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn envelope_parses_missing_optional_fields() {
        let resp = ApiResponse::from_slice(br#"{"code":0}"#).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.msg, "");
        assert_eq!(resp.data, serde_json::Value::Null);
    }

    #[test]
    fn ok_response_decodes_payload() {
        let resp = ApiResponse::ok(json!({"n": 3}));
        let data: serde_json::Value = resp.into_data().unwrap();
        assert_eq!(data["n"], 3);
    }
}
