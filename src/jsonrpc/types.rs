use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC request as received on the wire
///
/// `jsonrpc` and `id` are opaque: whatever the caller sent is echoed back
/// untouched on the matching response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Request {
    /// Protocol version tag (not validated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Value>,

    /// Correlation id (any scalar or null)
    #[serde(default)]
    pub id: Value,

    /// Qualified method name, e.g. `Main.Info.Get`
    pub method: String,

    /// Raw parameter payload. `null` and a missing field both end up as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Echoed protocol version tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Value>,

    /// Echoed correlation id
    #[serde(default)]
    pub id: Value,

    /// Result value (omitted when `error` is present). A `null` result is
    /// still `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,

    /// Error object (omitted on success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
///
/// Every handler failure is normalised into this shape before it reaches
/// the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct RpcError {
    /// Error type indicator
    pub code: i32,

    /// Short error description
    pub message: String,

    /// Additional error information (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Pre-defined JSON-RPC error codes, plus the generic handler fault code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    HandlerFault = 500,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::HandlerFault => "Handler fault",
        }
    }
}

/// A field that is present maps to `Some`, even when it holds `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Request {
    /// Create a new request tagged `"2.0"`
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Value) -> Self {
        Self {
            jsonrpc: Some(Value::String("2.0".to_string())),
            id,
            method: method.into(),
            params,
        }
    }
}

impl Response {
    /// Create a success response correlated with `request`
    pub fn success(request: &Request, result: Value) -> Self {
        Self {
            jsonrpc: request.jsonrpc.clone(),
            id: request.id.clone(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response correlated with `request`
    pub fn error(request: &Request, error: RpcError) -> Self {
        Self {
            jsonrpc: request.jsonrpc.clone(),
            id: request.id.clone(),
            result: None,
            error: Some(error),
        }
    }

    /// Error reply with a null id, for payloads that could not be decoded
    pub fn uncorrelated(error: RpcError) -> Self {
        Self {
            jsonrpc: Some(Value::String("2.0".to_string())),
            id: Value::Null,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// Error carrying the standard message for `code`
    pub fn from_code(code: ErrorCode, data: Option<Value>) -> Self {
        Self::new(code.code(), code.message(), data)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_version_or_params() {
        let request: Request = serde_json::from_str(r#"{"id":3,"method":"Main.Info.Get"}"#).unwrap();

        assert_eq!(request.jsonrpc, None);
        assert_eq!(request.id, json!(3));
        assert_eq!(request.method, "Main.Info.Get");
        assert_eq!(request.params, None);
    }

    #[test]
    fn test_null_params_is_absent() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"a","method":"x","params":null}"#).unwrap();

        assert_eq!(request.params, None);
        assert_eq!(request.jsonrpc, Some(json!("2.0")));
    }

    #[test]
    fn test_missing_id_is_null() {
        let request: Request = serde_json::from_str(r#"{"method":"x"}"#).unwrap();
        assert_eq!(request.id, Value::Null);
    }

    #[test]
    fn test_response_success() {
        let request = Request::new("sum", None, json!(1));
        let response = Response::success(&request, json!(19));

        let json = serde_json::to_string(&response).unwrap();
        let expected = r#"{"jsonrpc":"2.0","id":1,"result":19}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_response_error_omits_result() {
        let request = Request::new("missing", None, json!("1"));
        let error = RpcError::from_code(ErrorCode::MethodNotFound, None);
        let response = Response::error(&request, error);

        let json = serde_json::to_string(&response).unwrap();
        let expected =
            r#"{"jsonrpc":"2.0","id":"1","error":{"code":-32601,"message":"Method not found"}}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_version_tag_is_echoed_verbatim() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":2,"id":null,"method":"x"}"#).unwrap();
        let response = Response::success(&request, Value::Null);

        assert_eq!(response.jsonrpc, Some(json!(2)));
        assert_eq!(response.id, Value::Null);
    }

    #[test]
    fn test_null_result_stays_a_success() {
        let request = Request::new("x", None, json!(4));
        let response = Response::success(&request, Value::Null);

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":4,"result":null}"#);

        let decoded: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.result, Some(Value::Null));
        assert!(!decoded.is_error());
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_error_response_has_no_result() {
        let decoded: Response =
            serde_json::from_str(r#"{"id":1,"error":{"code":500,"message":"boom"}}"#).unwrap();
        assert_eq!(decoded.result, None);
        assert!(decoded.is_error());
    }

    #[test]
    fn test_rpc_error_display_is_message() {
        let error = RpcError::new(10, "please provide a nickname", None);
        assert_eq!(error.to_string(), "please provide a nickname");
    }
}
