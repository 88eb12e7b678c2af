use serde_json::Value;
use std::fmt::Display;

use super::types::{ErrorCode, RpcError};

/// Result type for registration
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registration errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("children provider of `{group}` failed: {source}")]
    Children {
        group: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Faults raised before any request could be correlated
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("request body is empty")]
    Empty,

    #[error("malformed request: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("framing error: {0}")]
    Framing(String),

    #[error("dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An error that carries its own code and optional data
///
/// Implement this for domain errors that should reach the caller with a
/// specific code instead of the generic handler fault.
pub trait StructuredError: Display {
    fn code(&self) -> i32;

    fn message(&self) -> String {
        self.to_string()
    }

    fn data(&self) -> Option<Value> {
        None
    }
}

/// Conversion applied to the error half of a handler's return value
///
/// Precedence: an `RpcError` is used verbatim, a [`StructuredError`] keeps
/// its code, message and data, and any other error becomes a generic
/// handler fault (code 500) carrying its display text.
pub trait IntoRpcError {
    fn into_rpc_error(self) -> RpcError;
}

impl StructuredError for RpcError {
    fn code(&self) -> i32 {
        self.code
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn data(&self) -> Option<Value> {
        self.data.clone()
    }
}

impl<T: StructuredError> IntoRpcError for T {
    fn into_rpc_error(self) -> RpcError {
        RpcError {
            code: self.code(),
            message: self.message(),
            data: self.data(),
        }
    }
}

/// Wrap any displayable error as a handler fault
pub fn handler_fault(err: impl Display) -> RpcError {
    RpcError::new(ErrorCode::HandlerFault.code(), err.to_string(), None)
}

impl IntoRpcError for anyhow::Error {
    fn into_rpc_error(self) -> RpcError {
        match self.downcast::<RpcError>() {
            Ok(rpc) => rpc,
            Err(other) => handler_fault(other),
        }
    }
}

impl IntoRpcError for Box<dyn std::error::Error + Send + Sync> {
    fn into_rpc_error(self) -> RpcError {
        match self.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => handler_fault(other),
        }
    }
}

impl IntoRpcError for std::io::Error {
    fn into_rpc_error(self) -> RpcError {
        handler_fault(self)
    }
}

impl IntoRpcError for serde_json::Error {
    fn into_rpc_error(self) -> RpcError {
        handler_fault(self)
    }
}

impl IntoRpcError for String {
    fn into_rpc_error(self) -> RpcError {
        handler_fault(self)
    }
}

impl IntoRpcError for &'static str {
    fn into_rpc_error(self) -> RpcError {
        handler_fault(self)
    }
}

/// Handlers that cannot fail
impl IntoRpcError for std::convert::Infallible {
    fn into_rpc_error(self) -> RpcError {
        match self {}
    }
}
