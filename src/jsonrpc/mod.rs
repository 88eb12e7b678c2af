//! JSON-RPC method dispatch
//!
//! ## 主要コンポーネント
//!
//! - [`handler`]: handler groups, calling shapes and type-erased descriptors
//! - [`registry`]: qualified name -> descriptor map, built from group graphs
//! - [`invoker`]: resolution, parameter decoding and error normalisation
//! - [`codec`]: single/batch request decoding and response encoding
//! - [`tcp`], [`stdio`]: transports driving the invoker over a byte stream
//!
//! ## 使用例
//!
//! ```rust
//! use std::sync::Arc;
//! use jrpc::jsonrpc::{Context, Invoker, MethodRegistry};
//! use jrpc::services::Greeter;
//!
//! let mut registry = MethodRegistry::new();
//! registry.register(Arc::new(Greeter::new()), &[]).unwrap();
//!
//! let invoker = Invoker::new(registry);
//! let reply = invoker
//!     .handle_bytes(&Context::background(), br#"{"id":3,"method":"Main.Info.Get"}"#)
//!     .unwrap();
//! assert_eq!(reply, br#"{"id":3,"result":"example"}"#);
//! ```

pub mod codec;
pub mod connection;
pub mod context;
pub mod error;
pub mod framing;
pub mod handler;
pub mod invoker;
pub mod registry;
pub mod stdio;
pub mod tcp;
pub mod types;

pub use codec::{Incoming, Outgoing};
pub use connection::{serve_connection, ServeOptions};
pub use context::{CancelHandle, Context, ContextError};
pub use error::{CodecError, IntoRpcError, RegistryError, StructuredError, TransportError};
pub use framing::Framing;
pub use handler::{
    HandlerDescriptor, HandlerGroup, HasAliasName, HasChildren, OperationSet, Operations, Signature,
};
pub use invoker::{CodePolicy, DispatchOptions, Invoker, INTROSPECTION_METHOD};
pub use registry::MethodRegistry;
pub use stdio::StdioServer;
pub use tcp::TcpServer;
pub use types::{ErrorCode, Request, Response, RpcError};
