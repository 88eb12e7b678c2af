//! jrpc - JSON-RPC method dispatch
//!
//! Handler groups register their operations under dotted, hierarchical
//! names; an [`Invoker`] resolves incoming requests (single or batch)
//! against the frozen registry and normalises every outcome into a
//! JSON-RPC response.

pub mod jsonrpc;
pub mod services;

// 公開API
pub use jsonrpc::{
    CodePolicy, Context, DispatchOptions, HandlerGroup, Invoker, MethodRegistry, Request, Response,
    RpcError,
};
