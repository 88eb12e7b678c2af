use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::codec::{self, Incoming, Outgoing};
use super::context::Context;
use super::error::{CodecError, IntoRpcError};
use super::handler::{HandlerDescriptor, Invocation, Signature};
use super::registry::MethodRegistry;
use super::types::{ErrorCode, Request, Response, RpcError};

/// Reserved method listing every registered qualified name
pub const INTROSPECTION_METHOD: &str = "Methods";

/// Which codes the dispatcher itself uses for protocol faults
///
/// Selectable on the command line as `--code-policy compat|distinct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CodePolicy {
    /// Every protocol fault is reported as `-32601`
    #[default]
    Compat,
    /// Not found `-32601`, bad params `-32602`, bad handler shape `-32603`
    Distinct,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub code_policy: CodePolicy,
}

/// Kinds of fault the dispatcher reports on its own behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolFault {
    NotFound,
    BadShape,
    BadParams,
}

impl CodePolicy {
    fn code_for(self, fault: ProtocolFault) -> i32 {
        match (self, fault) {
            (CodePolicy::Compat, _) | (CodePolicy::Distinct, ProtocolFault::NotFound) => {
                ErrorCode::MethodNotFound.code()
            }
            (CodePolicy::Distinct, ProtocolFault::BadParams) => ErrorCode::InvalidParams.code(),
            (CodePolicy::Distinct, ProtocolFault::BadShape) => ErrorCode::InternalError.code(),
        }
    }
}

/// Resolves requests against a frozen [`MethodRegistry`] and runs them
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Invoker {
    registry: Arc<MethodRegistry>,
    options: DispatchOptions,
}

impl Invoker {
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_options(registry, DispatchOptions::default())
    }

    pub fn with_options(registry: MethodRegistry, options: DispatchOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Dispatch one request; never fails, faults come back inside the response
    pub fn dispatch(&self, ctx: &Context, request: &Request) -> Response {
        if request.method == INTROSPECTION_METHOD {
            return Response::success(request, Value::from(self.registry.list_names()));
        }

        let Some(descriptor) = self.registry.lookup(&request.method) else {
            warn!("Method not found: {}", request.method);
            return self.fault(
                request,
                ProtocolFault::NotFound,
                format!("method not found: {}", request.method),
            );
        };

        if let Err(message) = validate(descriptor) {
            warn!("Rejecting call to {}: {}", request.method, message);
            return self.fault(request, ProtocolFault::BadShape, message);
        }

        debug!("Dispatching {} (id {})", request.method, request.id);

        match descriptor.invoke(ctx, request.params.as_ref()) {
            Invocation::Decode(err) => {
                debug!("Params for {} did not decode: {}", request.method, err);
                self.fault(request, ProtocolFault::BadParams, err.to_string())
            }
            Invocation::Returned(Ok(result)) => Response::success(request, result),
            Invocation::Returned(Err(error)) => Response::error(request, error),
        }
    }

    /// Dispatch a batch in order, one response per request
    pub fn dispatch_batch(&self, ctx: &Context, requests: &[Request]) -> Vec<Response> {
        requests
            .iter()
            .map(|request| self.dispatch(ctx, request))
            .collect()
    }

    /// Dispatch a decoded submission, keeping its single/batch form
    pub fn dispatch_incoming(&self, ctx: &Context, incoming: &Incoming) -> Outgoing {
        match incoming {
            Incoming::Single(request) => Outgoing::Single(self.dispatch(ctx, request)),
            Incoming::Batch(requests) => Outgoing::Batch(self.dispatch_batch(ctx, requests)),
        }
    }

    /// Bytes in, bytes out
    ///
    /// Fails only when the payload cannot be decoded at all (empty or
    /// malformed); there is no id to correlate an error response with.
    pub fn handle_bytes(&self, ctx: &Context, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        let incoming = codec::decode(payload)?;
        let outgoing = self.dispatch_incoming(ctx, &incoming);
        codec::encode(&outgoing)
    }

    fn fault(&self, request: &Request, fault: ProtocolFault, message: String) -> Response {
        let code = self.options.code_policy.code_for(fault);
        Response::error(request, RpcError::new(code, message, None))
    }
}

/// Check the declared calling and return shape of a descriptor
fn validate(descriptor: &HandlerDescriptor) -> Result<(), String> {
    let signature = descriptor.signature();
    if signature.inputs > Signature::MAX_INPUTS {
        return Err(format!(
            "bad arity: {} takes {} call-time arguments, at most {} are supported",
            descriptor.name(),
            signature.inputs,
            Signature::MAX_INPUTS
        ));
    }
    if signature.outputs != Signature::OUTPUTS {
        return Err(format!(
            "bad return shape: {} returns {} values, expected (result, error)",
            descriptor.name(),
            signature.outputs
        ));
    }
    Ok(())
}

/// Decode a raw parameter payload; absent/`null` gives the default value
pub(crate) fn decode_params<P>(raw: Option<&Value>) -> Result<P, serde_json::Error>
where
    P: DeserializeOwned + Default,
{
    match raw {
        None | Some(Value::Null) => Ok(P::default()),
        Some(value) => P::deserialize(value),
    }
}

/// Normalise a handler's `(result, error)` return
pub(crate) fn settle<R, E>(returned: Result<R, E>) -> Result<Value, RpcError>
where
    R: Serialize,
    E: IntoRpcError,
{
    match returned {
        Ok(result) => serde_json::to_value(result).map_err(|err| {
            RpcError::new(
                ErrorCode::InternalError.code(),
                format!("failed to encode result: {}", err),
                None,
            )
        }),
        Err(err) => Err(err.into_rpc_error()),
    }
}
