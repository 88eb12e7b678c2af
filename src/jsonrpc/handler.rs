//! Handler groups and the type-erased descriptors built from them
//!
//! A handler group is any `Send + Sync` value that lists its operations
//! through [`HandlerGroup::operations`]. Each operation is registered with
//! one of three calling shapes:
//!
//! - `bare`: `fn(&G) -> Result<R, E>`
//! - `with_context`: `fn(&G, &Context) -> Result<R, E>`
//! - `with_params`: `fn(&G, &Context, P) -> Result<R, E>`
//!
//! where `R: Serialize`, `E: IntoRpcError` and `P: DeserializeOwned + Default`.
//!
//! ```rust
//! use std::sync::Arc;
//! use jrpc::jsonrpc::{Context, HandlerGroup, OperationSet, Operations, RpcError};
//!
//! struct Clock;
//!
//! impl Clock {
//!     fn now(&self, _ctx: &Context) -> Result<u64, RpcError> {
//!         Ok(42)
//!     }
//! }
//!
//! impl HandlerGroup for Clock {
//!     fn operations(self: Arc<Self>) -> OperationSet {
//!         Operations::of(self).with_context("Now", Clock::now).build()
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::context::Context;
use super::error::IntoRpcError;
use super::invoker::{decode_params, settle};
use super::types::RpcError;

/// Capability: register under a custom base name instead of the type name
pub trait HasAliasName {
    fn alias_name(&self) -> String;
}

/// Capability: expose nested handler groups, registered one level deeper
pub trait HasChildren {
    fn children(&self) -> anyhow::Result<Vec<Arc<dyn HandlerGroup>>>;
}

/// A set of operations registered under a common base name
pub trait HandlerGroup: Send + Sync + 'static {
    /// List the operations exposed by this group
    fn operations(self: Arc<Self>) -> OperationSet;

    /// Unqualified Rust type name, used as base name when no alias is given
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn as_alias(&self) -> Option<&dyn HasAliasName> {
        None
    }

    fn as_children(&self) -> Option<&dyn HasChildren> {
        None
    }
}

/// `a::b::Info<c::D>` -> `Info`
pub fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Declared calling/return shape of an operation
///
/// `inputs` counts call-time arguments beyond the owner (context, params);
/// `outputs` counts returned values (result, error-like).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub inputs: usize,
    pub outputs: usize,
}

impl Signature {
    pub const MAX_INPUTS: usize = 2;
    pub const OUTPUTS: usize = 2;

    pub const BARE: Signature = Signature { inputs: 0, outputs: 2 };
    pub const CONTEXT: Signature = Signature { inputs: 1, outputs: 2 };
    pub const CONTEXT_PARAMS: Signature = Signature { inputs: 2, outputs: 2 };

    pub fn expects_params(&self) -> bool {
        self.inputs == Self::MAX_INPUTS
    }
}

/// What happened when an erased operation was called
#[derive(Debug)]
pub enum Invocation {
    /// The parameter payload did not decode into the expected shape
    Decode(serde_json::Error),
    /// The handler ran; its error half is already normalised
    Returned(Result<Value, RpcError>),
}

type ErasedCall = Arc<dyn Fn(&Context, Option<&Value>) -> Invocation + Send + Sync>;
type Owner = Arc<dyn Any + Send + Sync>;

/// One operation of a group, before it receives its qualified name
#[derive(Clone)]
pub struct Operation {
    name: String,
    signature: Signature,
    params_type: Option<&'static str>,
    call: ErasedCall,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Operations of one group together with the owning instance
pub struct OperationSet {
    owner: Owner,
    operations: Vec<Operation>,
}

impl OperationSet {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name())
    }

    /// Attach qualified names, yielding registry entries
    pub(crate) fn into_descriptors<'a>(
        self,
        qualify: impl Fn(&str) -> String + 'a,
    ) -> impl Iterator<Item = HandlerDescriptor> + 'a {
        let owner = self.owner;
        self.operations.into_iter().map(move |op| HandlerDescriptor {
            name: qualify(&op.name),
            owner: owner.clone(),
            signature: op.signature,
            params_type: op.params_type,
            call: op.call,
        })
    }
}

/// Builder for an [`OperationSet`]
pub struct Operations<G> {
    owner: Arc<G>,
    operations: Vec<Operation>,
}

impl<G: Send + Sync + 'static> Operations<G> {
    pub fn of(owner: Arc<G>) -> Self {
        Self {
            owner,
            operations: Vec::new(),
        }
    }

    /// Operation taking no call-time arguments
    pub fn bare<R, E, F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&G) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize + 'static,
        E: IntoRpcError + 'static,
    {
        let owner = self.owner.clone();
        let call: ErasedCall = Arc::new(move |_ctx: &Context, _params: Option<&Value>| {
            Invocation::Returned(settle(f(&*owner)))
        });
        self.push(name, Signature::BARE, None, call)
    }

    /// Operation taking the call context
    pub fn with_context<R, E, F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&G, &Context) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize + 'static,
        E: IntoRpcError + 'static,
    {
        let owner = self.owner.clone();
        let call: ErasedCall = Arc::new(move |ctx: &Context, _params: Option<&Value>| {
            Invocation::Returned(settle(f(&*owner, ctx)))
        });
        self.push(name, Signature::CONTEXT, None, call)
    }

    /// Operation taking the call context and typed parameters
    ///
    /// An absent or `null` payload yields `P::default()`.
    pub fn with_params<P, R, E, F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&G, &Context, P) -> Result<R, E> + Send + Sync + 'static,
        P: DeserializeOwned + Default + 'static,
        R: Serialize + 'static,
        E: IntoRpcError + 'static,
    {
        let owner = self.owner.clone();
        let call: ErasedCall = Arc::new(move |ctx: &Context, params: Option<&Value>| {
            match decode_params::<P>(params) {
                Ok(params) => Invocation::Returned(settle(f(&*owner, ctx, params))),
                Err(err) => Invocation::Decode(err),
            }
        });
        self.push(
            name,
            Signature::CONTEXT_PARAMS,
            Some(std::any::type_name::<P>()),
            call,
        )
    }

    pub fn build(self) -> OperationSet {
        OperationSet {
            owner: self.owner,
            operations: self.operations,
        }
    }

    fn push(
        mut self,
        name: &str,
        signature: Signature,
        params_type: Option<&'static str>,
        call: ErasedCall,
    ) -> Self {
        self.operations.push(Operation {
            name: name.to_string(),
            signature,
            params_type,
            call,
        });
        self
    }
}

/// Registry entry: qualified name, owner reference and erased callable
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: String,
    owner: Owner,
    signature: Signature,
    params_type: Option<&'static str>,
    call: ErasedCall,
}

impl HandlerDescriptor {
    /// Descriptor for a handler whose shape is only known at runtime
    ///
    /// The declared `signature` is validated on every dispatch; the handler
    /// receives the raw parameter payload and decodes it itself.
    pub fn dynamic<F>(
        name: impl Into<String>,
        owner: Arc<dyn Any + Send + Sync>,
        signature: Signature,
        f: F,
    ) -> Self
    where
        F: Fn(&Context, Option<&Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            owner,
            signature,
            params_type: None,
            call: Arc::new(move |ctx: &Context, params: Option<&Value>| {
                Invocation::Returned(f(ctx, params))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Rust type the params payload decodes into, if the operation takes one
    pub fn params_type(&self) -> Option<&'static str> {
        self.params_type
    }

    pub fn owner(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.owner
    }

    pub fn owner_as<G: Any>(&self) -> Option<&G> {
        self.owner.downcast_ref::<G>()
    }

    pub(crate) fn invoke(&self, ctx: &Context, params: Option<&Value>) -> Invocation {
        (self.call)(ctx, params)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("params_type", &self.params_type)
            .finish()
    }
}
