//! Demo handler groups served by `jrpc-serve`
//!
//! - `Main.Test`: greets a caller by nickname
//! - `Main.Info.Get`: static service information (child group of `Main`)
//! - `Arith.Add` / `Arith.Divide`: integer arithmetic

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::jsonrpc::{
    Context, HandlerGroup, HasAliasName, HasChildren, OperationSet, Operations, RpcError,
    StructuredError,
};

/// Error code returned by `Main.Test` when no nickname was given
pub const MISSING_NICKNAME: i32 = 10;

/// Error codes returned by `Arith`
pub const DIVISION_BY_ZERO: i32 = 20;
pub const OVERFLOW: i32 = 21;
pub const INTERRUPTED: i32 = 22;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TestParams {
    #[serde(rename = "Nickname", default)]
    pub nickname: Option<String>,
}

/// Root group, registered as `Main`
#[derive(Debug, Default)]
pub struct Greeter {
    greeted: AtomicU64,
}

impl Greeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many greetings succeeded so far
    pub fn greeted(&self) -> u64 {
        self.greeted.load(Ordering::Relaxed)
    }

    pub fn test(&self, _ctx: &Context, params: TestParams) -> Result<String, RpcError> {
        let Some(nickname) = params.nickname else {
            return Err(RpcError::new(MISSING_NICKNAME, "please provide a nickname", None));
        };
        self.greeted.fetch_add(1, Ordering::Relaxed);
        Ok(format!("hello: {}", nickname))
    }
}

impl HandlerGroup for Greeter {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self).with_params("Test", Greeter::test).build()
    }

    fn as_alias(&self) -> Option<&dyn HasAliasName> {
        Some(self)
    }

    fn as_children(&self) -> Option<&dyn HasChildren> {
        Some(self)
    }
}

impl HasAliasName for Greeter {
    fn alias_name(&self) -> String {
        "Main".to_string()
    }
}

impl HasChildren for Greeter {
    fn children(&self) -> anyhow::Result<Vec<Arc<dyn HandlerGroup>>> {
        let children: Vec<Arc<dyn HandlerGroup>> = vec![Arc::new(Info)];
        Ok(children)
    }
}

/// Child of [`Greeter`], registered as `Main.Info`
#[derive(Debug, Default)]
pub struct Info;

impl Info {
    pub fn get(&self, _ctx: &Context) -> Result<&'static str, RpcError> {
        Ok("example")
    }
}

impl HandlerGroup for Info {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self).with_context("Get", Info::get).build()
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct Operands {
    #[serde(default)]
    pub a: i64,
    #[serde(default)]
    pub b: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ArithError {
    #[error("division by zero")]
    DivisionByZero { dividend: i64 },

    #[error("integer overflow")]
    Overflow,

    #[error(transparent)]
    Interrupted(#[from] crate::jsonrpc::ContextError),
}

impl StructuredError for ArithError {
    fn code(&self) -> i32 {
        match self {
            ArithError::DivisionByZero { .. } => DIVISION_BY_ZERO,
            ArithError::Overflow => OVERFLOW,
            ArithError::Interrupted(_) => INTERRUPTED,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            ArithError::DivisionByZero { dividend } => Some(json!({ "dividend": dividend })),
            _ => None,
        }
    }
}

/// Integer arithmetic, registered under its type name
#[derive(Debug, Default)]
pub struct Arith;

impl Arith {
    pub fn add(&self, ctx: &Context, operands: Operands) -> Result<i64, ArithError> {
        ctx.check()?;
        operands.a.checked_add(operands.b).ok_or(ArithError::Overflow)
    }

    pub fn divide(&self, ctx: &Context, operands: Operands) -> Result<i64, ArithError> {
        ctx.check()?;
        if operands.b == 0 {
            return Err(ArithError::DivisionByZero { dividend: operands.a });
        }
        operands.a.checked_div(operands.b).ok_or(ArithError::Overflow)
    }
}

impl HandlerGroup for Arith {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self)
            .with_params("Add", Arith::add)
            .with_params("Divide", Arith::divide)
            .build()
    }
}
