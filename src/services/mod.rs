//! Handler groups bundled with the server binary

pub mod greeter;

pub use greeter::{Arith, ArithError, Greeter, Info, Operands, TestParams};

use std::sync::Arc;

use crate::jsonrpc::{HandlerGroup, MethodRegistry, RegistryError};

/// Every bundled group, in registration order
pub fn default_groups() -> Vec<Arc<dyn HandlerGroup>> {
    let groups: Vec<Arc<dyn HandlerGroup>> = vec![Arc::new(Greeter::new()), Arc::new(Arith)];
    groups
}

/// Registry holding the bundled groups at the top level
pub fn default_registry() -> Result<MethodRegistry, RegistryError> {
    let mut registry = MethodRegistry::new();
    registry.register_multiple(default_groups(), &[])?;
    Ok(registry)
}
