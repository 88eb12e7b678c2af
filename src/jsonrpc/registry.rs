use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::{RegistryError, RegistryResult};
use super::handler::{HandlerDescriptor, HandlerGroup};

/// Qualified method name -> handler descriptor
///
/// Built with `&mut self` during service assembly, then handed to an
/// [`Invoker`](super::Invoker) which only ever reads it.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, HandlerDescriptor>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every operation of `group` as `prefix.BaseName.Operation`
    ///
    /// The base name is the group's alias when it has one, its type name
    /// otherwise. Children are registered recursively with the prefix
    /// extended by the base name. Existing entries with the same qualified
    /// name are replaced. A failing children provider aborts registration;
    /// entries added before the failure are kept.
    pub fn register(&mut self, group: Arc<dyn HandlerGroup>, prefix: &[&str]) -> RegistryResult<()> {
        let prefix: Vec<String> = prefix.iter().map(|p| p.to_string()).collect();
        self.register_at(group, &prefix)
    }

    /// Register several groups under the same prefix, stopping at the first error
    pub fn register_multiple(
        &mut self,
        groups: Vec<Arc<dyn HandlerGroup>>,
        prefix: &[&str],
    ) -> RegistryResult<()> {
        let prefix: Vec<String> = prefix.iter().map(|p| p.to_string()).collect();
        self.register_all_at(groups, &prefix)
    }

    /// Store a prebuilt descriptor under its own name (last write wins)
    pub fn insert(&mut self, descriptor: HandlerDescriptor) {
        if self.methods.contains_key(descriptor.name()) {
            debug!("Replacing method {}", descriptor.name());
        } else {
            debug!("Registered method {}", descriptor.name());
        }
        self.methods.insert(descriptor.name().to_string(), descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// All qualified names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn register_at(&mut self, group: Arc<dyn HandlerGroup>, prefix: &[String]) -> RegistryResult<()> {
        let base_name = match group.as_alias() {
            Some(alias) => alias.alias_name(),
            None => group.type_name().to_string(),
        };

        let mut path: Vec<String> = prefix.to_vec();
        path.push(base_name.clone());
        let namespace = path.join(".");

        for descriptor in group
            .clone()
            .operations()
            .into_descriptors(|op| format!("{}.{}", namespace, op))
        {
            self.insert(descriptor);
        }

        // 子グループは base name を付けた prefix で再帰登録
        if let Some(provider) = group.as_children() {
            let children = provider.children().map_err(|source| RegistryError::Children {
                group: base_name.clone(),
                source,
            })?;
            debug!("{} exposes {} child group(s)", namespace, children.len());
            self.register_all_at(children, &path)?;
        }

        Ok(())
    }

    fn register_all_at(
        &mut self,
        groups: Vec<Arc<dyn HandlerGroup>>,
        prefix: &[String],
    ) -> RegistryResult<()> {
        for group in groups {
            self.register_at(group, prefix)?;
        }
        Ok(())
    }
}
