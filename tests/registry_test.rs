//! 登録とname解決のテスト
//!
//! alias/型名によるbase name、childrenの再帰登録、上書き、失敗時の挙動

use jrpc::jsonrpc::{
    Context, HandlerDescriptor, HandlerGroup, HasAliasName, HasChildren, MethodRegistry,
    OperationSet, Operations, RegistryError, RpcError, Signature,
};
use jrpc::services::{self, Arith, Greeter, Info};
use std::any::Any;
use std::sync::Arc;

struct Storage;

impl HandlerGroup for Storage {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self)
            .with_context("Get", |_: &Storage, _: &Context| Ok::<_, RpcError>("value"))
            .bare("Size", |_: &Storage| Ok::<_, RpcError>(0u64))
            .build()
    }
}

struct Broken;

impl HandlerGroup for Broken {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self)
            .bare("Before", |_: &Broken| Ok::<_, RpcError>(true))
            .build()
    }

    fn as_children(&self) -> Option<&dyn HasChildren> {
        Some(self)
    }
}

impl HasChildren for Broken {
    fn children(&self) -> anyhow::Result<Vec<Arc<dyn HandlerGroup>>> {
        anyhow::bail!("backing store unavailable")
    }
}

/// alias付き、childrenも持つグループ
struct Versioned {
    version: u32,
}

impl HandlerGroup for Versioned {
    fn operations(self: Arc<Self>) -> OperationSet {
        Operations::of(self)
            .bare("Version", |v: &Versioned| Ok::<_, RpcError>(v.version))
            .build()
    }

    fn as_alias(&self) -> Option<&dyn HasAliasName> {
        Some(self)
    }

    fn as_children(&self) -> Option<&dyn HasChildren> {
        Some(self)
    }
}

impl HasAliasName for Versioned {
    fn alias_name(&self) -> String {
        format!("V{}", self.version)
    }
}

impl HasChildren for Versioned {
    fn children(&self) -> anyhow::Result<Vec<Arc<dyn HandlerGroup>>> {
        let children: Vec<Arc<dyn HandlerGroup>> = vec![Arc::new(Storage), Arc::new(Greeter::new())];
        Ok(children)
    }
}

#[test]
fn test_type_name_is_base_name_without_alias() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Storage), &[]).unwrap();

    assert_eq!(registry.list_names(), vec!["Storage.Get", "Storage.Size"]);
    assert_eq!(registry.lookup("Storage.Get").unwrap().signature(), Signature::CONTEXT);
    assert_eq!(registry.lookup("Storage.Size").unwrap().signature(), Signature::BARE);
}

#[test]
fn test_prefix_is_prepended() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Storage), &["Api", "Internal"]).unwrap();

    assert!(registry.contains("Api.Internal.Storage.Get"));
    assert!(!registry.contains("Storage.Get"));
}

#[test]
fn test_alias_and_children_of_greeter() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Greeter::new()), &[]).unwrap();

    assert_eq!(registry.list_names(), vec!["Main.Info.Get", "Main.Test"]);

    let get = registry.lookup("Main.Info.Get").unwrap();
    assert_eq!(get.name(), "Main.Info.Get");
    assert!(get.owner_as::<Info>().is_some());
    assert!(get.owner_as::<Greeter>().is_none());
}

#[test]
fn test_nested_children_extend_the_path() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Versioned { version: 2 }), &["Svc"]).unwrap();

    assert_eq!(
        registry.list_names(),
        vec![
            "Svc.V2.Main.Info.Get",
            "Svc.V2.Main.Test",
            "Svc.V2.Storage.Get",
            "Svc.V2.Storage.Size",
            "Svc.V2.Version",
        ]
    );
}

#[test]
fn test_register_multiple() {
    let mut registry = MethodRegistry::new();
    let groups: Vec<Arc<dyn HandlerGroup>> = vec![Arc::new(Storage), Arc::new(Arith)];
    registry.register_multiple(groups, &["Tools"]).unwrap();

    assert!(registry.contains("Tools.Storage.Get"));
    assert!(registry.contains("Tools.Arith.Add"));
    assert!(registry.contains("Tools.Arith.Divide"));
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_failing_children_provider_aborts_but_keeps_earlier_entries() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Storage), &[]).unwrap();

    let err = registry.register(Arc::new(Broken), &[]).unwrap_err();
    match &err {
        RegistryError::Children { group, source } => {
            assert_eq!(group, "Broken");
            assert_eq!(source.to_string(), "backing store unavailable");
        }
    }
    assert!(err.to_string().contains("backing store unavailable"));

    assert!(registry.contains("Storage.Get"));
    assert!(registry.contains("Broken.Before"));
}

#[test]
fn test_register_multiple_stops_at_first_failure() {
    let mut registry = MethodRegistry::new();
    let groups: Vec<Arc<dyn HandlerGroup>> = vec![Arc::new(Broken), Arc::new(Storage)];
    let result = registry.register_multiple(groups, &[]);

    assert!(result.is_err());
    assert!(!registry.contains("Storage.Get"));
}

#[test]
fn test_re_registration_replaces_descriptor() {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(Versioned { version: 1 }), &[]).unwrap();
    let before = registry.len();

    let owner: Arc<dyn Any + Send + Sync> = Arc::new(());
    registry.insert(HandlerDescriptor::dynamic(
        "V1.Version",
        owner,
        Signature::BARE,
        |_ctx, _params| Ok(serde_json::json!("replaced")),
    ));

    assert_eq!(registry.len(), before);
    assert!(registry.lookup("V1.Version").unwrap().owner_as::<Versioned>().is_none());
}

#[test]
fn test_default_registry() {
    let registry = services::default_registry().unwrap();
    assert_eq!(
        registry.list_names(),
        vec!["Arith.Add", "Arith.Divide", "Main.Info.Get", "Main.Test"]
    );
}

#[test]
fn test_lookup_of_unknown_name() {
    let registry = MethodRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.lookup("Main.Test").is_none());
}
