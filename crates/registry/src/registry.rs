use std::sync::Arc;

use dagforge_core::{NodeTypeKey, Value};
use dashmap::DashMap;

use crate::error::RegistryError;
use crate::factory::{NodeFactory, NodeInstance};
use crate::metadata::NodeMetadata;

struct Entry {
    factory: Arc<dyn NodeFactory>,
    metadata: NodeMetadata,
}

/// Maps a node `type` tag to its factory and static metadata.
///
/// Written only during startup registration; reads are lock-free
/// thereafter (`DashMap` shards internally, and nothing here ever takes a
/// registry-wide lock on the read path).
#[derive(Default)]
pub struct NodeRegistry {
    entries: DashMap<NodeTypeKey, Entry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. Fails with `DuplicateType` if already present
    /// — unlike a silent-overwrite registry, re-registration is always a
    /// caller bug here.
    pub fn register(
        &self,
        factory: impl NodeFactory,
        metadata: NodeMetadata,
    ) -> Result<(), RegistryError> {
        let key = metadata.type_key.clone();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateType(key));
        }
        self.entries.insert(
            key,
            Entry {
                factory: Arc::new(factory),
                metadata,
            },
        );
        Ok(())
    }

    /// Resolve `type` to a live node instance, constructed with `config`.
    pub fn instantiate(
        &self,
        type_key: &NodeTypeKey,
        config: Value,
    ) -> Result<Arc<dyn NodeInstance>, RegistryError> {
        let entry = self
            .entries
            .get(type_key)
            .ok_or_else(|| RegistryError::UnknownType(type_key.clone()))?;
        entry.factory.instantiate(config).map_err(|reason| RegistryError::InvalidConfig {
            type_: type_key.clone(),
            reason,
        })
    }

    pub fn contains(&self, type_key: &NodeTypeKey) -> bool {
        self.entries.contains_key(type_key)
    }

    pub fn list_types(&self) -> Vec<NodeMetadata> {
        self.entries.iter().map(|e| e.metadata.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::NodeError;
    use async_trait::async_trait;
    use dagforge_core::NodeId;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct EchoNode;

    #[async_trait]
    impl NodeInstance for EchoNode {
        async fn execute(
            &self,
            input: Value,
            _predecessor_results: HashMap<NodeId, Value>,
        ) -> Result<Value, NodeError> {
            Ok(input)
        }
    }

    fn echo_factory(_config: Value) -> Result<Arc<dyn NodeInstance>, String> {
        Ok(Arc::new(EchoNode))
    }

    fn key(s: &str) -> NodeTypeKey {
        NodeTypeKey::new(s).unwrap()
    }

    #[test]
    fn register_and_instantiate() {
        let registry = NodeRegistry::new();
        registry
            .register(echo_factory, NodeMetadata::new(key("echo"), "Echo"))
            .unwrap();

        assert!(registry.contains(&key("echo")));
        let instance = registry.instantiate(&key("echo"), Value::Null).unwrap();
        let _ = instance;
    }

    #[test]
    fn duplicate_register_fails() {
        let registry = NodeRegistry::new();
        registry
            .register(echo_factory, NodeMetadata::new(key("echo"), "Echo"))
            .unwrap();
        let err = registry
            .register(echo_factory, NodeMetadata::new(key("echo"), "Echo"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateType(key("echo")));
    }

    #[test]
    fn unknown_type_fails() {
        let registry = NodeRegistry::new();
        let err = registry.instantiate(&key("missing"), Value::Null).unwrap_err();
        assert_eq!(err, RegistryError::UnknownType(key("missing")));
    }

    #[test]
    fn invalid_config_is_propagated() {
        let registry = NodeRegistry::new();
        registry
            .register(
                |_config: Value| Err::<Arc<dyn NodeInstance>, String>("bad config".into()),
                NodeMetadata::new(key("strict"), "Strict"),
            )
            .unwrap();

        let err = registry.instantiate(&key("strict"), Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig { .. }));
    }

    #[test]
    fn list_types_returns_all_registered_metadata() {
        let registry = NodeRegistry::new();
        registry
            .register(echo_factory, NodeMetadata::new(key("a"), "A"))
            .unwrap();
        registry
            .register(echo_factory, NodeMetadata::new(key("b"), "B"))
            .unwrap();
        assert_eq!(registry.list_types().len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_registry_reports_is_empty() {
        let registry = NodeRegistry::new();
        assert!(registry.is_empty());
    }
}
