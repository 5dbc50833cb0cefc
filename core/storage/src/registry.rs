//! Store registry for resolving a backend by name.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::RemoteStore;
use drivedesk_common::{Error, Result};

/// Factory function type for creating stores.
pub type StoreFactory = Box<dyn Fn(Value) -> Result<Arc<dyn RemoteStore>> + Send + Sync>;

/// Registry for remote store factories.
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
}

impl StoreRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a store factory.
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: StoreFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::InvalidInput(format!(
                "Store '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Resolve a store by name and configuration.
    ///
    /// # Errors
    /// - Store not registered
    /// - Configuration invalid for the store
    pub fn resolve(&self, name: &str, config: Value) -> Result<Arc<dyn RemoteStore>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unknown store '{}' (available: {})",
                name,
                self.stores().join(", ")
            ))
        })?;
        factory(config)
    }

    /// Registered store names, sorted.
    pub fn stores(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store is registered.
    pub fn has_store(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with the built-in stores: `memory` and `gdrive`.
pub fn create_default_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();

    // Register memory store (for testing)
    registry
        .register(
            "memory",
            Box::new(|_config: Value| -> Result<Arc<dyn RemoteStore>> {
                Ok(Arc::new(crate::memory::MemoryStore::new()))
            }),
        )
        .expect("Failed to register memory store");

    // Register Google Drive store
    registry
        .register("gdrive", Box::new(crate::gdrive::create_gdrive_store))
        .expect("Failed to register gdrive store");

    registry
}
