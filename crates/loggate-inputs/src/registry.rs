//! Registry of input factories.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{InputBuffer, InputConfig, InputError, InputFactory, InputTypeInfo, MessageInput};

/// Holds registered input factories. The control plane uses it to create
/// inputs by type name.
///
/// Registration happens at startup; reads dominate afterwards.
#[derive(Default)]
pub struct Registry {
    factories: RwLock<HashMap<String, Arc<dyn InputFactory>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory for an input type. Re-registering a name replaces the
    /// previous factory.
    pub fn register(&self, factory: Arc<dyn InputFactory>) {
        let mut factories = self.factories.write().expect("lock poisoned");
        factories.insert(factory.name().to_string(), factory);
    }

    /// All registered input type names, sorted.
    pub fn list_registered(&self) -> Vec<String> {
        let factories = self.factories.read().expect("lock poisoned");
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Config spec for the given input type, or `None` if not registered.
    pub fn type_info(&self, name: &str) -> Option<InputTypeInfo> {
        let factories = self.factories.read().expect("lock poisoned");
        factories.get(name).map(|f| f.config_spec())
    }

    /// Config specs for all registered input types, sorted by type name.
    pub fn all_types_info(&self) -> Vec<InputTypeInfo> {
        let factories = self.factories.read().expect("lock poisoned");
        let mut infos: Vec<InputTypeInfo> = factories.values().map(|f| f.config_spec()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        infos
    }

    /// Run the factory's validation before create. Unknown types pass
    /// silently; validation is not gatekeeping for unknowns.
    pub fn validate_config(&self, name: &str, cfg: &InputConfig) -> Result<(), InputError> {
        let factory = {
            let factories = self.factories.read().expect("lock poisoned");
            factories.get(name).cloned()
        };
        match factory {
            Some(f) => f.validate_config(cfg),
            None => Ok(()),
        }
    }

    /// Build a [`MessageInput`] for the given type and config.
    pub fn create(
        &self,
        name: &str,
        cfg: &InputConfig,
        buffer: Arc<dyn InputBuffer>,
    ) -> Result<Box<dyn MessageInput>, InputError> {
        let factory = {
            let factories = self.factories.read().expect("lock poisoned");
            factories.get(name).cloned()
        };
        match factory {
            Some(f) => f.create(cfg, buffer),
            None => Err(InputError::UnknownType(name.to_string())),
        }
    }
}
