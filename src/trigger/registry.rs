//! Process-wide catalog of triggers and their parameter schemas

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{Param, TriggerDefinition};

#[derive(Debug, Default)]
struct RegistryInner {
    triggers: HashMap<String, Arc<TriggerDefinition>>,
    common_params: Vec<Param>,
}

/// Trigger registry shared by the service and the API layer.
///
/// Constructed explicitly by the hosting application and passed around in an
/// `Arc`. Both the trigger map and the common parameter list live behind one
/// reader-writer lock, so `get_all_params` always sees a consistent pair.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    inner: RwLock<RegistryInner>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the maps half-written,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a trigger, replacing any previous definition under the same code.
    pub fn register(
        &self,
        code: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<Param>,
    ) -> Arc<TriggerDefinition> {
        let definition = Arc::new(TriggerDefinition {
            code: code.into(),
            name: name.into(),
            description: description.into(),
            params,
        });

        let replaced = self
            .write()
            .triggers
            .insert(definition.code.clone(), definition.clone())
            .is_some();

        tracing::debug!(
            code = %definition.code,
            params = definition.params.len(),
            replaced,
            "Trigger registered"
        );

        definition
    }

    pub fn get(&self, code: &str) -> Option<Arc<TriggerDefinition>> {
        self.read().triggers.get(code).cloned()
    }

    pub fn exists(&self, code: &str) -> bool {
        self.read().triggers.contains_key(code)
    }

    /// All registered triggers, in no particular order.
    pub fn get_all(&self) -> Vec<Arc<TriggerDefinition>> {
        self.read().triggers.values().cloned().collect()
    }

    /// Registered codes, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.read().triggers.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.read().triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().triggers.is_empty()
    }

    /// Replace the parameters shared by every trigger.
    pub fn set_common_params(&self, params: Vec<Param>) {
        self.write().common_params = params;
    }

    pub fn get_common_params(&self) -> Vec<Param> {
        self.read().common_params.clone()
    }

    /// Common parameters followed by the trigger's own parameters.
    ///
    /// An unknown trigger yields only the common parameters.
    pub fn get_all_params(&self, code: &str) -> Vec<Param> {
        let inner = self.read();
        let own = inner
            .triggers
            .get(code)
            .map(|t| t.params.as_slice())
            .unwrap_or_default();

        let mut params = Vec::with_capacity(inner.common_params.len() + own.len());
        params.extend_from_slice(&inner.common_params);
        params.extend_from_slice(own);
        params
    }
}
