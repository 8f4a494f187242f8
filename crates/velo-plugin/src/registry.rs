//! Explicit plugin catalog.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{PluginError, PluginResult};
use crate::plugin::Plugin;

/// A catalog of plugins, keyed by name.
///
/// Built once at bootstrap and shared by `Arc`. Registration is explicit;
/// a duplicate name is an error for the caller to treat as fatal, never a
/// silent replacement.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`] if a plugin with the same
    /// name is present.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        let name = plugin.name().to_owned();
        #[allow(clippy::unwrap_used)]
        let mut plugins = self.plugins.write().unwrap();
        if plugins.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered(name));
        }
        plugins.insert(name, plugin);
        Ok(())
    }

    /// Look up a plugin by name.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        #[allow(clippy::unwrap_used)]
        let plugins = self.plugins.read().unwrap();
        plugins.get(name).cloned()
    }

    /// All registered plugins, sorted by name.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn Plugin>> {
        #[allow(clippy::unwrap_used)]
        let plugins = self.plugins.read().unwrap();
        let mut all: Vec<_> = plugins.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Registered plugin names, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        #[allow(clippy::unwrap_used)]
        let plugins = self.plugins.read().unwrap();
        let mut names: Vec<_> = plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered plugins.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[allow(clippy::unwrap_used)]
        let plugins = self.plugins.read().unwrap();
        plugins.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
