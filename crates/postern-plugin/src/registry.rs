//! Plugin registry.
//!
//! The process-wide set of active plugin descriptors. Populated once at
//! startup from the host's static list plus feature-flag-gated entries,
//! then read-only for the remainder of the process — the pipeline shares
//! it as `Arc<PluginRegistry>` with no locking. Insertion order is
//! preserved and drives every ordering the pipeline guarantees (z-order,
//! processor fold order, mount order).

use std::collections::HashSet;

use tracing::info;

use crate::descriptor::{PluginDescriptor, PluginId};
use crate::error::{PluginError, PluginResult};

/// Ordered, process-wide set of active plugin descriptors.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>,
    ids: HashSet<PluginId>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin descriptor.
    ///
    /// A duplicate identifier indicates a packaging defect; the host treats
    /// it as fatal at startup. The registry is left unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::DuplicateIdentifier`] if a descriptor with
    /// the same identifier is already registered.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> PluginResult<()> {
        let id = descriptor.id().clone();
        if self.ids.contains(&id) {
            return Err(PluginError::DuplicateIdentifier(id));
        }

        info!(
            plugin_id = %id,
            plugin_name = %descriptor.plugin_name(),
            capabilities = ?descriptor.capability_names(),
            "Registered plugin"
        );
        self.ids.insert(id);
        self.plugins.push(descriptor);
        Ok(())
    }

    /// Iterate descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    /// Look up a descriptor by identifier.
    #[must_use]
    pub fn get(&self, id: &PluginId) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id() == id)
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<'a> IntoIterator for &'a PluginRegistry {
    type Item = &'a PluginDescriptor;
    type IntoIter = std::slice::Iter<'a, PluginDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.iter()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugin_count", &self.plugins.len())
            .field(
                "plugin_ids",
                &self.plugins.iter().map(PluginDescriptor::id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
