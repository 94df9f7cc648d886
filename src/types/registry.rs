//! Process-wide registry of manually curated node names

use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::error::{Result, ServiceGraphError};

/// Append-only set of known node names.
///
/// Shared between request handlers behind an `Arc`; registration takes the
/// write lock, every render pass takes the read lock for a snapshot.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    nodes: RwLock<BTreeSet<String>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node name. Returns `true` if it was not registered before.
    ///
    /// Re-registering an existing name is a no-op. Blank names are rejected.
    pub fn register(&self, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(ServiceGraphError::EmptyNodeName);
        }
        if self.nodes.read().contains(name) {
            return Ok(false);
        }
        Ok(self.nodes.write().insert(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.read().contains(name)
    }

    /// Sorted copy of the current contents
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.nodes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
