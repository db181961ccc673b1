//! Concurrent store of mock definitions.
//!
//! Definitions are keyed by exact path, then exact method. Readers share the
//! lock; `add` and `delete` take it exclusively for the duration of a single
//! map update.

use crate::mock::MockDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type MethodMap = HashMap<String, Arc<MockDefinition>>;

/// Registry of mock definitions.
///
/// Shared between the admin API and the dispatcher behind an `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    endpoints: RwLock<HashMap<String, MethodMap>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any existing one for the same
    /// `(path, method)`.
    pub async fn add(&self, mock: MockDefinition) {
        let mut endpoints = self.endpoints.write().await;
        endpoints
            .entry(mock.path.clone())
            .or_default()
            .insert(mock.method.clone(), Arc::new(mock));
    }

    /// Exact-match lookup.
    ///
    /// The returned handle stays valid after the lock is released, even if
    /// the entry is replaced or deleted meanwhile.
    pub async fn get(&self, path: &str, method: &str) -> Option<Arc<MockDefinition>> {
        let endpoints = self.endpoints.read().await;
        endpoints
            .get(path)
            .and_then(|methods| methods.get(method))
            .cloned()
    }

    /// Snapshot of every stored definition, sorted by path then method.
    pub async fn list(&self) -> Vec<MockDefinition> {
        let endpoints = self.endpoints.read().await;
        let mut mocks: Vec<MockDefinition> = endpoints
            .values()
            .flat_map(|methods| methods.values())
            .map(|mock| MockDefinition::clone(mock))
            .collect();
        drop(endpoints);

        mocks.sort_by(|a, b| (&a.path, &a.method).cmp(&(&b.path, &b.method)));
        mocks
    }

    /// Remove a definition. Returns whether anything was removed.
    pub async fn delete(&self, path: &str, method: &str) -> bool {
        let mut endpoints = self.endpoints.write().await;
        let Some(methods) = endpoints.get_mut(path) else {
            return false;
        };
        if methods.remove(method).is_none() {
            return false;
        }
        if methods.is_empty() {
            endpoints.remove(path);
        }
        true
    }

    /// Number of stored definitions.
    pub async fn len(&self) -> usize {
        let endpoints = self.endpoints.read().await;
        endpoints.values().map(HashMap::len).sum()
    }

    #[cfg(test)]
    async fn path_count(&self) -> usize {
        self.endpoints.read().await.len()
    }
}
