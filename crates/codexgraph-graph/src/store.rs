//! Storage seams for components, relationships and saved workflows
//!
//! The engine never owns a database. Callers hand it one of these traits;
//! [`MemoryStore`] backs the CLI and the tests.

use crate::error::{GraphError, Result};
use codexgraph_types::{Component, Relationship, RelationshipKey, Workflow};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Read access to the component catalog
pub trait ComponentSource: Send + Sync {
    /// Components that belong to one plugin
    fn components_for_plugin(&self, plugin_id: &str) -> Result<Vec<Component>>;

    /// Every known component, across plugins
    fn all_components(&self) -> Result<Vec<Component>>;
}

/// Persistent relationship rows
pub trait RelationshipStore: Send + Sync {
    /// Relationships whose source or target is one of `component_ids`
    fn relationships_for(&self, component_ids: &[String]) -> Result<Vec<Relationship>>;

    /// Insert rows, ignoring any whose `(from, to, kind)` already exists
    ///
    /// Returns the number of rows actually inserted.
    fn upsert(&self, relationships: &[Relationship]) -> Result<usize>;
}

/// Saved workflows by id
pub trait WorkflowSource: Send + Sync {
    fn workflow(&self, workflow_id: &str) -> Result<Option<Workflow>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    components: Vec<(String, Component)>,
    relationships: Vec<Relationship>,
    relationship_keys: HashSet<RelationshipKey>,
    workflows: HashMap<String, Workflow>,
}

/// In-memory implementation of every storage seam
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register components under a plugin id
    pub fn add_components(
        &self,
        plugin_id: &str,
        components: impl IntoIterator<Item = Component>,
    ) -> Result<()> {
        let mut state = self.write()?;
        state.components.extend(
            components
                .into_iter()
                .map(|c| (plugin_id.to_string(), c)),
        );
        Ok(())
    }

    /// Store or replace a saved workflow
    pub fn save_workflow(&self, workflow: Workflow) -> Result<()> {
        let mut state = self.write()?;
        state.workflows.insert(workflow.id.clone(), workflow);
        Ok(())
    }

    /// Number of stored relationship rows
    pub fn relationship_count(&self) -> Result<usize> {
        Ok(self.read()?.relationships.len())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| GraphError::Store(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| GraphError::Store(format!("lock poisoned: {}", e)))
    }
}

impl ComponentSource for MemoryStore {
    fn components_for_plugin(&self, plugin_id: &str) -> Result<Vec<Component>> {
        Ok(self
            .read()?
            .components
            .iter()
            .filter(|(owner, _)| owner == plugin_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn all_components(&self) -> Result<Vec<Component>> {
        Ok(self
            .read()?
            .components
            .iter()
            .map(|(_, c)| c.clone())
            .collect())
    }
}

impl RelationshipStore for MemoryStore {
    fn relationships_for(&self, component_ids: &[String]) -> Result<Vec<Relationship>> {
        let wanted: HashSet<&str> = component_ids.iter().map(String::as_str).collect();
        Ok(self
            .read()?
            .relationships
            .iter()
            .filter(|r| {
                wanted.contains(r.from_component_id.as_str())
                    || wanted.contains(r.to_component_id.as_str())
            })
            .cloned()
            .collect())
    }

    fn upsert(&self, relationships: &[Relationship]) -> Result<usize> {
        let mut state = self.write()?;
        let mut inserted = 0;
        for rel in relationships {
            if state.relationship_keys.insert(rel.key()) {
                state.relationships.push(rel.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

impl WorkflowSource for MemoryStore {
    fn workflow(&self, workflow_id: &str) -> Result<Option<Workflow>> {
        Ok(self.read()?.workflows.get(workflow_id).cloned())
    }
}
