use crate::ComponentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canvas coordinates of a placed node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The component a workflow node stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub component_id: String,
    pub component_type: ComponentType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ComponentRef {
    pub fn new(
        component_id: impl Into<String>,
        component_type: ComponentType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            component_type,
            name: name.into(),
            description: None,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One component instance on a workflow canvas
///
/// `id` is local to the workflow; the same component may be placed twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub component_ref: ComponentRef,
    #[serde(default)]
    pub position: Position,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, component_ref: ComponentRef) -> Self {
        Self {
            id: id.into(),
            component_ref,
            position: Position::default(),
        }
    }

    /// Place a fresh, not yet saved node on the canvas
    pub fn place(component_ref: ComponentRef, position: Position) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            component_ref,
            position,
        }
    }

    /// Display label used in rendered steps
    pub fn label(&self) -> &str {
        &self.component_ref.name
    }
}

/// Precedence edge: source is considered before target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("e-{}-{}", source, target),
            source_node_id: source,
            target_node_id: target,
        }
    }
}

/// A saved, user-composed workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
