//! CodexGraph Types - Core records shared by the component graph engine
//!
//! Components and relationships feed the dependency analysis, workflow
//! nodes and edges feed the command compiler.

pub mod command;
pub mod component;
pub mod relationship;
pub mod workflow;

pub use command::{CommandConfig, Model, COMMON_TOOLS};
pub use component::{Component, ComponentType, ParseComponentTypeError};
pub use relationship::{Confidence, Relationship, RelationshipKey, RelationshipKind};
pub use workflow::{ComponentRef, Position, Workflow, WorkflowEdge, WorkflowNode};
