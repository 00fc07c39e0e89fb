//! Error types for graph operations
//!
//! Only caller contract violations surface here. Missing signals,
//! unresolved names, dangling edges and cyclic remainders are handled by
//! leaving things out of the result.

use thiserror::Error;

/// Graph engine errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// Component handed to the extractor without any content
    #[error("Component '{component_id}' has no content to analyze")]
    MissingContent {
        /// Component id
        component_id: String,
    },

    /// Workflow nodes left over after layering, rejected by policy
    #[error("Workflow contains a cycle through {} node(s): {}", node_ids.len(), node_ids.join(", "))]
    CyclicWorkflow {
        /// Nodes that never reached in-degree zero
        node_ids: Vec<String>,
    },

    /// Workflow document with the wrong shape
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// External storage collaborator failed
    #[error("Store error: {0}")]
    Store(String),

    /// Extraction task aborted or panicked
    #[error("Task error: {0}")]
    Task(String),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, GraphError>;
