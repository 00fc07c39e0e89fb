//! Component graph engine
//!
//! Infers relationships between plugin components, builds the dependency
//! graph, reports cycles, and compiles user-composed workflows into a
//! single command artifact.
//!
//! ```text
//! components ──► extract ──► graph ──► cycles
//!                   ▲
//!                 sync (concurrent job over a snapshot)
//!
//! workflow ──► workflow (layering) ──► render ──► command markdown
//! ```

pub mod digraph;
pub mod error;
pub mod extract;
pub mod graph;
pub mod render;
pub mod store;
pub mod sync;
pub mod workflow;

pub use digraph::{canonical_cycles, Digraph};
pub use error::{GraphError, Result};
pub use extract::{
    dedupe_relationships, extract_relationships, extract_relationships_with, normalize_name,
    resolve_component, MentionMatchers, PatternRule, EXPLICIT_PATTERNS,
};
pub use graph::{build_graph, find_cycles, Graph, GraphNode, GraphSummary};
pub use render::{
    compile_saved_workflow, compile_stored_workflow, compile_workflow, compile_workflow_with,
    render_frontmatter, render_steps, CompileOptions, DEFAULT_DESCRIPTION_LINE,
    EMPTY_WORKFLOW_PLACEHOLDER,
};
pub use store::{ComponentSource, MemoryStore, RelationshipStore, WorkflowSource};
pub use sync::{
    analyze_snapshot, analyze_sources, sync_plugin, AnalysisFailure, AnalysisReport, SyncOutcome,
};
pub use workflow::{
    layer_nodes, layer_nodes_with, workflow_cycles, workflow_digraph, workflow_from_json,
    CyclePolicy, Layering,
};

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{GraphError, Result};
    pub use crate::extract::extract_relationships;
    pub use crate::graph::{build_graph, find_cycles, Graph};
    pub use crate::render::{compile_workflow, CompileOptions};
    pub use crate::workflow::{layer_nodes, CyclePolicy};
}
