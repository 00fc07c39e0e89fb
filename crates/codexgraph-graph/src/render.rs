//! Command artifact rendering
//!
//! A compiled workflow becomes one markdown command: frontmatter, a
//! description line, then one `## Step N` section per non-empty layer.

use crate::error::{GraphError, Result};
use crate::store::WorkflowSource;
use crate::workflow::{layer_nodes, layer_nodes_with, CyclePolicy};
use codexgraph_types::{CommandConfig, ComponentType, Model, Workflow, WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Returned instead of a document when the canvas is empty
pub const EMPTY_WORKFLOW_PLACEHOLDER: &str =
    "<!-- Add components to the canvas to generate a command -->";

/// Description line used when the config has none
pub const DEFAULT_DESCRIPTION_LINE: &str = "Auto-generated command workflow.";

/// Longest node description carried into a step, in characters
const DESCRIPTION_LIMIT: usize = 120;

/// Verb and suffix wrapped around a node label
fn step_phrase(component_type: ComponentType) -> (&'static str, &'static str) {
    match component_type {
        ComponentType::Command => ("Execute the", "workflow"),
        ComponentType::Agent => ("Launch the", "agent"),
        ComponentType::Skill => ("Apply", "skill patterns"),
        ComponentType::Rule => ("Enforce", "rule constraints"),
    }
}

/// Compile-time switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub cycle_policy: CyclePolicy,
}

/// Compile a workflow into a command document
///
/// Cyclic remainders are left out and never fail the compile.
#[must_use]
pub fn compile_workflow(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    config: &CommandConfig,
) -> String {
    if nodes.is_empty() {
        return EMPTY_WORKFLOW_PLACEHOLDER.to_string();
    }
    render_artifact(nodes, &layer_nodes(nodes, edges), config)
}

/// Compile a workflow with explicit options
pub fn compile_workflow_with(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    config: &CommandConfig,
    options: CompileOptions,
) -> Result<String> {
    if nodes.is_empty() {
        return Ok(EMPTY_WORKFLOW_PLACEHOLDER.to_string());
    }
    let layering = layer_nodes_with(nodes, edges, options.cycle_policy)?;
    Ok(render_artifact(nodes, &layering.layers, config))
}

/// Compile a saved workflow
pub fn compile_saved_workflow(
    workflow: &Workflow,
    config: &CommandConfig,
    options: CompileOptions,
) -> Result<String> {
    compile_workflow_with(&workflow.nodes, &workflow.edges, config, options)
}

/// Look up a saved workflow and compile it
pub fn compile_stored_workflow<W>(
    source: &W,
    workflow_id: &str,
    config: &CommandConfig,
    options: CompileOptions,
) -> Result<String>
where
    W: WorkflowSource + ?Sized,
{
    let workflow = source.workflow(workflow_id)?.ok_or_else(|| {
        GraphError::InvalidWorkflow(format!("no saved workflow '{}'", workflow_id))
    })?;
    compile_saved_workflow(&workflow, config, options)
}

fn render_artifact(nodes: &[WorkflowNode], layers: &[Vec<String>], config: &CommandConfig) -> String {
    let description = if config.description.is_empty() {
        DEFAULT_DESCRIPTION_LINE
    } else {
        config.description.as_str()
    };

    let mut parts = vec![render_frontmatter(config), description.to_string()];
    parts.extend(render_steps(nodes, layers));
    parts.join("\n\n")
}

/// Frontmatter block; empty fields and an inherited model are left out
#[must_use]
pub fn render_frontmatter(config: &CommandConfig) -> String {
    let mut lines = vec!["---".to_string()];

    if !config.description.is_empty() {
        lines.push(format!("description: {}", config.description));
    }

    if !config.allowed_tools.is_empty() {
        lines.push(format!("allowed-tools: {}", config.allowed_tools.join(", ")));
    }

    if config.model != Model::Inherit {
        lines.push(format!("model: {}", config.model));
    }

    if !config.argument_hint.is_empty() {
        lines.push(format!("argument-hint: {}", config.argument_hint));
    }

    lines.push("---".to_string());
    lines.join("\n")
}

/// Render one section per non-empty layer, numbered from 1
#[must_use]
pub fn render_steps(nodes: &[WorkflowNode], layers: &[Vec<String>]) -> Vec<String> {
    let mut by_id: HashMap<&str, &WorkflowNode> = HashMap::new();
    for node in nodes {
        by_id.entry(node.id.as_str()).or_insert(node);
    }

    let mut steps = Vec::new();
    for layer in layers {
        let layer_nodes: Vec<&WorkflowNode> = layer
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect();

        let step = steps.len() + 1;
        match layer_nodes.as_slice() {
            [] => continue,
            [single] => steps.push(single_step(single, step)),
            many => steps.push(parallel_step(many, step)),
        }
    }
    steps
}

fn single_step(node: &WorkflowNode, step: usize) -> String {
    let (verb, suffix) = step_phrase(node.component_ref.component_type);
    let label = node.label();
    let description = node
        .component_ref
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!(" - {}", truncate_chars(d, DESCRIPTION_LIMIT)))
        .unwrap_or_default();

    format!(
        "## Step {}: {}\n{} **{}** {}{}",
        step, label, verb, label, suffix, description
    )
}

fn parallel_step(nodes: &[&WorkflowNode], step: usize) -> String {
    let bullets: Vec<String> = nodes
        .iter()
        .map(|node| {
            let component_type = node.component_ref.component_type;
            let (verb, suffix) = step_phrase(component_type);
            format!(
                "- **{}** ({}): {} {}",
                node.label(),
                component_type,
                verb,
                suffix
            )
        })
        .collect();

    format!(
        "## Step {}: Parallel Phase\nRun simultaneously:\n{}",
        step,
        bullets.join("\n")
    )
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
