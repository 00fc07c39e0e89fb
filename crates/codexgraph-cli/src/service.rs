use crate::cli::{Command, OutputFormat};
use crate::config::{load_command_config, Config};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use codexgraph_components::ComponentCatalog;
use codexgraph_graph::{
    build_graph, canonical_cycles, compile_stored_workflow, sync_plugin, workflow_cycles,
    workflow_from_json, AnalysisFailure, CompileOptions, CyclePolicy, Graph, GraphSummary,
    MemoryStore, RelationshipStore,
};
use codexgraph_types::{Component, Relationship};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

/// JSON shape of the `analyze` report
#[derive(Debug, Serialize)]
struct AnalyzeJson<'a> {
    plugin_id: &'a str,
    component_count: usize,
    summary: GraphSummary,
    relationships: Vec<&'a Relationship>,
    cycles: Vec<Vec<String>>,
    failures: &'a [AnalysisFailure],
    analyzed_at: DateTime<Utc>,
}

/// Front end service - runs one subcommand against the engine
pub struct CodexGraphService {
    config: Config,
}

impl CodexGraphService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run a subcommand, printing its output
    pub async fn run(&self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Analyze {
                plugin_dir,
                plugin_id,
                format,
            } => {
                let report = self.analyze(&plugin_dir, plugin_id, format).await?;
                println!("{}", report);
                Ok(ExitCode::SUCCESS)
            }
            Command::Cycles {
                plugin_dir,
                plugin_id,
            } => {
                let (report, found) = self.cycles(&plugin_dir, plugin_id).await?;
                println!("{}", report);
                Ok(if found {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                })
            }
            Command::Compile {
                workflow,
                config,
                reject_cycles,
                output,
            } => {
                let artifact = self.compile(&workflow, config.as_deref(), reject_cycles)?;
                match output {
                    Some(path) => {
                        fs::write(&path, &artifact)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        info!("Wrote command to {}", path.display());
                    }
                    None => println!("{}", artifact),
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    /// Discover, analyze and summarize one plugin
    pub async fn analyze(
        &self,
        plugin_dir: &Path,
        plugin_id: Option<String>,
        format: OutputFormat,
    ) -> Result<String> {
        let loaded = load_plugin(plugin_dir, plugin_id).await?;
        let graph = &loaded.graph;
        let min = self.config.analysis.min_confidence;

        match format {
            OutputFormat::Json => {
                let view = AnalyzeJson {
                    plugin_id: &loaded.plugin_id,
                    component_count: loaded.components.len(),
                    summary: graph.summary(),
                    relationships: graph.relationships_at_least(min).collect(),
                    cycles: graph.unique_cycles(),
                    failures: &loaded.failures,
                    analyzed_at: loaded.analyzed_at,
                };
                Ok(serde_json::to_string_pretty(&view)?)
            }
            OutputFormat::Text => Ok(render_text_report(
                &loaded.plugin_id,
                &loaded.components,
                graph,
                &loaded.failures,
                min,
            )),
        }
    }

    /// Canonical cycles of one plugin, and whether any exist
    pub async fn cycles(
        &self,
        plugin_dir: &Path,
        plugin_id: Option<String>,
    ) -> Result<(String, bool)> {
        let loaded = load_plugin(plugin_dir, plugin_id).await?;
        let cycles = loaded.graph.unique_cycles();

        if cycles.is_empty() {
            return Ok((format!("No cycles in {}", loaded.plugin_id), false));
        }

        let names = display_names(&loaded.components);
        let mut lines = vec![format!("{} cycle(s) in {}:", cycles.len(), loaded.plugin_id)];
        lines.extend(cycles.iter().map(|cycle| {
            let mut path: Vec<&str> = cycle.iter().map(|id| name_of(&names, id)).collect();
            if let Some(first) = path.first().copied() {
                path.push(first);
            }
            format!("  {}", path.join(" -> "))
        }));
        Ok((lines.join("\n"), true))
    }

    /// Compile a saved workflow document into command markdown
    pub fn compile(
        &self,
        workflow_path: &Path,
        command_path: Option<&Path>,
        reject_cycles: bool,
    ) -> Result<String> {
        let raw = fs::read_to_string(workflow_path)
            .with_context(|| format!("Failed to read {}", workflow_path.display()))?;
        let workflow = workflow_from_json(&raw)?;

        let command = match command_path {
            Some(path) => load_command_config(path)?,
            None => self.config.command.clone(),
        };

        let cycle_policy = if reject_cycles {
            CyclePolicy::Reject
        } else {
            self.config.compiler.cycle_policy
        };

        if cycle_policy == CyclePolicy::Exclude {
            for cycle in canonical_cycles(&workflow_cycles(&workflow.nodes, &workflow.edges)) {
                warn!(
                    "Workflow '{}' cycle left out of the command: {}",
                    workflow.name,
                    cycle.join(" -> ")
                );
            }
        }

        info!(
            "Compiling workflow '{}' ({} nodes, {} edges)",
            workflow.name,
            workflow.nodes.len(),
            workflow.edges.len()
        );
        let store = MemoryStore::new();
        let workflow_id = workflow.id.clone();
        store.save_workflow(workflow)?;
        let artifact = compile_stored_workflow(
            &store,
            &workflow_id,
            &command,
            CompileOptions { cycle_policy },
        )?;
        Ok(artifact)
    }
}

fn discover(plugin_dir: &Path, plugin_id: Option<String>) -> Result<(String, Vec<Component>)> {
    let mut catalog = match plugin_id {
        Some(id) => ComponentCatalog::new(id, plugin_dir),
        None => ComponentCatalog::for_dir(plugin_dir),
    };
    catalog.discover()?;
    let plugin_id = catalog.plugin_id().to_string();
    Ok((plugin_id, catalog.into_components()))
}

/// One discovered plugin after its relationships went through the store
struct LoadedPlugin {
    plugin_id: String,
    components: Vec<Component>,
    graph: Graph,
    failures: Vec<AnalysisFailure>,
    analyzed_at: DateTime<Utc>,
}

async fn load_plugin(plugin_dir: &Path, plugin_id: Option<String>) -> Result<LoadedPlugin> {
    let (plugin_id, components) = discover(plugin_dir, plugin_id)?;

    let store = MemoryStore::new();
    store.add_components(&plugin_id, components.clone())?;
    let outcome = sync_plugin(&store, &store, &plugin_id).await?;

    let ids: Vec<String> = components.iter().map(|c| c.id.clone()).collect();
    let relationships = store.relationships_for(&ids)?;
    let graph = build_graph(&components, &relationships);

    Ok(LoadedPlugin {
        plugin_id,
        components,
        graph,
        failures: outcome.report.failures,
        analyzed_at: outcome.report.analyzed_at,
    })
}

fn display_names(components: &[Component]) -> HashMap<&str, &str> {
    components
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect()
}

fn name_of<'a>(names: &HashMap<&str, &'a str>, id: &'a str) -> &'a str {
    names.get(id).copied().unwrap_or(id)
}

fn render_text_report(
    plugin_id: &str,
    components: &[Component],
    graph: &Graph,
    failures: &[AnalysisFailure],
    min: codexgraph_types::Confidence,
) -> String {
    let summary = graph.summary();
    let names = display_names(components);
    let mut lines = vec![
        format!("Plugin {}: {} component(s)", plugin_id, components.len()),
        format!(
            "Relationships: {} total, {} high confidence, {} need review",
            summary.total_relationships, summary.high_confidence_links, summary.needs_review
        ),
        format!(
            "Components with dependencies: {}",
            summary.components_with_dependencies
        ),
    ];

    for node in graph.nodes_with_outgoing() {
        let shown: Vec<&Relationship> = graph
            .outgoing(&node.id)
            .into_iter()
            .filter(|r| r.confidence >= min)
            .collect();
        if shown.is_empty() {
            continue;
        }

        lines.push(format!("\n{} ({})", node.name, node.component_type));
        lines.extend(shown.into_iter().map(|rel| {
            let review = if rel.confidence.needs_review() {
                ", review"
            } else {
                ""
            };
            format!(
                "  {} {} [{}{}]",
                rel.kind.label(),
                name_of(&names, &rel.to_component_id),
                rel.confidence.level(),
                review
            )
        }));
    }

    if !failures.is_empty() {
        lines.push("\nFailed to analyze:".to_string());
        lines.extend(
            failures
                .iter()
                .map(|f| format!("  {}: {}", f.component_id, f.reason)),
        );
    }

    lines.join("\n")
}
