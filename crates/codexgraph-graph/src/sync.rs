//! Plugin analysis job
//!
//! Runs relationship extraction for every component of a snapshot on the
//! blocking pool, then merges the per-component results. One component
//! failing never takes the others down.

use crate::error::{GraphError, Result};
use crate::extract::{dedupe_relationships, extract_relationships_with, MentionMatchers};
use crate::graph::{build_graph, Graph};
use crate::store::{ComponentSource, RelationshipStore};
use chrono::{DateTime, Utc};
use codexgraph_types::{Component, Relationship};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Extraction failure isolated to one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub component_id: String,
    pub reason: String,
}

/// Outcome of analyzing one component snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Merged relationships, unique per `(from, to, kind)`
    pub relationships: Vec<Relationship>,
    pub failures: Vec<AnalysisFailure>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Relationship graph over the analyzed components
    #[must_use]
    pub fn graph(&self, components: &[Component]) -> Graph {
        build_graph(components, &self.relationships)
    }
}

/// Extract relationships for every component concurrently
///
/// Results are merged in snapshot order, so the report is the same no
/// matter which task finishes first.
pub async fn analyze_snapshot(components: Vec<Component>) -> AnalysisReport {
    let sources: Vec<usize> = (0..components.len()).collect();
    run_extraction(Arc::new(components), sources).await
}

/// Extract relationships only for the components named in `source_ids`
///
/// The whole `snapshot` is still the target set. Ids missing from the
/// snapshot are ignored.
pub async fn analyze_sources(snapshot: Vec<Component>, source_ids: &[String]) -> AnalysisReport {
    let wanted: HashSet<&str> = source_ids.iter().map(String::as_str).collect();
    let sources: Vec<usize> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, c)| wanted.contains(c.id.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    run_extraction(Arc::new(snapshot), sources).await
}

async fn run_extraction(snapshot: Arc<Vec<Component>>, sources: Vec<usize>) -> AnalysisReport {
    let total = sources.len();
    info!("Analyzing {} of {} component(s)", total, snapshot.len());

    let mentions = Arc::new(MentionMatchers::new(&snapshot));
    let mut tasks = JoinSet::new();
    let mut task_slots = HashMap::new();
    for (slot, &idx) in sources.iter().enumerate() {
        let snapshot = Arc::clone(&snapshot);
        let mentions = Arc::clone(&mentions);
        let handle = tasks.spawn_blocking(move || {
            extract_relationships_with(&snapshot[idx], &snapshot, &mentions)
        });
        task_slots.insert(handle.id(), slot);
    }

    let mut outcomes: Vec<Option<Result<Vec<Relationship>>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome),
            Err(e) => (e.id(), Err(GraphError::Task(e.to_string()))),
        };
        if let Some(&slot) = task_slots.get(&id) {
            outcomes[slot] = Some(outcome);
        }
    }

    let mut merged = Vec::new();
    let mut failures = Vec::new();
    for (&idx, outcome) in sources.iter().zip(outcomes) {
        let component = &snapshot[idx];
        let outcome = outcome.unwrap_or_else(|| {
            Err(GraphError::Task("extraction task did not report".to_string()))
        });
        match outcome {
            Ok(relationships) => merged.extend(relationships),
            Err(e) => {
                warn!("Skipping '{}': {}", component.id, e);
                failures.push(AnalysisFailure {
                    component_id: component.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let relationships = dedupe_relationships(merged);
    info!(
        "Analysis complete: {} relationship(s), {}/{} component(s) failed",
        relationships.len(),
        failures.len(),
        total
    );

    AnalysisReport {
        relationships,
        failures,
        analyzed_at: Utc::now(),
    }
}

/// Result of syncing one plugin
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub report: AnalysisReport,
    /// Rows the store did not already hold
    pub inserted: usize,
}

/// Analyze one plugin and persist its relationships
///
/// Only the plugin's own components are extracted; targets may live in
/// any plugin, so every known component is in the snapshot.
pub async fn sync_plugin<S, R>(source: &S, store: &R, plugin_id: &str) -> Result<SyncOutcome>
where
    S: ComponentSource + ?Sized,
    R: RelationshipStore + ?Sized,
{
    let own = source.components_for_plugin(plugin_id)?;
    if own.is_empty() {
        info!("Plugin '{}' has no components to analyze", plugin_id);
        return Ok(SyncOutcome {
            report: AnalysisReport {
                relationships: Vec::new(),
                failures: Vec::new(),
                analyzed_at: Utc::now(),
            },
            inserted: 0,
        });
    }

    let own_ids: Vec<String> = own.iter().map(|c| c.id.clone()).collect();
    let mut snapshot = source.all_components()?;
    let known: HashSet<String> = snapshot.iter().map(|c| c.id.clone()).collect();
    snapshot.extend(own.into_iter().filter(|c| !known.contains(&c.id)));

    let report = analyze_sources(snapshot, &own_ids).await;
    let inserted = store.upsert(&report.relationships)?;
    info!(
        "Plugin '{}': {} relationship(s) found, {} new",
        plugin_id,
        report.relationships.len(),
        inserted
    );
    Ok(SyncOutcome { report, inserted })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use codexgraph_types::{ComponentType, Confidence, RelationshipKind};

    fn component(ty: ComponentType, slug: &str, content: &str) -> Component {
        Component::new(format!("p:{}:{}", ty, slug), ty, slug, slug).with_content(content)
    }

    fn snapshot() -> Vec<Component> {
        vec![
            component(ComponentType::Skill, "code-review", "# Code review"),
            component(
                ComponentType::Command,
                "ship",
                "Run /check first.\nThis command requires skill: code-review",
            ),
            component(ComponentType::Command, "check", "Runs the linters"),
        ]
    }

    #[tokio::test]
    async fn test_analyze_merges_all_components() {
        let report = analyze_snapshot(snapshot()).await;

        assert!(report.failures.is_empty());
        assert_eq!(report.relationships.len(), 2);
        assert!(report.relationships.iter().any(|r| {
            r.to_component_id == "p:skill:code-review"
                && r.kind == RelationshipKind::Requires
                && r.confidence == Confidence::High
        }));
        assert!(report
            .relationships
            .iter()
            .any(|r| r.to_component_id == "p:command:check" && r.kind == RelationshipKind::Calls));
    }

    #[tokio::test]
    async fn test_missing_content_isolated() {
        let mut components = snapshot();
        components.push(Component::new(
            "p:agent:empty",
            ComponentType::Agent,
            "empty",
            "empty",
        ));

        let report = analyze_snapshot(components).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].component_id, "p:agent:empty");
        assert_eq!(report.relationships.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let report = analyze_snapshot(Vec::new()).await;
        assert!(report.relationships.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_sync_plugin_is_insert_or_ignore() {
        let store = MemoryStore::new();
        store.add_components("p", snapshot()).unwrap();

        let first = sync_plugin(&store, &store, "p").await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.report.relationships.len(), 2);
        assert_eq!(sync_plugin(&store, &store, "p").await.unwrap().inserted, 0);
        assert_eq!(
            sync_plugin(&store, &store, "unknown").await.unwrap().inserted,
            0
        );
        assert_eq!(store.relationship_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_analyze_sources_skips_other_components() {
        let mut components = snapshot();
        components.push(Component::new(
            "p:agent:empty",
            ComponentType::Agent,
            "empty",
            "empty",
        ));

        let report = analyze_sources(components, &["p:command:ship".to_string()]).await;
        assert!(report.failures.is_empty());
        assert_eq!(report.relationships.len(), 2);
        assert!(report
            .relationships
            .iter()
            .all(|r| r.from_component_id == "p:command:ship"));
    }

    #[tokio::test]
    async fn test_sync_plugin_ignores_other_plugins_failures() {
        let store = MemoryStore::new();
        store
            .add_components(
                "mine",
                [Component::new("mine:agent:lead", ComponentType::Agent, "lead", "lead")
                    .with_content("This agent requires agent: helper-0")],
            )
            .unwrap();
        store
            .add_components(
                "other",
                (0..50).map(|i| {
                    let slug = format!("helper-{i}");
                    Component::new(
                        format!("other:agent:{slug}"),
                        ComponentType::Agent,
                        slug.clone(),
                        slug,
                    )
                }),
            )
            .unwrap();

        let outcome = sync_plugin(&store, &store, "mine").await.unwrap();
        assert!(outcome.report.failures.is_empty());
        assert_eq!(outcome.inserted, 1);
        assert_eq!(
            outcome.report.relationships[0].to_component_id,
            "other:agent:helper-0"
        );
        assert_eq!(store.relationship_count().unwrap(), 1);
    }
}
