//! Relationship extraction
//!
//! Scans a component's content for textual signals pointing at other
//! components of the same snapshot. Five passes run in fixed order, each
//! additive:
//!
//! 1. explicit declarations (`uses agent: x`, `requires skill: x`, ...), tier 3
//! 2. slash invocations of commands (`/deploy`), tier 2
//! 3. Task-tool agent delegation (`task tool ... agent: x`), tier 2
//! 4. the component's declared dependency list, tier 3
//! 5. bare mentions of other skills' names, tier 1
//!
//! Results are de-duplicated by `(from, to, kind)` at the end.

use crate::error::{GraphError, Result};
use codexgraph_types::{Component, ComponentType, Confidence, Relationship, RelationshipKind};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// One trigger → kind mapping for the explicit-declaration pass
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    /// Regex over lower-cased content; group 1 is the referenced name
    pub pattern: &'static str,
    pub kind: RelationshipKind,
    /// Restrict resolution to one component type
    pub target_type: Option<ComponentType>,
}

/// Explicit declaration triggers. Edit this table, not the matcher.
pub const EXPLICIT_PATTERNS: &[PatternRule] = &[
    PatternRule {
        pattern: r"uses?\s+agent[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::Uses,
        target_type: Some(ComponentType::Agent),
    },
    PatternRule {
        pattern: r"requires?\s+agent[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::Requires,
        target_type: Some(ComponentType::Agent),
    },
    PatternRule {
        pattern: r"uses?\s+skill[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::Uses,
        target_type: Some(ComponentType::Skill),
    },
    PatternRule {
        pattern: r"requires?\s+skill[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::Requires,
        target_type: Some(ComponentType::Skill),
    },
    PatternRule {
        pattern: r"calls?\s+command[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::Calls,
        target_type: Some(ComponentType::Command),
    },
    PatternRule {
        pattern: r"extends?\s+([a-z0-9_-]+)",
        kind: RelationshipKind::Extends,
        target_type: None,
    },
    PatternRule {
        pattern: r"depends?\s+on[:\s]+([a-z0-9_-]+)",
        kind: RelationshipKind::DependsOn,
        target_type: None,
    },
];

static EXPLICIT_RULES: LazyLock<Vec<(Regex, PatternRule)>> = LazyLock::new(|| {
    EXPLICIT_PATTERNS
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(re) => Some((re, *rule)),
            Err(e) => {
                tracing::error!("Invalid extraction pattern {:?}: {}", rule.pattern, e);
                None
            }
        })
        .collect()
});

static SLASH_INVOCATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/([a-z0-9_-]+)").ok());

static TASK_AGENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"task\s+tool.*?agent[:\s]+([a-z0-9_-]+)").ok());

/// Lower-case and turn whitespace/underscores into hyphens
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .collect()
}

/// Resolve a referenced name against the snapshot; first match wins
pub fn resolve_component<'a>(
    name: &str,
    components: &'a [Component],
    target_type: Option<ComponentType>,
) -> Option<&'a Component> {
    let wanted = normalize_name(name);
    components.iter().find(|c| {
        let type_ok = target_type.map_or(true, |t| c.component_type == t);
        type_ok && (c.slug.to_lowercase() == wanted || normalize_name(&c.name) == wanted)
    })
}

/// Collects candidate edges for one source component
struct Collector<'a> {
    source: &'a Component,
    found: Vec<Relationship>,
}

impl<'a> Collector<'a> {
    fn push(
        &mut self,
        target: &Component,
        kind: RelationshipKind,
        confidence: Confidence,
        note: String,
    ) {
        self.found.push(
            Relationship::new(&self.source.id, &target.id, kind, confidence).with_note(note),
        );
    }

    fn targets(&self) -> HashSet<&str> {
        self.found.iter().map(|r| r.to_component_id.as_str()).collect()
    }
}

/// Whole-word name matchers for every skill in a snapshot
///
/// Built once per snapshot and shared by every extraction over it.
#[derive(Debug, Clone, Default)]
pub struct MentionMatchers {
    /// `(index into the snapshot, matcher)`
    matchers: Vec<(usize, Regex)>,
}

impl MentionMatchers {
    pub fn new(all_components: &[Component]) -> Self {
        let matchers = all_components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.component_type == ComponentType::Skill)
            .filter_map(|(idx, c)| {
                let name = c.name.trim();
                if name.is_empty() {
                    return None;
                }
                match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))) {
                    Ok(re) => Some((idx, re)),
                    Err(e) => {
                        debug!("{}: no mention matcher: {}", c.id, e);
                        None
                    }
                }
            })
            .collect();
        Self { matchers }
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// Extract candidate relationships from one component
///
/// Every target comes from `all_components`. Unresolved references are
/// dropped. Fails only when the component carries no content at all.
pub fn extract_relationships(
    component: &Component,
    all_components: &[Component],
) -> Result<Vec<Relationship>> {
    let mentions = MentionMatchers::new(all_components);
    extract_relationships_with(component, all_components, &mentions)
}

/// [`extract_relationships`] with matchers prepared for `all_components`
pub fn extract_relationships_with(
    component: &Component,
    all_components: &[Component],
    mentions: &MentionMatchers,
) -> Result<Vec<Relationship>> {
    let raw = component
        .content
        .as_deref()
        .ok_or_else(|| GraphError::MissingContent {
            component_id: component.id.clone(),
        })?;
    let content = raw.to_lowercase();

    let mut collector = Collector {
        source: component,
        found: Vec::new(),
    };

    // 1. Explicit declarations
    for (re, rule) in EXPLICIT_RULES.iter() {
        for caps in re.captures_iter(&content) {
            let name = caps[1].trim();
            match resolve_component(name, all_components, rule.target_type) {
                Some(target) => {
                    let note = format!("{} {} {}", component.name, rule.kind.label(), target.name);
                    collector.push(target, rule.kind, Confidence::High, note);
                }
                None => debug!(
                    "{}: unresolved '{}' reference to '{}'",
                    component.id, rule.kind, name
                ),
            }
        }
    }

    // 2. Slash invocations
    if let Some(re) = SLASH_INVOCATION.as_ref() {
        for caps in re.captures_iter(&content) {
            let name = &caps[1];
            if let Some(target) =
                resolve_component(name, all_components, Some(ComponentType::Command))
            {
                let note = format!("{} calls /{}", component.name, name);
                collector.push(target, RelationshipKind::Calls, Confidence::Medium, note);
            }
        }
    }

    // 3. Task tool delegation
    if let Some(re) = TASK_AGENT.as_ref() {
        for caps in re.captures_iter(&content) {
            let name = &caps[1];
            match resolve_component(name, all_components, Some(ComponentType::Agent)) {
                Some(target) => {
                    let note = format!("{} uses {} via Task tool", component.name, name);
                    collector.push(target, RelationshipKind::Uses, Confidence::Medium, note);
                }
                None => debug!("{}: unresolved Task tool agent '{}'", component.id, name),
            }
        }
    }

    // 4. Declared dependencies
    for dep in &component.declared_dependency_names {
        match resolve_component(dep, all_components, None) {
            Some(target) => {
                let note = format!("{} depends on {}", component.name, target.name);
                collector.push(target, RelationshipKind::DependsOn, Confidence::High, note);
            }
            None => debug!("{}: unresolved dependency '{}'", component.id, dep),
        }
    }

    // 5. Bare skill name mentions
    let already_linked: HashSet<String> =
        collector.targets().into_iter().map(str::to_string).collect();
    for (idx, re) in &mentions.matchers {
        let Some(other) = all_components.get(*idx) else {
            continue;
        };
        if other.id == component.id || already_linked.contains(&other.id) {
            continue;
        }
        if re.is_match(&content) {
            let note = format!("{} uses {} skill", component.name, other.name);
            collector.push(other, RelationshipKind::Uses, Confidence::Low, note);
        }
    }

    Ok(dedupe_relationships(collector.found))
}

/// Keep the first relationship per `(from, to, kind)`, preserving order
#[must_use]
pub fn dedupe_relationships(relationships: Vec<Relationship>) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    relationships
        .into_iter()
        .filter(|r| seen.insert(r.key()))
        .collect()
}
