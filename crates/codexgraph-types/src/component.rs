use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of reusable assistant configuration unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Command,
    Agent,
    Skill,
    Rule,
}

impl ComponentType {
    /// All component types, in plugin directory scan order
    pub const ALL: [ComponentType; 4] = [
        ComponentType::Agent,
        ComponentType::Skill,
        ComponentType::Command,
        ComponentType::Rule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Command => "command",
            ComponentType::Agent => "agent",
            ComponentType::Skill => "skill",
            ComponentType::Rule => "rule",
        }
    }

    /// Directory holding this type inside a plugin (`agents/`, `skills/`, ...)
    pub fn plugin_dir(&self) -> &'static str {
        match self {
            ComponentType::Command => "commands",
            ComponentType::Agent => "agents",
            ComponentType::Skill => "skills",
            ComponentType::Rule => "rules",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known component type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown component type '{0}'")]
pub struct ParseComponentTypeError(pub String);

impl FromStr for ComponentType {
    type Err = ParseComponentTypeError;

    /// Accepts both the singular type name and the plugin directory name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "command" | "commands" => Ok(ComponentType::Command),
            "agent" | "agents" => Ok(ComponentType::Agent),
            "skill" | "skills" => Ok(ComponentType::Skill),
            "rule" | "rules" => Ok(ComponentType::Rule),
            other => Err(ParseComponentTypeError(other.to_string())),
        }
    }
}

/// One reusable unit (command / agent / skill / rule) and its content
///
/// Owned by ingestion; the graph engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw markdown. Stored rows may carry no content at all.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "tools")]
    pub tool_names: Vec<String>,
    #[serde(default, alias = "dependencies")]
    pub declared_dependency_names: Vec<String>,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        component_type: ComponentType,
        name: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            component_type,
            name: name.into(),
            slug: slug.into(),
            description: None,
            content: None,
            category: None,
            tags: Vec::new(),
            tool_names: Vec::new(),
            declared_dependency_names: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_dependency_names = names.into_iter().map(Into::into).collect();
        self
    }
}
