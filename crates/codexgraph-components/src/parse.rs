//! Component markdown parsing
//!
//! Each component is a markdown file, optionally opened by a YAML
//! frontmatter block. Files without frontmatter are scanned line by line
//! for `key: value` hints and the first heading.

use anyhow::{anyhow, Context, Result};
use codexgraph_types::ComponentType;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

/// Maximum recommended component name length
const MAX_NAME_LENGTH: usize = 64;

/// A list field written either as a YAML sequence or `a, b, c`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StringList {
    Many(Vec<String>),
    One(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringList::Many(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringList::One(s) => split_list(&s),
        }
    }
}

/// Frontmatter keys understood for every component type
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    model: Option<String>,
    tags: Option<StringList>,
    tools: Option<StringList>,
    dependencies: Option<StringList>,
    requires: Option<StringList>,
}

/// Metadata recovered from one component file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedComponent {
    /// Frontmatter `name` or first `# ` heading
    pub name: Option<String>,
    /// Frontmatter `description` or first prose line
    pub description: Option<String>,
    /// Dashboard grouping, free text
    pub category: Option<String>,
    /// Preferred model (agents)
    pub model: Option<String>,
    /// Search tags
    pub tags: Vec<String>,
    /// Tool names the component may use
    pub tools: Vec<String>,
    /// Declared dependency names, resolved later by the graph engine
    pub dependencies: Vec<String>,
    /// Markdown after the frontmatter (whole file when there is none)
    pub body: String,
}

/// Parse component markdown into metadata and body
///
/// Fails only when a frontmatter block is present but is not valid YAML.
pub fn parse_component_markdown(
    content: &str,
    component_type: ComponentType,
) -> Result<ParsedComponent> {
    let frontmatter_re = Regex::new(r"^---[ \t]*\r?\n([\s\S]*?)\r?\n---[ \t]*(?:\r?\n|$)([\s\S]*)$")
        .map_err(|e| anyhow!("Failed to compile regex: {}", e))?;

    let Some(captures) = frontmatter_re.captures(content) else {
        return scan_lines(content, component_type);
    };

    let yaml_str = captures
        .get(1)
        .ok_or_else(|| anyhow!("Failed to extract frontmatter"))?
        .as_str();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    let frontmatter: Frontmatter = if yaml_str.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml_str).with_context(|| "Failed to parse YAML frontmatter")?
    };

    // Headings in the body fill whatever the frontmatter left out
    let fallback = scan_lines(body, component_type)?;

    let mut dependencies = frontmatter
        .dependencies
        .map(StringList::into_vec)
        .unwrap_or_default();
    if let Some(requires) = frontmatter.requires {
        dependencies.extend(requires.into_vec());
    }

    Ok(ParsedComponent {
        name: non_empty(frontmatter.name).or(fallback.name),
        description: non_empty(frontmatter.description).or(fallback.description),
        category: non_empty(frontmatter.category).or(fallback.category),
        model: non_empty(frontmatter.model).or(fallback.model),
        tags: frontmatter
            .tags
            .map(StringList::into_vec)
            .unwrap_or(fallback.tags),
        tools: frontmatter
            .tools
            .map(StringList::into_vec)
            .unwrap_or(fallback.tools),
        dependencies: if dependencies.is_empty() {
            fallback.dependencies
        } else {
            dependencies
        },
        body: body.to_string(),
    })
}

/// Line-oriented metadata scan for files without frontmatter
fn scan_lines(content: &str, component_type: ComponentType) -> Result<ParsedComponent> {
    let model_re =
        Regex::new(r"(?i)model:\s*(\w+)").map_err(|e| anyhow!("Failed to compile regex: {}", e))?;
    let tools_re =
        Regex::new(r"(?i)tools:\s*(.+)").map_err(|e| anyhow!("Failed to compile regex: {}", e))?;
    let tags_re =
        Regex::new(r"(?i)tags:\s*(.+)").map_err(|e| anyhow!("Failed to compile regex: {}", e))?;
    let category_re = Regex::new(r"(?i)category:\s*(.+)")
        .map_err(|e| anyhow!("Failed to compile regex: {}", e))?;
    let deps_re = Regex::new(r"(?i)(?:dependencies|requires):\s*(.+)")
        .map_err(|e| anyhow!("Failed to compile regex: {}", e))?;

    let mut parsed = ParsedComponent {
        body: content.to_string(),
        ..ParsedComponent::default()
    };

    for raw in content.lines() {
        let line = raw.trim();

        if parsed.name.is_none() {
            if let Some(heading) = line.strip_prefix("# ") {
                parsed.name = Some(heading.trim().to_string());
            }
        }

        if parsed.description.is_none()
            && !line.is_empty()
            && !line.starts_with('#')
            && !line.starts_with('-')
        {
            parsed.description = Some(line.to_string());
        }

        if component_type == ComponentType::Agent {
            if let Some(caps) = model_re.captures(line) {
                parsed.model = Some(caps[1].to_string());
            }
        }

        if let Some(caps) = tools_re.captures(line) {
            parsed.tools.extend(split_list(&caps[1]));
        }

        if let Some(caps) = tags_re.captures(line) {
            parsed.tags.extend(split_list(&caps[1]));
        }

        if let Some(caps) = category_re.captures(line) {
            parsed.category = Some(caps[1].trim().to_string());
        }

        if let Some(caps) = deps_re.captures(line) {
            parsed.dependencies.extend(split_list(&caps[1]));
        }
    }

    Ok(parsed)
}

/// Turn a display name into a slug: lower-case, whitespace and underscores
/// become hyphens
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .collect()
}

/// Validate a component name
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("Component name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        warn!(
            "Component name '{}' exceeds {} characters (was {})",
            name,
            MAX_NAME_LENGTH,
            name.len()
        );
    }

    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_matches(|c| c == '[' || c == ']').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter_agent() {
        let content = r#"---
name: code-reviewer
description: Reviews code for best practices and security.
tools: Read, Grep, Glob
model: sonnet
---

# Code Reviewer

Use skill: lint-rules before commenting.
"#;

        let parsed = parse_component_markdown(content, ComponentType::Agent).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("code-reviewer"));
        assert_eq!(
            parsed.description.as_deref(),
            Some("Reviews code for best practices and security.")
        );
        assert_eq!(parsed.tools, vec!["Read", "Grep", "Glob"]);
        assert_eq!(parsed.model.as_deref(), Some("sonnet"));
        assert!(parsed.body.contains("# Code Reviewer"));
    }

    #[test]
    fn test_parse_frontmatter_yaml_lists() {
        let content = "---\nname: deploy\ndependencies:\n  - test\n  - build_app\ntags: [ci, release]\n---\nbody\n";

        let parsed = parse_component_markdown(content, ComponentType::Command).unwrap();
        assert_eq!(parsed.dependencies, vec!["test", "build_app"]);
        assert_eq!(parsed.tags, vec!["ci", "release"]);
    }

    #[test]
    fn test_parse_without_frontmatter() {
        let content = "# Deploy Pipeline\n\nShips the current branch.\n\ncategory: ops\ndependencies: test, lint\n";

        let parsed = parse_component_markdown(content, ComponentType::Command).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Deploy Pipeline"));
        assert_eq!(parsed.description.as_deref(), Some("Ships the current branch."));
        assert_eq!(parsed.category.as_deref(), Some("ops"));
        assert_eq!(parsed.dependencies, vec!["test", "lint"]);
        assert!(parsed.model.is_none());
    }

    #[test]
    fn test_model_line_only_read_for_agents() {
        let content = "# Thing\nmodel: opus\n";
        let as_skill = parse_component_markdown(content, ComponentType::Skill).unwrap();
        let as_agent = parse_component_markdown(content, ComponentType::Agent).unwrap();
        assert!(as_skill.model.is_none());
        assert_eq!(as_agent.model.as_deref(), Some("opus"));
    }

    #[test]
    fn test_invalid_frontmatter_is_an_error() {
        let content = "---\nname: [unclosed\n---\nbody\n";
        assert!(parse_component_markdown(content, ComponentType::Rule).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Code Review"), "code-review");
        assert_eq!(slugify("build_app"), "build-app");
        assert_eq!(slugify("  Already-Slugged "), "already-slugged");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("deploy").is_ok());
        assert!(validate_name("   ").is_err());
    }
}
