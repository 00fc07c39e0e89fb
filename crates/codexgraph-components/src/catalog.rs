//! Local plugin catalog
//!
//! A plugin directory holds one sub-directory per component type:
//! `agents/`, `skills/`, `commands/`, `rules/`, each with `*.md` files.

use anyhow::{Context, Result};
use codexgraph_types::{Component, ComponentType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::parse::{parse_component_markdown, validate_name};

/// Components discovered in one plugin directory
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    plugin_id: String,
    root: PathBuf,
    components: Vec<Component>,
}

impl ComponentCatalog {
    /// Create an empty catalog for a plugin rooted at `root`
    pub fn new(plugin_id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            root: root.into(),
            components: Vec::new(),
        }
    }

    /// Use the directory name as plugin id
    pub fn for_dir(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let plugin_id = root
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| format!("local:{}", n))
            .unwrap_or_else(|| "local:plugin".to_string());
        Self::new(plugin_id, root)
    }

    /// Scan every component type directory
    ///
    /// A file that cannot be read or parsed is skipped so one broken
    /// component never hides the rest of the plugin.
    pub fn discover(&mut self) -> Result<()> {
        info!("Discovering components for {} in {:?}", self.plugin_id, self.root);

        if !self.root.is_dir() {
            return Err(anyhow::anyhow!(
                "Plugin path is not a directory: {:?}",
                self.root
            ));
        }

        self.components.clear();

        for component_type in ComponentType::ALL {
            let dir = self.root.join(component_type.plugin_dir());
            if !dir.is_dir() {
                debug!("No {} directory in {:?}", component_type.plugin_dir(), self.root);
                continue;
            }
            self.scan_type_dir(&dir, component_type)?;
        }

        info!(
            "Discovered {} components ({} agents, {} skills, {} commands, {} rules)",
            self.components.len(),
            self.count_by_type(ComponentType::Agent),
            self.count_by_type(ComponentType::Skill),
            self.count_by_type(ComponentType::Command),
            self.count_by_type(ComponentType::Rule),
        );
        Ok(())
    }

    fn scan_type_dir(&mut self, dir: &Path, component_type: ComponentType) -> Result<()> {
        let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        files.sort();

        for path in files {
            match load_component_file(&path, component_type, &self.plugin_id) {
                Ok(component) => {
                    debug!("Discovered {} {} at {:?}", component_type, component.name, path);
                    self.components.push(component);
                }
                Err(e) => {
                    warn!("Skipping {:?}: {:#}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Plugin id used as prefix of every component id
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Discovered components, in scan order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Consume the catalog, keeping the components
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Look up a component by id
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Number of components of one type
    pub fn count_by_type(&self, component_type: ComponentType) -> usize {
        self.components
            .iter()
            .filter(|c| c.component_type == component_type)
            .count()
    }

    /// Number of discovered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Load a single component file
///
/// The file stem is the slug; the id is `{plugin_id}:{type}:{slug}`.
pub fn load_component_file(
    path: &Path,
    component_type: ComponentType,
    plugin_id: &str,
) -> Result<Component> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name {:?}", path))?
        .to_string();

    let parsed = parse_component_markdown(&content, component_type)
        .with_context(|| format!("Failed to parse component from {:?}", path))?;

    let name = parsed.name.unwrap_or_else(|| slug.clone());
    validate_name(&name)?;

    Ok(Component {
        id: format!("{}:{}:{}", plugin_id, component_type, slug),
        component_type,
        name,
        slug,
        description: parsed.description,
        content: Some(content),
        category: parsed.category,
        tags: parsed.tags,
        tool_names: parsed.tools,
        declared_dependency_names: parsed.dependencies,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_new_is_empty() {
        let catalog = ComponentCatalog::new("local:demo", "/nonexistent");
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn test_discover_missing_root_fails() {
        let mut catalog = ComponentCatalog::new("local:demo", "/nonexistent/plugin");
        assert!(catalog.discover().is_err());
    }

    #[test]
    fn test_for_dir_derives_plugin_id() {
        let catalog = ComponentCatalog::for_dir("/tmp/my-plugin");
        assert_eq!(catalog.plugin_id(), "local:my-plugin");
    }
}
