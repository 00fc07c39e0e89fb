//! Discovery against a plugin laid out on disk

use codexgraph_components::ComponentCatalog;
use codexgraph_types::ComponentType;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_plugin(root: &Path) {
    write(
        root,
        "agents/reviewer.md",
        "---\nname: reviewer\ndescription: Reviews pull requests\nmodel: opus\ntools: Read, Grep\n---\n\nUse skill: code-review on every diff.\n",
    );
    write(
        root,
        "skills/code-review.md",
        "---\nname: code-review\ndescription: Review checklist\ntags: [quality, review]\n---\n\n# Checklist\n",
    );
    write(
        root,
        "commands/ship.md",
        "# ship\nBuild and release the current branch\n\nRun /check first.\n",
    );
    write(root, "rules/notes.txt", "not a component");
}

#[test]
fn test_discover_sample_plugin() {
    let dir = tempfile::tempdir().unwrap();
    sample_plugin(dir.path());

    let mut catalog = ComponentCatalog::new("demo", dir.path());
    catalog.discover().unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.count_by_type(ComponentType::Agent), 1);
    assert_eq!(catalog.count_by_type(ComponentType::Rule), 0);

    let reviewer = catalog.get("demo:agent:reviewer").unwrap();
    assert_eq!(reviewer.description.as_deref(), Some("Reviews pull requests"));
    assert_eq!(reviewer.tool_names, vec!["Read", "Grep"]);
    assert!(reviewer.content.as_deref().unwrap().contains("Use skill: code-review"));

    let skill = catalog.get("demo:skill:code-review").unwrap();
    assert_eq!(skill.tags, vec!["quality", "review"]);

    let ship = catalog.get("demo:command:ship").unwrap();
    assert_eq!(ship.name, "ship");
    assert_eq!(
        ship.description.as_deref(),
        Some("Build and release the current branch")
    );
}

#[test]
fn test_broken_file_skipped() {
    let dir = tempfile::tempdir().unwrap();
    sample_plugin(dir.path());
    write(dir.path(), "skills/broken.md", "---\nname: [unclosed\n---\nbody\n");

    let mut catalog = ComponentCatalog::new("demo", dir.path());
    catalog.discover().unwrap();

    assert_eq!(catalog.count_by_type(ComponentType::Skill), 1);
    assert!(catalog.get("demo:skill:broken").is_none());
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = ComponentCatalog::for_dir(dir.path().join("absent"));
    assert!(catalog.discover().is_err());
    assert_eq!(catalog.plugin_id(), "local:absent");
}
