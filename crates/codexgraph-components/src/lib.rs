//! CodexGraph Components
//!
//! Turns plugin directories of markdown files into [`Component`] records
//! for the graph engine.
//!
//! ## Layout
//!
//! ```text
//! my-plugin/
//!   agents/reviewer.md
//!   skills/code-review.md
//!   commands/deploy.md
//!   rules/no-force-push.md
//! ```
//!
//! Metadata comes from YAML frontmatter when present, otherwise from the
//! first heading and `key: value` lines.
//!
//! [`Component`]: codexgraph_types::Component

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod catalog;
pub mod parse;

pub use catalog::{load_component_file, ComponentCatalog};
pub use parse::{parse_component_markdown, slugify, ParsedComponent};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ComponentCatalog, ParsedComponent};
}
