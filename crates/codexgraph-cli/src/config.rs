use anyhow::{anyhow, Context};
use codexgraph_graph::CyclePolicy;
use codexgraph_types::{CommandConfig, Confidence};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[logging]
level = "info"  # trace, debug, info, warn, error
format = "pretty"  # or "json"

[compiler]
cycle_policy = "exclude"  # or "reject"

[command]
name = "workflow"
description = ""
allowed_tools = []
model = "inherit"  # inherit, sonnet, opus, haiku
argument_hint = ""

[analysis]
min_confidence = 1  # 1 = low, 2 = medium, 3 = high
"#;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CompilerConfig {
    pub cycle_policy: CyclePolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lowest tier the `analyze` report prints
    pub min_confidence: Confidence,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_confidence: Confidence::Low,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub compiler: CompilerConfig,
    /// Frontmatter defaults for compiled commands
    pub command: CommandConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Get the global config path: ~/.codexgraph/codexgraph.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".codexgraph").join("codexgraph.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).with_context(|| {
                    format!("Failed to create config directory {}", config_dir.display())
                })?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.codexgraph/codexgraph.toml (auto-created if missing)
    /// 2. Local override: ./codexgraph.toml (optional)
    /// 3. Environment variables with the CODEXGRAPH__ prefix (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let config = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("codexgraph").required(false))
            .add_source(
                config::Environment::with_prefix("CODEXGRAPH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config)
    }
}

/// Read a standalone command config file, e.g. one exported next to a workflow
pub fn load_command_config(path: &std::path::Path) -> anyhow::Result<CommandConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid command config {}", path.display()))
}
