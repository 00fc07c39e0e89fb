//! Command-line definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "codexgraph",
    version = env!("CARGO_PKG_VERSION"),
    about = "Infer relationships between plugin components and compile workflows into commands"
)]
pub struct Cli {
    /// Log level override (trace, debug, info, warn, error)
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover components in a plugin directory and report their relationships
    Analyze {
        /// Plugin root holding agents/, skills/, commands/ and rules/
        plugin_dir: PathBuf,
        /// Plugin id used to build component ids (defaults to `local:<dir name>`)
        #[clap(long)]
        plugin_id: Option<String>,
        /// Output format
        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report dependency cycles; exits non-zero when any exist
    Cycles {
        /// Plugin root holding agents/, skills/, commands/ and rules/
        plugin_dir: PathBuf,
        #[clap(long)]
        plugin_id: Option<String>,
    },
    /// Compile a saved workflow JSON document into a command
    Compile {
        /// Saved workflow document
        workflow: PathBuf,
        /// Command settings (TOML); defaults to the [command] config section
        #[clap(long)]
        config: Option<PathBuf>,
        /// Fail instead of dropping nodes caught in a cycle
        #[clap(long)]
        reject_cycles: bool,
        /// Write the artifact here instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}
