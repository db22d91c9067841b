use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use srt_core::GraphMode;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Completeness checks, suggestions and graphs for Solution Requirements Templates"
)]
pub struct Cli {
    /// Path to the template file (overrides SRT_DATA and the config file)
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// Template (SRT) id to work on
    #[clap(long, short = 't', global = true)]
    pub template: Option<String>,

    /// Enable debug logging
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config file if none exists
    Init,

    /// Print the active configuration
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Markdown completeness report
    Status,
    /// Render graph as JSON
    Graph,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List templates and their business requirements
    List,

    /// Show a business requirement
    Show {
        /// Business requirement id (e.g. BR01)
        br: String,
    },

    /// Show the completeness checklist of a business requirement
    Checklist {
        /// Business requirement id
        br: String,
    },

    /// Show the missing-information prompts of a business requirement
    Missing {
        /// Business requirement id
        br: String,
    },

    /// Summarize completeness across the template
    Status,

    /// Suggest impacted applications
    SuggestApps {
        /// Business requirement id
        br: String,

        /// Accept the suggestions and save them
        #[clap(long)]
        apply: bool,
    },

    /// Suggest typed dependencies between applications
    SuggestDeps {
        /// Business requirement id
        br: String,

        /// Comma-separated applications to consider
        #[clap(long, value_delimiter = ',')]
        apps: Option<Vec<String>>,

        /// Accept the suggestions and save them
        #[clap(long)]
        apply: bool,
    },

    /// Draft acceptance criteria
    DraftAc {
        /// Business requirement id
        br: String,

        /// Write the draft onto the first feature
        #[clap(long)]
        apply: bool,
    },

    /// Draft non-functional requirements
    DraftNfrs {
        /// Business requirement id
        br: String,

        /// Write the draft onto the first feature
        #[clap(long)]
        apply: bool,
    },

    /// Build the requirement graph
    Graph {
        /// Graph shape (defaults to the configured view)
        #[clap(long)]
        mode: Option<GraphMode>,

        /// Business requirement to center the dependency view on
        #[clap(long)]
        focus: Option<String>,

        /// Write the graph JSON to a file instead of stdout
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Create work items for a business requirement
    CreateItems {
        /// Business requirement id
        br: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Derive the solution intent pack
    Intent,

    /// Export a report or graph
    Export {
        /// What to export
        #[clap(long, value_enum, default_value = "status")]
        format: ExportFormat,

        /// Output file
        #[clap(long, short = 'o')]
        output: PathBuf,
    },

    /// Configuration commands
    #[clap(subcommand)]
    Config(ConfigCommand),
}
