//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::ServeMode;

/// Locate and rewrite `@font-tool` font-size markers in React sources
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: font-tool.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "font-tool.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output (per-element diagnostics)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan the project for font-size markers and print component records
    #[command(visible_alias = "sc")]
    Scan {
        /// Project root (overrides [project.root])
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Apply a font configuration (JSON) to the project sources
    #[command(visible_alias = "a")]
    Apply {
        /// Configuration file. Use `-` to read from stdin.
        #[arg(value_hint = clap::ValueHint::FilePath, default_value = "-")]
        input: PathBuf,

        /// Project root (overrides [project.root] and `projectDir`)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        /// Print the batch report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Start the notification channel and the HTTP control API
    #[command(visible_alias = "s")]
    Serve {
        /// Project root (overrides [project.root])
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Notification channel port
        #[arg(short, long)]
        port: Option<u16>,

        /// HTTP control API port
        #[arg(short = 'P', long)]
        control_port: Option<u16>,

        /// Broadcast updates (notify) or only write files (direct)
        #[arg(short, long, value_enum)]
        mode: Option<ServeMode>,
    },

    /// Connect to the notification channel and consume updates
    #[command(visible_alias = "w")]
    Watch {
        /// HTML snapshot to restyle on each update
        #[arg(long, value_hint = clap::ValueHint::FilePath, conflicts_with = "editor")]
        page: Option<PathBuf>,

        /// Write the restyled page back after each update
        #[arg(short, long, requires = "page")]
        write: bool,

        /// Report marker positions in updated files (editor consumer)
        #[arg(short, long)]
        editor: bool,

        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Request enriched debug payloads
        #[arg(short, long)]
        debug: bool,
    },

    /// Query the status of a running server
    Status {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Request enriched debug payloads
        #[arg(short, long)]
        debug: bool,
    },

    /// Show source context around lines of a component file
    Show {
        /// File name (`Card.tsx`), optionally with lines (`Card.tsx:12,20`)
        file: String,

        /// Lines to show, comma-separated
        #[arg(short, long, value_delimiter = ',')]
        lines: Vec<usize>,

        /// Project root (overrides [project.root])
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch { .. })
    }
}
