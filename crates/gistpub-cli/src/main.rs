// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! gistpub - publish git-tracked content to wikis, issues, and chat.
//!
//! Each subcommand is one pipeline stage in its own short-lived process;
//! stages hand records to each other as base64 event payloads on stdout
//! and the command line.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::*;
use gistpub_observability::{init_tracing, LogFormat};

#[derive(Parser)]
#[command(name = "gistpub")]
#[command(version, about = "Operations on gists managed by git")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Working directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "PATH")]
    cwd: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare the gistpub attribute in this repository
    Init(InitCmd),

    /// Discover annotated gists and emit a Gist event
    Discover(DiscoverCmd),

    /// Render notebook gists as static html and emit a Gist event
    Notebook(NotebookCmd),

    /// Convert gists with pandoc and emit a ConvertedGist event
    Convert(ConvertCmd),

    /// Publish converted gists to Confluence
    Confluence(ConfluenceCmd),

    /// Publish converted gists to Jira
    Jira(JiraCmd),

    /// Post a trail summary to a webhook
    Report(ReportCmd),

    /// Mirror branches between two git remotes
    Mirror(MirrorCmd),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let level = if cli.verbose { "debug" } else { "info" };
        init_tracing(LogFormat::Compact, Some(level)).ok();
    }

    if let Some(cwd) = cli.cwd {
        std::env::set_var("GISTPUB_CWD", cwd);
    }

    let result: Result<()> = match cli.command {
        Commands::Init(cmd) => cmd.execute().await,
        Commands::Discover(cmd) => cmd.execute().await,
        Commands::Notebook(cmd) => cmd.execute().await,
        Commands::Convert(cmd) => cmd.execute().await,
        Commands::Confluence(cmd) => cmd.execute().await,
        Commands::Jira(cmd) => cmd.execute().await,
        Commands::Report(cmd) => cmd.execute().await,
        Commands::Mirror(cmd) => cmd.execute().await,
    };

    if let Err(err) = result {
        output::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}
