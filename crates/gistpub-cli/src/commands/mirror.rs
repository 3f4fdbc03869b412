// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Mirror branches from a source remote to a target remote.

use crate::output;
use anyhow::{Context, Result};
use clap::Parser;
use gistpub_git::{as_remote, mirror};
use gistpub_observability::TrailWriter;
use std::path::Path;

/// Mirror matching branches between two remotes
#[derive(Parser, Debug)]
pub struct MirrorCmd {
    /// Regex selecting the branches to mirror
    #[arg(value_name = "BRANCH_REGEX")]
    pub branch_regex: String,

    /// Source remote url (fallback: GISTPUB_GIT_SOURCE_URL)
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,

    /// Source remote username (fallback: GISTPUB_GIT_SOURCE_USERNAME)
    #[arg(long, value_name = "NAME")]
    pub source_username: Option<String>,

    /// Source remote password (fallback: GISTPUB_GIT_SOURCE_PASSWORD)
    #[arg(long, value_name = "SECRET")]
    pub source_password: Option<String>,

    /// Target remote url (fallback: GISTPUB_GIT_TARGET_URL)
    #[arg(long, value_name = "URL")]
    pub target_url: Option<String>,

    /// Target remote username (fallback: GISTPUB_GIT_TARGET_USERNAME)
    #[arg(long, value_name = "NAME")]
    pub target_username: Option<String>,

    /// Target remote password (fallback: GISTPUB_GIT_TARGET_PASSWORD)
    #[arg(long, value_name = "SECRET")]
    pub target_password: Option<String>,

    /// Fetch and plan but push nothing
    #[arg(long)]
    pub dry_run: bool,
}

fn arg_or_env(arg: &Option<String>, env: &str) -> Option<String> {
    arg.clone().or_else(|| std::env::var(env).ok())
}

impl MirrorCmd {
    pub async fn execute(&self) -> Result<()> {
        let source_url = arg_or_env(&self.source_url, "GISTPUB_GIT_SOURCE_URL")
            .context("no source url given and GISTPUB_GIT_SOURCE_URL is unset")?;
        let target_url = arg_or_env(&self.target_url, "GISTPUB_GIT_TARGET_URL")
            .context("no target url given and GISTPUB_GIT_TARGET_URL is unset")?;

        let src = as_remote(
            &source_url,
            arg_or_env(&self.source_username, "GISTPUB_GIT_SOURCE_USERNAME").as_deref(),
            arg_or_env(&self.source_password, "GISTPUB_GIT_SOURCE_PASSWORD").as_deref(),
        )?;
        let trg = as_remote(
            &target_url,
            arg_or_env(&self.target_username, "GISTPUB_GIT_TARGET_USERNAME").as_deref(),
            arg_or_env(&self.target_password, "GISTPUB_GIT_TARGET_PASSWORD").as_deref(),
        )?;

        let runner = super::git_runner()?;
        mirror(&runner, &src, &trg, &self.branch_regex, self.dry_run)?;

        TrailWriter::new(runner.git_root(), "git-mirror").info(
            Path::new("*"),
            &format!("branches matching {} mirrored", self.branch_regex),
        )?;
        output::success(&format!(
            "mirrored branches matching {} from {} to {}",
            self.branch_regex, src.name, trg.name,
        ));
        Ok(())
    }
}
