// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Declare the gistpub attribute in the repository-local attributes file.
//!
//! Discovery refuses to run until the `[attr]gistpub` macro is declared
//! somewhere git reads attributes from; this is the one explicit, opt-in
//! side effect that sets a repository up.

use crate::output;
use anyhow::Result;
use clap::Parser;
use gistpub_git::{AttributeStore, ATTRIBUTE_NAME};

/// Declare the gistpub attribute in this repository
#[derive(Parser, Debug)]
pub struct InitCmd {}

impl InitCmd {
    pub async fn execute(&self) -> Result<()> {
        let runner = super::git_runner()?;
        let store = AttributeStore::new(&runner);
        store.init()?;
        output::success(&format!(
            "declared [attr]{ATTRIBUTE_NAME} in {}",
            runner.git_root().join(".git/info/attributes").display(),
        ));
        Ok(())
    }
}
