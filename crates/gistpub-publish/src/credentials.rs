// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Destination connection settings.
//!
//! Each adapter needs a base URL plus either a username/password pair or
//! a bare token in the password slot. Settings come from explicit CLI
//! arguments falling back to `GISTPUB_<KIND>_*` environment variables; a
//! missing URL or secret fails fast, before any record is touched.

use crate::error::{PublishError, PublishResult};

/// Connection settings for one destination adapter
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub username: Option<String>,
    pub password: String,
}

impl Credentials {
    /// Resolves settings for the given destination kind (e.g.
    /// `CONFLUENCE`), explicit values taking precedence over the
    /// environment.
    pub fn resolve(
        kind: &str,
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> PublishResult<Self> {
        let url = url.or_else(|| std::env::var(format!("GISTPUB_{kind}_URL")).ok()).ok_or_else(
            || {
                PublishError::CredentialsMissing(format!(
                    "no {} url given and GISTPUB_{kind}_URL is unset",
                    kind.to_lowercase()
                ))
            },
        )?;
        let username =
            username.or_else(|| std::env::var(format!("GISTPUB_{kind}_USERNAME")).ok());
        let password = password
            .or_else(|| std::env::var(format!("GISTPUB_{kind}_PASSWORD")).ok())
            .ok_or_else(|| {
                PublishError::CredentialsMissing(format!(
                    "no {} password or token given and GISTPUB_{kind}_PASSWORD is unset",
                    kind.to_lowercase()
                ))
            })?;
        Ok(Self { url, username, password })
    }
}
