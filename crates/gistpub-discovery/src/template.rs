// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Placeholder rendering for attribute values and conversion defaults.
//!
//! Attribute values are one-line templates over `{{ key }}` placeholders,
//! e.g. `{"confluence":{"page":"{{ stem }}","host":"wiki.example.com"}}`.
//! Unknown keys are a hard error rather than rendering as empty text, so a
//! typo in an annotation fails the record instead of silently producing a
//! broken tag block.

use crate::error::{DiscoverError, DiscoverResult};
use regex::Regex;
use std::collections::BTreeMap;

/// Renders `{{ key }}` placeholders in `template` from `params`.
pub fn render_template(
    template: &str,
    params: &BTreeMap<String, String>,
) -> DiscoverResult<String> {
    let placeholder = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .map_err(|err| DiscoverError::Template(err.to_string()))?;

    let mut rendered = String::with_capacity(template.len());
    let mut last_end = 0;
    for captures in placeholder.captures_iter(template) {
        let whole = captures.get(0).ok_or_else(|| {
            DiscoverError::Template("placeholder match without capture".into())
        })?;
        let key = &captures[1];
        let value = params.get(key).ok_or_else(|| {
            DiscoverError::Template(format!("unknown template parameter \"{key}\""))
        })?;
        rendered.push_str(&template[last_end..whole.start()]);
        rendered.push_str(value);
        last_end = whole.end();
    }
    rendered.push_str(&template[last_end..]);
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("stem".to_string(), "README".to_string()),
            ("parent".to_string(), "howto".to_string()),
        ])
    }

    #[test]
    fn test_renders_placeholders_with_and_without_spacing() {
        let rendered =
            render_template(r#"{"page":"{{stem}}","space":"{{ parent }}"}"#, &params())
                .unwrap();
        assert_eq!(rendered, r#"{"page":"README","space":"howto"}"#);
    }

    #[test]
    fn test_plain_text_passes_through() {
        let rendered = render_template(r#"{"page":"117"}"#, &params()).unwrap();
        assert_eq!(rendered, r#"{"page":"117"}"#);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let result = render_template("{{ nonsense }}", &params());
        assert!(matches!(result, Err(DiscoverError::Template(_))));
    }
}
