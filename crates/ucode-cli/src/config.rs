// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Checker configuration.
//!
//! Settings come from a `.ucode-lsp.toml` file in the checked directory or
//! one of its ancestors (or an explicit `--config` path), with command-line
//! flags layered on top:
//!
//! ```toml
//! [analysis]
//! type_checking = true
//! unused_variables = true
//! shadowing = true
//! undefined_identifiers = true
//! globals = ["uloop", "ubus"]
//! ```

use camino::Utf8Path;
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs;
use ucode_core::semantic_analysis::AnalysisOptions;

pub const CONFIG_FILE_NAME: &str = ".ucode-lsp.toml";

/// The top-level structure parsed from `.ucode-lsp.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisSection,
}

/// The `[analysis]` table. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    pub type_checking: bool,
    pub unused_variables: bool,
    pub shadowing: bool,
    pub undefined_identifiers: bool,
    /// Extra global names, for scripts run with preloaded modules.
    pub globals: Vec<String>,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            type_checking: true,
            unused_variables: true,
            shadowing: true,
            undefined_identifiers: true,
            globals: Vec::new(),
        }
    }
}

/// Command-line switches that override the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub no_type_checking: bool,
    pub no_unused: bool,
    pub no_shadowing: bool,
    pub globals: Vec<String>,
}

impl Config {
    /// Merges the file settings with command-line overrides.
    #[must_use]
    pub fn analysis_options(&self, overrides: &Overrides) -> AnalysisOptions {
        let section = &self.analysis;
        AnalysisOptions {
            type_checking: section.type_checking && !overrides.no_type_checking,
            unused_variables: section.unused_variables && !overrides.no_unused,
            shadowing: section.shadowing && !overrides.no_shadowing,
            undefined_identifiers: section.undefined_identifiers,
            extra_globals: section
                .globals
                .iter()
                .chain(&overrides.globals)
                .map(|name| name.as_str().into())
                .collect(),
        }
    }
}

/// Parse a config file.
pub fn parse_config(path: &Utf8Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config '{path}'"))?;

    toml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse config '{path}'"))
}

/// Look for `.ucode-lsp.toml` in `start` and its ancestors.
///
/// Returns `None` if no config file exists. Returns an error if the nearest
/// one is malformed.
pub fn find_config(start: &Utf8Path) -> Result<Option<Config>> {
    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate
            .try_exists()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to stat config '{candidate}'"))?
        {
            tracing::debug!(path = %candidate, "using config file");
            return parse_config(&candidate).map(Some);
        }
    }
    Ok(None)
}
