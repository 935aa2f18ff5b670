// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Locating and reading ucode source files.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use ucode_core::source_analysis::SourceMode;

/// Extension of ucode scripts, collected from directories.
pub const SCRIPT_EXTENSION: &str = "uc";
/// Extension of ucode template files, checked when named explicitly.
pub const TEMPLATE_EXTENSION: &str = "ut";

/// Lexer mode for a file, by extension.
#[must_use]
pub fn source_mode(path: &Utf8Path) -> SourceMode {
    if path.extension() == Some(TEMPLATE_EXTENSION) {
        SourceMode::Template
    } else {
        SourceMode::Raw
    }
}

/// Expand the given paths into source files.
///
/// Files are taken as given, whatever their extension. Directories are
/// searched recursively for `.uc` files.
pub fn find_source_files(paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let before = files.len();
            collect_uc_files_recursive(path, &mut files)?;
            files[before..].sort();
        } else {
            miette::bail!("Path '{}' does not exist", path);
        }
    }
    Ok(files)
}

/// Recursively collect all `.uc` files from a directory tree.
///
/// Symlinks are skipped to avoid potential infinite recursion from circular links.
fn collect_uc_files_recursive(dir: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let entry_path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path"))?;

        if file_type.is_dir() {
            collect_uc_files_recursive(&entry_path, files)?;
        } else if file_type.is_file() && entry_path.extension() == Some(SCRIPT_EXTENSION) {
            files.push(entry_path);
        }
    }
    Ok(())
}

/// Read a source file as UTF-8.
pub fn read_source(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{path}'"))
}
