//! Promisify core library - rewrites callback-style TypeScript declarations
//! into promise-returning ones and generates the matching runtime binder

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Transformation is strictly per-function; the manifest is the only
//   state shared across functions and files
// - No global mutable state
// - No randomness, clocks, threads, or async
// - Deterministic traversal order must be explicit (sorted files, declaration order)
// - Text the engine does not transform is emitted byte-for-byte
// - Identical input yields byte-for-byte identical output

pub mod binder;
pub mod classify;
pub mod config;
pub mod docs;
pub mod emit;
pub mod error;
pub mod manifest;
pub mod model;
pub mod output;
pub mod parser;
pub mod report;
pub mod rewrite;
pub mod transform;
pub mod types;

pub use config::ResolvedConfig;
pub use error::{Diagnostic, TransformError};
pub use manifest::Manifest;
pub use report::{render_json, render_text, RunReport};
pub use transform::{transform_source, transform_sources, RunOutput, SourceInput};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Extension of the files the engine reads
const DECLARATION_SUFFIX: &str = ".d.ts";

/// Transform the declaration file or directory at `path` with default configuration
pub fn transform_path(path: &Path) -> Result<RunOutput> {
    let config = ResolvedConfig::defaults()?;
    transform_path_with_config(path, &config)
}

/// Transform the declaration file or directory at `path`
///
/// Directories are walked recursively; every `.d.ts` file that passes the
/// include/exclude filters is transformed and all of them share one manifest.
pub fn transform_path_with_config(path: &Path, config: &ResolvedConfig) -> Result<RunOutput> {
    let inputs = collect_inputs(path, config)?;
    if inputs.is_empty() {
        anyhow::bail!("no declaration files found at {}", path.display());
    }
    transform_sources(&inputs, config)
}

/// Read every selected declaration file under `path`
pub fn collect_inputs(path: &Path, config: &ResolvedConfig) -> Result<Vec<SourceInput>> {
    let root = if path.is_file() {
        path.parent().unwrap_or(Path::new(""))
    } else {
        path
    };

    let mut inputs = Vec::new();
    for file_path in collect_declaration_files(path)? {
        let relative = file_path
            .strip_prefix(root)
            .unwrap_or(&file_path)
            .to_path_buf();
        if !config.should_include(&relative) {
            tracing::debug!("excluded by config: {}", relative.display());
            continue;
        }
        let source = std::fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))?;
        inputs.push(SourceInput {
            relative_path: relative,
            source,
        });
    }
    Ok(inputs)
}

/// Check if a file is a declaration file
fn is_declaration_file(filename: &str) -> bool {
    filename.ends_with(DECLARATION_SUFFIX)
}

/// Collect all declaration files from a path (file or directory), sorted
fn collect_declaration_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        collect_declaration_files_recursive(path, &mut files)?;
    } else {
        anyhow::bail!("path does not exist: {}", path.display());
    }

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}

/// Process one directory entry, pushing declaration files or recursing into dirs
fn process_dir_entry(
    path: PathBuf,
    metadata: std::fs::Metadata,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    if metadata.is_symlink() {
        return Ok(());
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if metadata.is_dir() {
        if is_skipped_dir(name) {
            return Ok(());
        }
        collect_declaration_files_recursive(&path, files)?;
    } else if metadata.is_file() && is_declaration_file(name) {
        files.push(path);
    }

    Ok(())
}

/// Recursively collect declaration files from a directory
fn collect_declaration_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        process_dir_entry(path, metadata, files)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_skips_hidden_and_node_modules() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::create_dir_all(dir.path().join("api")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.d.ts"), "").unwrap();
        fs::write(dir.path().join(".cache/x.d.ts"), "").unwrap();
        fs::write(dir.path().join("api/b.d.ts"), "").unwrap();
        fs::write(dir.path().join("a.d.ts"), "").unwrap();
        fs::write(dir.path().join("main.ts"), "").unwrap();

        let files = collect_declaration_files(dir.path()).unwrap();
        let names: Vec<PathBuf> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.d.ts"), PathBuf::from("api/b.d.ts")]);
    }

    #[test]
    fn test_single_file_is_relative_to_its_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("index.d.ts");
        fs::write(&file, "declare const x: number;\n").unwrap();
        let inputs = collect_inputs(&file, &ResolvedConfig::defaults().unwrap()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].relative_path, PathBuf::from("index.d.ts"));
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_declaration_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(transform_path(dir.path()).is_err());
    }
}
