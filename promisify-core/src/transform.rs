//! Transformation pipeline
//!
//! Per file: parse -> load tree -> classify and rewrite each function ->
//! register manifest entries -> emit. Per run: one manifest across all files,
//! optional verification of the emitted text, then artifact assembly.
//!
//! Global invariants enforced:
//! - Each declared function is visited exactly once, in declaration order;
//!   aliases appended during the walk are never revisited
//! - A fatal `TransformError` means no artifacts are produced
//! - Diagnostics never stop unrelated functions from being transformed

use crate::binder::{render_binder, render_binder_declaration};
use crate::classify::{classify, Classification};
use crate::config::{BinderOptions, ResolvedConfig, TransformConfig};
use crate::emit::emit;
use crate::error::Diagnostic;
use crate::manifest::{Manifest, ManifestBuilder, ManifestEntry};
use crate::model::{load, NamespaceTree};
use crate::output::Artifact;
use crate::parser::parse_declarations;
use crate::report::{DiagnosticRecord, RunReport, TransformRecord};
use crate::rewrite::{rewrite, TransformKind};
use crate::types::TypeIndex;
use anyhow::{Context, Result};
use std::path::PathBuf;
use swc_common::{sync::Lrc, SourceMap};
use tracing::{debug, info, warn};

/// A declaration file handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Path relative to the input root; reused for the output file
    pub relative_path: PathBuf,
    pub source: String,
}

/// Result of transforming one file
#[derive(Debug, Clone)]
pub struct FileTransform {
    pub relative_path: PathBuf,
    /// Emitted declaration text
    pub output: String,
    /// Number of functions declared in the file's API namespaces
    pub function_count: usize,
    /// Manifest entries contributed by this file, in declaration order
    pub entries: Vec<ManifestEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileTransform {
    fn display_name(&self) -> String {
        self.relative_path.to_string_lossy().replace('\\', "/")
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub files: Vec<FileTransform>,
    pub manifest: Manifest,
    /// Rewritten declarations plus the binder module and its declaration
    pub artifacts: Vec<Artifact>,
    pub report: RunReport,
}

/// Transform one declaration file, registering its entries in `manifest`
///
/// Returns an error (a `TransformError` inside `anyhow`) on fatal parse
/// failures and on name or alias collisions. Declarations already recorded in
/// `manifest` count for alias collisions as well as this file's own.
pub fn transform_source(
    input: &SourceInput,
    source_map: &Lrc<SourceMap>,
    config: &TransformConfig,
    manifest: &mut ManifestBuilder,
) -> Result<FileTransform> {
    let file_name = input.relative_path.to_string_lossy().replace('\\', "/");
    let parsed = parse_declarations(&input.source, source_map, &file_name)?;

    let mut diagnostics: Vec<Diagnostic> = parsed
        .recovered
        .iter()
        .map(|message| Diagnostic::ParseRecovered {
            file: file_name.clone(),
            message: message.clone(),
        })
        .collect();

    let mut tree = load(&parsed, &config.root_namespace);
    manifest.declare_tree(&tree);
    let types = TypeIndex::build(&parsed);
    let function_count = tree.function_count();
    let mut entries = Vec::new();

    for ns_idx in 0..tree.namespaces.len() {
        // Aliases are appended to `functions`; only walk what was declared
        let declared = tree.namespaces[ns_idx].functions.len();
        for fn_idx in 0..declared {
            let signature = &tree.namespaces[ns_idx].functions[fn_idx];
            let callback = match classify(signature, config, &types) {
                Ok(Classification::Callback(callback)) => callback,
                Ok(Classification::None) => continue,
                Err(diagnostic) => {
                    warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                    continue;
                }
            };

            let outcome = rewrite(signature, &callback, config);
            debug!(
                "{}: {} {} callback -> {}",
                outcome.manifest_entry.original_name,
                outcome.kind.as_str(),
                callback.kind.as_str(),
                outcome.manifest_entry.exposed_name
            );

            manifest.register(outcome.manifest_entry.clone())?;

            for diagnostic in &outcome.diagnostics {
                warn!("{}", diagnostic);
            }
            diagnostics.extend(outcome.diagnostics);
            entries.push(outcome.manifest_entry);

            let namespace = &mut tree.namespaces[ns_idx];
            match outcome.kind {
                TransformKind::InPlace => namespace.functions[fn_idx] = outcome.new_signature,
                TransformKind::Aliased => namespace.functions.push(outcome.new_signature),
            }
        }

        if config.strip_const_enums {
            for enum_decl in &mut tree.namespaces[ns_idx].enums {
                if enum_decl.const_keyword.is_some() {
                    debug!("{}: stripping const from enum {}", file_name, enum_decl.name);
                    enum_decl.strip_const = true;
                }
            }
        }
    }

    let output = emit(parsed.source(), &tree);
    info!(
        "{}: {} of {} function(s) transformed",
        file_name,
        entries.len(),
        function_count
    );

    Ok(FileTransform {
        relative_path: input.relative_path.clone(),
        output,
        function_count,
        entries,
        diagnostics,
    })
}

/// Re-parse every emitted file and check it against the manifest
pub fn verify_outputs(
    files: &[FileTransform],
    manifest: &Manifest,
    config: &TransformConfig,
) -> Result<()> {
    let source_map: Lrc<SourceMap> = Default::default();
    let mut trees: Vec<NamespaceTree> = Vec::with_capacity(files.len());
    for file in files {
        let name = format!("{} (emitted)", file.display_name());
        let parsed = parse_declarations(&file.output, &source_map, &name)
            .with_context(|| format!("emitted declarations for {} do not parse", file.display_name()))?;
        trees.push(load(&parsed, &config.root_namespace));
    }
    manifest.verify(&trees, config)?;
    Ok(())
}

/// Transform a set of files with one shared manifest and assemble the artifacts
pub fn transform_sources(inputs: &[SourceInput], config: &ResolvedConfig) -> Result<RunOutput> {
    let source_map: Lrc<SourceMap> = Default::default();
    let mut builder = ManifestBuilder::new();

    // Namespaces merge across files, so every declaration must be known
    // before the first alias is registered
    for input in inputs {
        let file_name = input.relative_path.to_string_lossy().replace('\\', "/");
        let parsed = parse_declarations(&input.source, &source_map, &file_name)
            .with_context(|| format!("failed to transform {}", input.relative_path.display()))?;
        builder.declare_tree(&load(&parsed, &config.transform.root_namespace));
    }

    let mut files = Vec::with_capacity(inputs.len());

    for input in inputs {
        let file = transform_source(input, &source_map, &config.transform, &mut builder)
            .with_context(|| format!("failed to transform {}", input.relative_path.display()))?;
        files.push(file);
    }

    let manifest = builder.finish();
    if config.verify_output {
        verify_outputs(&files, &manifest, &config.transform)?;
        debug!("verified {} manifest entries", manifest.len());
    }

    let artifacts = assemble_artifacts(&files, &manifest, &config.binder, &config.transform)?;
    let report = build_report(&files);
    info!(
        "{} file(s), {} function(s) transformed",
        files.len(),
        manifest.len()
    );

    Ok(RunOutput {
        files,
        manifest,
        artifacts,
        report,
    })
}

fn assemble_artifacts(
    files: &[FileTransform],
    manifest: &Manifest,
    binder: &BinderOptions,
    transform: &TransformConfig,
) -> Result<Vec<Artifact>> {
    let mut artifacts: Vec<Artifact> = files
        .iter()
        .map(|f| Artifact {
            relative_path: f.relative_path.clone(),
            contents: f.output.clone(),
        })
        .collect();
    let binder_source = render_binder(manifest, binder, &transform.alias_suffix)
        .context("failed to render binder tables")?;
    artifacts.push(Artifact {
        relative_path: PathBuf::from(&binder.file_name),
        contents: binder_source,
    });
    artifacts.push(Artifact {
        relative_path: PathBuf::from(binder.declaration_file_name()),
        contents: render_binder_declaration(),
    });
    Ok(artifacts)
}

fn build_report(files: &[FileTransform]) -> RunReport {
    let mut report = RunReport::default();
    for file in files {
        let name = file.display_name();
        report.function_count += file.function_count;
        report
            .transforms
            .extend(file.entries.iter().map(|e| TransformRecord::new(&name, e)));
        report
            .diagnostics
            .extend(file.diagnostics.iter().map(|d| DiagnosticRecord::new(&name, d)));
        report.files.push(name);
    }
    report
}
