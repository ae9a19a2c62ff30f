//! Configuration file support for promisify
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.promisifyrc.json` in project root
//! 3. `promisify.config.json` in project root
//! 4. `"promisify"` key in `package.json`
//!
//! All fields are optional. Missing fields fall back to the defaults below.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default exclude patterns applied when no excludes are configured
const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**", "**/dist/**", "**/build/**"];

const DEFAULT_CALLBACK_PARAM_NAMES: &[&str] = &["callback", "cb"];
const DEFAULT_WRAPPER_TYPE: &str = "CallbackFunction";
const DEFAULT_DEFERRED_TYPE: &str = "Promise";
const DEFAULT_ALIAS_SUFFIX: &str = "Async";
const DEFAULT_ROOT_NAMESPACE: &str = "overwolf";
const DEFAULT_GLOBAL_BINDING: &str = "overwolf";
const DEFAULT_RETURNS_TEMPLATE: &str =
    "A promise resolved with the result the callback would have received: {description}";
const DEFAULT_MISSING_DOC_PLACEHOLDER: &str = "the operation result";
const DEFAULT_SUCCESS_FIELD: &str = "success";
const DEFAULT_ERROR_FIELD: &str = "error";
const DEFAULT_FALLBACK_ERROR: &str = "Unknown error";
const DEFAULT_BINDER_FILE: &str = "promisify.js";

/// Placeholder substituted with the callback's doc text
pub const DESCRIPTION_PLACEHOLDER: &str = "{description}";

/// promisify configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromisifyConfig {
    /// Glob patterns for declaration files to include (default: every `.d.ts`)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for declaration files to exclude (default: node_modules, dist, build)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Parameter names that may denote a callback (default: callback, cb)
    #[serde(default)]
    pub callback_param_names: Option<Vec<String>>,

    /// Generic wrapper identifier recognized as a typed callback (default: CallbackFunction)
    #[serde(default)]
    pub wrapper_type: Option<String>,

    /// Deferred-result type used for rewritten return types (default: Promise)
    #[serde(default)]
    pub deferred_type: Option<String>,

    /// Full names (`namespace.function`) whose runtime binding cannot be overwritten
    #[serde(default)]
    pub read_only_functions: Vec<String>,

    /// Suffix appended to aliased function names (default: Async)
    #[serde(default)]
    pub alias_suffix: Option<String>,

    /// Namespace prefix stripped from declared namespace names (default: overwolf)
    #[serde(default)]
    pub root_namespace: Option<String>,

    /// Remove the `const` qualifier from enum declarations (default: true)
    #[serde(default)]
    pub strip_const_enums: Option<bool>,

    /// Template for the generated `@returns` tag; must contain `{description}`
    #[serde(default)]
    pub returns_doc_template: Option<String>,

    /// Description used when the callback has no doc tag
    #[serde(default)]
    pub missing_doc_placeholder: Option<String>,

    /// Runtime binder generation settings
    #[serde(default)]
    pub binder: Option<BinderConfig>,

    /// Re-parse emitted declarations and check them against the manifest (default: true)
    #[serde(default)]
    pub verify_output: Option<bool>,
}

/// Runtime binder generation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinderConfig {
    /// Global binding the binder walks from (default: overwolf)
    pub global_binding: Option<String>,
    /// Payload field holding the success flag (default: success)
    pub success_field: Option<String>,
    /// Payload field holding the error text (default: error)
    pub error_field: Option<String>,
    /// Rejection message when the payload has no error text (default: Unknown error)
    pub fallback_error_message: Option<String>,
    /// File name of the generated binder module (default: promisify.js)
    pub file_name: Option<String>,
}

/// Settings consumed by the classifier, rewriter and emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub callback_param_names: Vec<String>,
    pub wrapper_type: String,
    pub deferred_type: String,
    pub read_only_functions: BTreeSet<String>,
    pub alias_suffix: String,
    /// Empty means namespace names are kept as declared
    pub root_namespace: String,
    pub strip_const_enums: bool,
    pub returns_doc_template: String,
    pub missing_doc_placeholder: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            callback_param_names: DEFAULT_CALLBACK_PARAM_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            wrapper_type: DEFAULT_WRAPPER_TYPE.to_string(),
            deferred_type: DEFAULT_DEFERRED_TYPE.to_string(),
            read_only_functions: BTreeSet::new(),
            alias_suffix: DEFAULT_ALIAS_SUFFIX.to_string(),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            strip_const_enums: true,
            returns_doc_template: DEFAULT_RETURNS_TEMPLATE.to_string(),
            missing_doc_placeholder: DEFAULT_MISSING_DOC_PLACEHOLDER.to_string(),
        }
    }
}

impl TransformConfig {
    /// True if `name` is one of the accepted callback parameter names
    pub fn is_callback_param(&self, name: &str) -> bool {
        self.callback_param_names.iter().any(|n| n == name)
    }

    /// True if the function's binding must not be replaced in place
    pub fn is_read_only(&self, full_name: &str) -> bool {
        self.read_only_functions.contains(full_name)
    }

    /// Wrap a result type in the deferred type, e.g. `Promise<T>`
    pub fn deferred_of(&self, result_type: &str) -> String {
        format!("{}<{}>", self.deferred_type, result_type)
    }
}

/// Settings for the generated runtime binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderOptions {
    pub global_binding: String,
    pub success_field: String,
    pub error_field: String,
    pub fallback_error_message: String,
    pub file_name: String,
}

impl Default for BinderOptions {
    fn default() -> Self {
        BinderOptions {
            global_binding: DEFAULT_GLOBAL_BINDING.to_string(),
            success_field: DEFAULT_SUCCESS_FIELD.to_string(),
            error_field: DEFAULT_ERROR_FIELD.to_string(),
            fallback_error_message: DEFAULT_FALLBACK_ERROR.to_string(),
            file_name: DEFAULT_BINDER_FILE.to_string(),
        }
    }
}

impl BinderOptions {
    /// File name of the companion declaration, e.g. `promisify.d.ts`
    pub fn declaration_file_name(&self) -> String {
        let stem = self.file_name.strip_suffix(".js").unwrap_or(&self.file_name);
        format!("{}.d.ts", stem)
    }
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Exclude patterns in effect, as written
    pub exclude_patterns: Vec<String>,
    pub transform: TransformConfig,
    pub binder: BinderOptions,
    pub verify_output: bool,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap())
}

fn dotted_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap()
    })
}

fn check_identifier(field: &str, value: &str) -> Result<()> {
    if !identifier_re().is_match(value) {
        anyhow::bail!("{} must be a valid identifier (got {:?})", field, value);
    }
    Ok(())
}

fn check_dotted(field: &str, value: &str) -> Result<()> {
    if !dotted_path_re().is_match(value) {
        anyhow::bail!("{} must be a dotted identifier path (got {:?})", field, value);
    }
    Ok(())
}

impl PromisifyConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref names) = self.callback_param_names {
            if names.is_empty() {
                anyhow::bail!("callback_param_names must not be empty");
            }
            for name in names {
                check_identifier("callback_param_names entry", name)?;
            }
        }

        if let Some(ref wrapper) = self.wrapper_type {
            check_identifier("wrapper_type", wrapper)?;
        }
        if let Some(ref deferred) = self.deferred_type {
            check_dotted("deferred_type", deferred)?;
        }

        if let Some(ref suffix) = self.alias_suffix {
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
                anyhow::bail!(
                    "alias_suffix must be a non-empty run of identifier characters (got {:?})",
                    suffix
                );
            }
        }

        if let Some(ref root) = self.root_namespace {
            if !root.is_empty() {
                check_dotted("root_namespace", root)?;
            }
        }

        for name in &self.read_only_functions {
            check_dotted("read_only_functions entry", name)?;
        }

        if let Some(ref template) = self.returns_doc_template {
            if !template.contains(DESCRIPTION_PLACEHOLDER) {
                anyhow::bail!(
                    "returns_doc_template must contain {} (got {:?})",
                    DESCRIPTION_PLACEHOLDER,
                    template
                );
            }
        }

        if let Some(ref binder) = self.binder {
            if let Some(ref global) = binder.global_binding {
                check_dotted("binder.global_binding", global)?;
            }
            for (field, value) in [
                ("binder.success_field", &binder.success_field),
                ("binder.error_field", &binder.error_field),
            ] {
                if let Some(v) = value {
                    if v.is_empty() {
                        anyhow::bail!("{} must not be empty", field);
                    }
                }
            }
            if let Some(ref file_name) = binder.file_name {
                if !file_name.ends_with(".js") || file_name.contains('/') || file_name.contains('\\') {
                    anyhow::bail!(
                        "binder.file_name must be a plain `.js` file name (got {:?})",
                        file_name
                    );
                }
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.include {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        let exclude_patterns: Vec<String> = if self.exclude.is_empty() {
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
        } else {
            self.exclude.clone()
        };
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &exclude_patterns {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        let defaults = TransformConfig::default();
        let transform = TransformConfig {
            callback_param_names: self
                .callback_param_names
                .clone()
                .unwrap_or(defaults.callback_param_names),
            wrapper_type: self.wrapper_type.clone().unwrap_or(defaults.wrapper_type),
            deferred_type: self.deferred_type.clone().unwrap_or(defaults.deferred_type),
            read_only_functions: self.read_only_functions.iter().cloned().collect(),
            alias_suffix: self.alias_suffix.clone().unwrap_or(defaults.alias_suffix),
            root_namespace: self.root_namespace.clone().unwrap_or(defaults.root_namespace),
            strip_const_enums: self.strip_const_enums.unwrap_or(defaults.strip_const_enums),
            returns_doc_template: self
                .returns_doc_template
                .clone()
                .unwrap_or(defaults.returns_doc_template),
            missing_doc_placeholder: self
                .missing_doc_placeholder
                .clone()
                .unwrap_or(defaults.missing_doc_placeholder),
        };

        let binder_defaults = BinderOptions::default();
        let binder = match &self.binder {
            Some(b) => BinderOptions {
                global_binding: b
                    .global_binding
                    .clone()
                    .unwrap_or(binder_defaults.global_binding),
                success_field: b.success_field.clone().unwrap_or(binder_defaults.success_field),
                error_field: b.error_field.clone().unwrap_or(binder_defaults.error_field),
                fallback_error_message: b
                    .fallback_error_message
                    .clone()
                    .unwrap_or(binder_defaults.fallback_error_message),
                file_name: b.file_name.clone().unwrap_or(binder_defaults.file_name),
            },
            None => binder_defaults,
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            exclude_patterns,
            transform,
            binder,
            verify_output: self.verify_output.unwrap_or(true),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a file path should be included based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// True when no exclude patterns were configured
    pub fn uses_default_excludes(&self) -> bool {
        self.exclude_patterns
            .iter()
            .map(String::as_str)
            .eq(DEFAULT_EXCLUDES.iter().copied())
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        PromisifyConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.promisifyrc.json`
/// 2. `promisify.config.json`
/// 3. `"promisify"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(PromisifyConfig, PathBuf)>> {
    let rc_path = project_root.join(".promisifyrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    let config_path = project_root.join("promisify.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<PromisifyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: PromisifyConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load config from the "promisify" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<PromisifyConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("promisify") {
        Some(value) => {
            let config: PromisifyConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid promisify config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid promisify config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (PromisifyConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = PromisifyConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert!(resolved.include.is_none());
        assert_eq!(resolved.transform.wrapper_type, "CallbackFunction");
        assert_eq!(resolved.transform.deferred_type, "Promise");
        assert_eq!(resolved.transform.alias_suffix, "Async");
        assert_eq!(resolved.transform.callback_param_names, vec!["callback", "cb"]);
        assert!(resolved.transform.strip_const_enums);
        assert_eq!(resolved.binder.global_binding, "overwolf");
        assert_eq!(resolved.binder.file_name, "promisify.js");
        assert!(resolved.verify_output);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "include": ["types/**/*.d.ts"],
            "callback_param_names": ["callback", "done"],
            "wrapper_type": "Callback",
            "deferred_type": "Promise",
            "read_only_functions": ["io.readTextFile"],
            "alias_suffix": "Promise",
            "root_namespace": "ow",
            "strip_const_enums": false,
            "returns_doc_template": "Resolves with {description}",
            "binder": {
                "global_binding": "ow",
                "fallback_error_message": "failed",
                "file_name": "bind.js"
            },
            "verify_output": false
        }"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.include.is_some());
        assert_eq!(resolved.transform.wrapper_type, "Callback");
        assert!(resolved.transform.is_read_only("io.readTextFile"));
        assert!(resolved.transform.is_callback_param("done"));
        assert!(!resolved.transform.strip_const_enums);
        assert_eq!(resolved.binder.global_binding, "ow");
        assert_eq!(resolved.binder.success_field, "success");
        assert_eq!(resolved.binder.fallback_error_message, "failed");
        assert_eq!(resolved.binder.declaration_file_name(), "bind.d.ts");
        assert!(!resolved.verify_output);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<PromisifyConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_template_without_placeholder() {
        let json = r#"{"returns_doc_template": "A promise"}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_root_namespace_read_only_name_allowed() {
        let json = r#"{"read_only_functions": ["getVersion"]}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.transform.is_read_only("getVersion"));
    }

    #[test]
    fn test_reject_malformed_read_only_name() {
        let json = r#"{"read_only_functions": ["io..readTextFile"]}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_empty_callback_names() {
        let json = r#"{"callback_param_names": []}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_suffix() {
        let json = r#"{"alias_suffix": "-async"}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_binder_file_with_path() {
        let json = r#"{"binder": {"file_name": "out/promisify.js"}}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_invalid_glob_pattern() {
        let json = r#"{"include": ["[invalid"]}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_root_namespace_allowed() {
        let json = r#"{"root_namespace": ""}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.transform.root_namespace, "");
    }

    #[test]
    fn test_should_include_default_excludes() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(!resolved.should_include(Path::new("node_modules/pkg/index.d.ts")));
        assert!(!resolved.should_include(Path::new("dist/overwolf.d.ts")));
        assert!(resolved.should_include(Path::new("types/overwolf.d.ts")));
    }

    #[test]
    fn test_exclude_patterns_reported_as_configured() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(resolved.uses_default_excludes());

        let json = r#"{"exclude": ["legacy/**"]}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert!(!resolved.uses_default_excludes());
        assert_eq!(resolved.exclude_patterns, vec!["legacy/**"]);

        let json = r#"{"alias_suffix": "Promise"}"#;
        let config: PromisifyConfig = serde_json::from_str(json).unwrap();
        assert!(config.resolve().unwrap().uses_default_excludes());
    }

    #[test]
    fn test_deferred_of() {
        let transform = TransformConfig::default();
        assert_eq!(transform.deferred_of("string"), "Promise<string>");
    }

    #[test]
    fn test_discover_rc_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".promisifyrc.json");
        fs::write(&config_path, r#"{"alias_suffix": "P"}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.alias_suffix.as_deref(), Some("P"));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
            "name": "my-app",
            "promisify": { "read_only_functions": ["io.readTextFile"] }
        }"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.read_only_functions, vec!["io.readTextFile"]);
    }

    #[test]
    fn test_discover_package_json_without_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "my-app"}"#).unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".promisifyrc.json"), r#"{"alias_suffix": "A"}"#).unwrap();
        fs::write(
            dir.path().join("promisify.config.json"),
            r#"{"alias_suffix": "B"}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.alias_suffix.as_deref(), Some("A"));
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"deferred_type": "Deferred"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.transform.deferred_type, "Deferred");
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.transform.alias_suffix, "Async");
    }
}
