//! Manifest: the facts the runtime binder needs
//!
//! One entry per exposed function name. The binder trusts the manifest
//! unconditionally, so the builder refuses ambiguous registrations instead of
//! letting the last write win.
//!
//! Global invariants enforced:
//! - No exposed name is registered twice with different binding facts
//! - No alias shadows a function declared anywhere in the run
//! - Table order is registration order (declaration order of the input)

use crate::classify::CallbackKind;
use crate::config::TransformConfig;
use crate::error::TransformError;
use crate::model::{NamespaceTree, Origin};
use crate::rewrite::TransformKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Binder facts for one transformed function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Name the deferred form is exposed under (alias name when aliased)
    pub exposed_name: String,
    /// Name of the declared callback-style function
    pub original_name: String,
    pub kind: TransformKind,
    pub callback: CallbackKind,
    pub result_type: String,
    /// Splice index for callbacks that are not the last parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_override: Option<usize>,
}

impl ManifestEntry {
    pub fn is_opaque(&self) -> bool {
        self.callback == CallbackKind::Opaque
    }

    /// True if both entries would make the binder do exactly the same thing
    fn same_binding(&self, other: &ManifestEntry) -> bool {
        self.original_name == other.original_name
            && self.kind == other.kind
            && self.position_override == other.position_override
            && self.is_opaque() == other.is_opaque()
    }

    fn describe(&self) -> String {
        let mut out = format!(
            "{} {} callback of `{}`",
            self.kind.as_str(),
            self.callback.as_str(),
            self.original_name
        );
        if let Some(idx) = self.position_override {
            out.push_str(&format!(" at index {}", idx));
        }
        out
    }
}

/// Accumulates entries and guards against conflicting registrations
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
    /// Full names of every function declared in the run's sources
    declared: HashSet<String>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the functions a source tree declares (aliases excluded)
    pub fn declare_tree(&mut self, tree: &NamespaceTree) {
        tree.for_each_function(|_, f| {
            if matches!(f.origin, Origin::Declared(_)) {
                self.declared.insert(f.full_name());
            }
        });
    }

    /// Register an entry under its exposed name
    ///
    /// An aliased entry whose name is already declared is an
    /// `AliasCollision`. Re-registering identical binding facts (overloaded
    /// declarations) is a no-op. Anything else under an existing name is a
    /// `NameCollision`.
    pub fn register(&mut self, entry: ManifestEntry) -> Result<(), TransformError> {
        if entry.kind == TransformKind::Aliased && self.declared.contains(&entry.exposed_name) {
            return Err(TransformError::AliasCollision {
                alias: entry.exposed_name,
                original: entry.original_name,
            });
        }
        if let Some(&idx) = self.index.get(&entry.exposed_name) {
            let existing = &self.entries[idx];
            if existing.same_binding(&entry) {
                return Ok(());
            }
            return Err(TransformError::NameCollision {
                name: entry.exposed_name.clone(),
                existing: existing.describe(),
                incoming: entry.describe(),
            });
        }
        self.index
            .insert(entry.exposed_name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn finish(self) -> Manifest {
        Manifest {
            entries: self.entries,
        }
    }
}

/// The four binder tables in their serialized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTables {
    pub deferred_functions: Vec<String>,
    pub aliased_functions: Vec<String>,
    pub callback_position_override: BTreeMap<String, usize>,
    pub opaque_callback_functions: Vec<String>,
}

/// Completed manifest for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exposed names of every function that now returns a deferred value
    pub fn deferred_functions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.exposed_name.as_str()).collect()
    }

    /// Original names of functions exposed through an alias
    pub fn aliased_functions(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == TransformKind::Aliased)
            .map(|e| e.original_name.as_str())
            .collect()
    }

    /// Exposed names whose synthetic callback is not appended at the end
    pub fn callback_position_override(&self) -> Vec<(&str, usize)> {
        self.entries
            .iter()
            .filter_map(|e| e.position_override.map(|idx| (e.exposed_name.as_str(), idx)))
            .collect()
    }

    /// Exposed names whose callback payload is delivered verbatim
    pub fn opaque_callback_functions(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.is_opaque())
            .map(|e| e.exposed_name.as_str())
            .collect()
    }

    pub fn tables(&self) -> ManifestTables {
        ManifestTables {
            deferred_functions: self.deferred_functions().into_iter().map(String::from).collect(),
            aliased_functions: self.aliased_functions().into_iter().map(String::from).collect(),
            callback_position_override: self
                .callback_position_override()
                .into_iter()
                .map(|(name, idx)| (name.to_string(), idx))
                .collect(),
            opaque_callback_functions: self
                .opaque_callback_functions()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Check emitted declarations against the manifest
    ///
    /// `trees` are loaded from the emitted text. Every declaration of an
    /// exposed name must have a deferred return type and no callback
    /// parameter, and every aliased original must still be declared.
    pub fn verify(&self, trees: &[NamespaceTree], config: &TransformConfig) -> Result<(), TransformError> {
        let deferred_prefix = format!("{}<", config.deferred_type);
        for entry in &self.entries {
            let declared: Vec<_> = trees
                .iter()
                .flat_map(|t| t.namespaces.iter())
                .flat_map(|ns| ns.functions.iter())
                .filter(|f| f.full_name() == entry.exposed_name)
                .collect();
            if declared.is_empty() {
                return Err(mismatch(&entry.exposed_name, "not declared in the output"));
            }
            let deferred = declared.iter().all(|f| {
                f.return_type
                    .as_deref()
                    .is_some_and(|ret| ret.starts_with(&deferred_prefix))
                    && !f.parameters.iter().any(|p| config.is_callback_param(&p.name))
            });
            if !deferred {
                return Err(mismatch(
                    &entry.exposed_name,
                    &format!(
                        "a declaration does not return {}<...> or still takes a callback",
                        config.deferred_type
                    ),
                ));
            }
            if entry.kind == TransformKind::Aliased
                && !trees.iter().any(|t| t.function(&entry.original_name).is_some())
            {
                return Err(mismatch(
                    &entry.exposed_name,
                    &format!("aliased original `{}` is missing", entry.original_name),
                ));
            }
        }
        Ok(())
    }
}

fn mismatch(name: &str, reason: &str) -> TransformError {
    TransformError::ManifestMismatch {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
