//! Signature rewriting
//!
//! Turns a classified callback function into its deferred form:
//! - callback parameter removed, other parameters untouched and in order
//! - return type `Deferred<Result>`
//! - callback doc tag converted into a `@returns` tag
//!
//! Read-only functions keep their original declaration; the deferred form is
//! a new sibling named `original + suffix`.

use crate::classify::DetectedCallback;
use crate::config::TransformConfig;
use crate::docs::convert_callback_doc;
use crate::error::Diagnostic;
use crate::manifest::ManifestEntry;
use crate::model::{FunctionSignature, Origin};
use serde::Serialize;

/// How the deferred form is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// The original declaration is replaced
    InPlace,
    /// A new sibling declaration is added; the original stays
    Aliased,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::InPlace => "in-place",
            TransformKind::Aliased => "aliased",
        }
    }
}

/// Everything produced by rewriting one function
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub kind: TransformKind,
    pub new_signature: FunctionSignature,
    pub manifest_entry: ManifestEntry,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrite a function with a detected callback
pub fn rewrite(
    signature: &FunctionSignature,
    callback: &DetectedCallback,
    config: &TransformConfig,
) -> TransformOutcome {
    let original_name = signature.full_name();
    let kind = if config.is_read_only(&original_name) {
        TransformKind::Aliased
    } else {
        TransformKind::InPlace
    };

    let indent = match &signature.origin {
        Origin::Declared(site) => site.indent.clone(),
        Origin::Alias { indent } => indent.clone(),
    };

    let mut diagnostics = Vec::new();
    let doc = match &signature.doc {
        Some(doc) => {
            let converted = convert_callback_doc(
                doc,
                &callback.parameter,
                &indent,
                &config.returns_doc_template,
                &config.missing_doc_placeholder,
            );
            if !converted.tag_found {
                diagnostics.push(missing_doc(&original_name, callback));
            }
            Some(converted.text)
        }
        None => {
            diagnostics.push(missing_doc(&original_name, callback));
            None
        }
    };

    let mut next_argument = 0;
    let parameters = signature
        .parameters
        .iter()
        .filter(|p| p.position != Some(callback.position))
        .cloned()
        .map(|mut p| {
            if p.position.is_some() {
                p.position = Some(next_argument);
                next_argument += 1;
            }
            p
        })
        .collect();

    let mut new_signature = FunctionSignature {
        namespace: signature.namespace.clone(),
        name: signature.name.clone(),
        type_params: signature.type_params.clone(),
        parameters,
        return_type: Some(config.deferred_of(&callback.result_type)),
        doc,
        origin: signature.origin.clone(),
        modified: true,
    };

    if kind == TransformKind::Aliased {
        new_signature.name = format!("{}{}", signature.name, config.alias_suffix);
        new_signature.origin = Origin::Alias { indent };
    }

    let manifest_entry = ManifestEntry {
        exposed_name: new_signature.full_name(),
        original_name,
        kind,
        callback: callback.kind,
        result_type: callback.result_type.clone(),
        position_override: callback.position_override(),
    };

    TransformOutcome {
        kind,
        new_signature,
        manifest_entry,
        diagnostics,
    }
}

fn missing_doc(function: &str, callback: &DetectedCallback) -> Diagnostic {
    Diagnostic::MissingDocumentation {
        function: function.to_string(),
        parameter: callback.parameter.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Classification};
    use crate::model::load;
    use crate::parser::parse_declarations;
    use crate::types::TypeIndex;
    use swc_common::{sync::Lrc, SourceMap};

    fn rewrite_src(decl: &str, config: &TransformConfig) -> (FunctionSignature, TransformOutcome) {
        let src = format!("declare namespace overwolf.io {{\n{}\n}}\n", decl);
        let cm: Lrc<SourceMap> = Default::default();
        let parsed = parse_declarations(&src, &cm, "rewrite.d.ts").unwrap();
        let tree = load(&parsed, "overwolf");
        let types = TypeIndex::build(&parsed);
        let func = tree.namespaces[0].functions[0].clone();
        let Ok(Classification::Callback(cb)) = classify(&func, config, &types) else {
            panic!("expected a callback");
        };
        let outcome = rewrite(&func, &cb, config);
        (func, outcome)
    }

    #[test]
    fn test_in_place_rewrite() {
        let (_, outcome) = rewrite_src(
            "    /**\n     * Reads.\n     * @param callback The content.\n     */\n    function readFile(path: string, callback: CallbackFunction<FileResult>): void;",
            &TransformConfig::default(),
        );
        assert_eq!(outcome.kind, TransformKind::InPlace);
        let sig = &outcome.new_signature;
        assert_eq!(sig.name, "readFile");
        assert_eq!(sig.parameters.len(), 1);
        assert_eq!(sig.parameters[0].text, "path: string");
        assert_eq!(sig.return_type.as_deref(), Some("Promise<FileResult>"));
        assert!(sig.modified);
        assert!(sig.doc.as_deref().unwrap().contains("@returns"));
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.manifest_entry.exposed_name, "io.readFile");
        assert_eq!(outcome.manifest_entry.position_override, None);
    }

    #[test]
    fn test_aliased_rewrite_keeps_original() {
        let mut config = TransformConfig::default();
        config.read_only_functions.insert("io.readTextFile".to_string());
        let (original, outcome) = rewrite_src(
            "    function readTextFile(path: string, callback: CallbackFunction<string>): void;",
            &config,
        );
        assert_eq!(outcome.kind, TransformKind::Aliased);
        assert_eq!(outcome.new_signature.name, "readTextFileAsync");
        assert_eq!(outcome.manifest_entry.exposed_name, "io.readTextFileAsync");
        assert_eq!(outcome.manifest_entry.original_name, "io.readTextFile");
        assert!(matches!(
            &outcome.new_signature.origin,
            Origin::Alias { indent } if indent == "    "
        ));
        // Source signature is not mutated by rewriting
        assert_eq!(original.parameters.len(), 2);
        assert_eq!(original.return_type.as_deref(), Some("void"));
    }

    #[test]
    fn test_interior_callback_keeps_other_parameters_in_order() {
        let (_, outcome) = rewrite_src(
            "    function set(name: string, callback: CallbackFunction<R>, value?: number): void;",
            &TransformConfig::default(),
        );
        let texts: Vec<&str> = outcome
            .new_signature
            .parameters
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(texts, vec!["name: string", "value?: number"]);
        let positions: Vec<Option<usize>> = outcome
            .new_signature
            .parameters
            .iter()
            .map(|p| p.position)
            .collect();
        assert_eq!(positions, vec![Some(0), Some(1)]);
        assert_eq!(outcome.manifest_entry.position_override, Some(1));
    }

    #[test]
    fn test_this_parameter_kept_in_rewritten_declaration() {
        let (_, outcome) = rewrite_src(
            "    function f(this: Window, callback: CallbackFunction<R>, opt: string): void;",
            &TransformConfig::default(),
        );
        assert_eq!(
            outcome.new_signature.render_declaration(""),
            "function f(this: Window, opt: string): Promise<R>;"
        );
        assert_eq!(outcome.manifest_entry.position_override, Some(0));
    }

    #[test]
    fn test_missing_doc_is_diagnostic() {
        let (_, outcome) = rewrite_src(
            "    function ping(callback: CallbackFunction<Pong>): void;",
            &TransformConfig::default(),
        );
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code(), "missing-documentation");
        assert!(outcome.new_signature.doc.is_none());
    }

    #[test]
    fn test_custom_deferred_type() {
        let config = TransformConfig {
            deferred_type: "Deferred".to_string(),
            ..TransformConfig::default()
        };
        let (_, outcome) = rewrite_src(
            "    function get(callback: CallbackFunction<number>): void;",
            &config,
        );
        assert_eq!(
            outcome.new_signature.return_type.as_deref(),
            Some("Deferred<number>")
        );
    }
}
