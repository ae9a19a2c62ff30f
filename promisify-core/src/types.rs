//! Typed view of declared parameter types
//!
//! Converts SWC type nodes into `TypeShape`, a small tagged model the
//! classifier matches on. Type aliases and interfaces declared anywhere in
//! the file are indexed so a callback typed through a named alias resolves
//! to the same call signatures as an inline function type.
//!
//! Global invariants enforced:
//! - Resolution is best-effort: anything unresolvable is `Other`, never guessed
//! - Alias chains are followed to a fixed depth, so cycles terminate

use crate::parser::ParsedDeclarations;
use std::collections::HashMap;
use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// Maximum number of alias hops followed when resolving a reference
const MAX_ALIAS_DEPTH: usize = 8;

/// One parameter of a call signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParam {
    pub name: String,
    pub type_text: Option<String>,
}

/// A callable shape: `(a: A, b: B) => R` or `{ (a: A): R }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    pub params: Vec<SignatureParam>,
}

/// Structural view of a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// No type annotation at all
    Missing,
    /// Named type, possibly generic: `Name<Arg1, Arg2>`
    Reference {
        /// Last segment of the (possibly qualified) name
        name: String,
        /// Type argument texts, empty when not instantiated
        args: Vec<String>,
    },
    /// Inline function type or object type with call signatures
    Callable(Vec<CallSignature>),
    /// Anything else (unions, primitives, object literals without call signatures)
    Other,
}

/// Build the shape of a type node, reading texts from the parsed file
pub fn shape_of(ty: &TsType, parsed: &ParsedDeclarations) -> TypeShape {
    match ty {
        TsType::TsParenthesizedType(p) => shape_of(&p.type_ann, parsed),
        TsType::TsTypeRef(r) => TypeShape::Reference {
            name: entity_last_segment(&r.type_name),
            args: r
                .type_params
                .as_ref()
                .map(|tp| {
                    tp.params
                        .iter()
                        .map(|arg| parsed.text(arg.span()).to_string())
                        .collect()
                })
                .unwrap_or_default(),
        },
        TsType::TsFnOrConstructorType(TsFnOrConstructorType::TsFnType(f)) => {
            TypeShape::Callable(vec![call_signature(&f.params, parsed)])
        }
        TsType::TsTypeLit(lit) => {
            let signatures = call_signatures_of(&lit.members, parsed);
            if signatures.is_empty() {
                TypeShape::Other
            } else {
                TypeShape::Callable(signatures)
            }
        }
        _ => TypeShape::Other,
    }
}

fn entity_last_segment(name: &TsEntityName) -> String {
    match name {
        TsEntityName::Ident(ident) => ident.sym.to_string(),
        TsEntityName::TsQualifiedName(q) => q.right.sym.to_string(),
    }
}

fn call_signatures_of(members: &[TsTypeElement], parsed: &ParsedDeclarations) -> Vec<CallSignature> {
    members
        .iter()
        .filter_map(|member| match member {
            TsTypeElement::TsCallSignatureDecl(c) => Some(call_signature(&c.params, parsed)),
            _ => None,
        })
        .collect()
}

fn call_signature(params: &[TsFnParam], parsed: &ParsedDeclarations) -> CallSignature {
    CallSignature {
        params: params.iter().map(|p| signature_param(p, parsed)).collect(),
    }
}

fn signature_param(param: &TsFnParam, parsed: &ParsedDeclarations) -> SignatureParam {
    let (name, type_ann) = match param {
        TsFnParam::Ident(b) => (b.id.sym.to_string(), b.type_ann.as_ref()),
        TsFnParam::Array(a) => (String::new(), a.type_ann.as_ref()),
        TsFnParam::Rest(r) => (String::new(), r.type_ann.as_ref()),
        TsFnParam::Object(o) => (String::new(), o.type_ann.as_ref()),
    };
    SignatureParam {
        name,
        type_text: type_ann.map(|ann| parsed.text(ann.type_ann.span()).to_string()),
    }
}

/// A named type declared in the file
#[derive(Debug, Clone)]
struct NamedType {
    type_params: Vec<String>,
    shape: TypeShape,
}

/// Index of type aliases and interfaces, keyed by simple name
///
/// Names declared more than once with conflicting shapes are treated as
/// unresolvable rather than picking one.
#[derive(Debug, Default)]
pub struct TypeIndex {
    named: HashMap<String, Option<NamedType>>,
}

impl TypeIndex {
    /// Collect every alias and interface in the module
    pub fn build(parsed: &ParsedDeclarations) -> Self {
        let mut collector = TypeCollector {
            parsed,
            index: TypeIndex::default(),
        };
        parsed.module.visit_with(&mut collector);
        collector.index
    }

    fn insert(&mut self, name: String, named: NamedType) {
        match self.named.get_mut(&name) {
            None => {
                self.named.insert(name, Some(named));
            }
            Some(existing) => {
                // Interface merging: call signatures accumulate
                let merged = match (existing.take(), named) {
                    (
                        Some(NamedType {
                            type_params,
                            shape: TypeShape::Callable(mut a),
                        }),
                        NamedType {
                            shape: TypeShape::Callable(b),
                            ..
                        },
                    ) => {
                        a.extend(b);
                        Some(NamedType {
                            type_params,
                            shape: TypeShape::Callable(a),
                        })
                    }
                    (Some(prev), next) if prev.shape == next.shape => Some(prev),
                    _ => None,
                };
                *existing = merged;
            }
        }
    }

    /// Resolve the call signatures a shape denotes, following aliases
    pub fn call_signatures(&self, shape: &TypeShape) -> Option<Vec<CallSignature>> {
        self.resolve(shape, 0)
    }

    fn resolve(&self, shape: &TypeShape, depth: usize) -> Option<Vec<CallSignature>> {
        match shape {
            TypeShape::Callable(signatures) => Some(signatures.clone()),
            TypeShape::Reference { name, args } => {
                if depth >= MAX_ALIAS_DEPTH {
                    return None;
                }
                let named = self.named.get(name)?.as_ref()?;
                let signatures = self.resolve(&named.shape, depth + 1)?;
                Some(substitute(signatures, &named.type_params, args))
            }
            TypeShape::Missing | TypeShape::Other => None,
        }
    }
}

/// Replace parameter types that are exactly a generic parameter name
fn substitute(
    mut signatures: Vec<CallSignature>,
    type_params: &[String],
    args: &[String],
) -> Vec<CallSignature> {
    if type_params.is_empty() || args.is_empty() {
        return signatures;
    }
    for signature in &mut signatures {
        for param in &mut signature.params {
            if let Some(text) = &param.type_text {
                if let Some(idx) = type_params.iter().position(|tp| tp == text) {
                    if let Some(arg) = args.get(idx) {
                        param.type_text = Some(arg.clone());
                    }
                }
            }
        }
    }
    signatures
}

struct TypeCollector<'a> {
    parsed: &'a ParsedDeclarations,
    index: TypeIndex,
}

fn type_param_names(decl: Option<&TsTypeParamDecl>) -> Vec<String> {
    decl.map(|d| d.params.iter().map(|p| p.name.sym.to_string()).collect())
        .unwrap_or_default()
}

impl Visit for TypeCollector<'_> {
    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        let named = NamedType {
            type_params: type_param_names(decl.type_params.as_deref()),
            shape: shape_of(&decl.type_ann, self.parsed),
        };
        self.index.insert(decl.id.sym.to_string(), named);
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        let signatures = call_signatures_of(&decl.body.body, self.parsed);
        let shape = if signatures.is_empty() {
            TypeShape::Other
        } else {
            TypeShape::Callable(signatures)
        };
        let named = NamedType {
            type_params: type_param_names(decl.type_params.as_deref()),
            shape,
        };
        self.index.insert(decl.id.sym.to_string(), named);
    }
}
