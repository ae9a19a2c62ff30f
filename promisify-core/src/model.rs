//! Signature model: namespaces, functions, parameters and enums
//!
//! Global invariants enforced:
//! - Traversal order is declaration order in the source file
//! - Namespace names are unique; repeated blocks merge into one namespace
//! - Every function belongs to exactly one namespace
//! - Byte ranges refer to the original source and are never shifted;
//!   the emitter applies all edits in one pass

use crate::parser::ParsedDeclarations;
use crate::types::{shape_of, TypeShape};
use std::ops::Range;
use swc_common::{Span, Spanned};
use swc_ecma_ast::*;

/// Modifier keywords that may precede `function`
const FUNCTION_MODIFIERS: &[&str] = &["export", "declare"];

/// Modifier keywords that may precede `enum`
const ENUM_MODIFIERS: &[&str] = &["export", "declare", "const"];

/// A function parameter as declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// 0-based runtime argument index; `None` for the `this` pseudo-parameter
    pub position: Option<usize>,
    /// Full declared text, e.g. `path?: string`
    pub text: String,
    /// Declared type text, if annotated
    pub type_text: Option<String>,
    pub shape: TypeShape,
}

/// Where a declared function lives in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclSite {
    /// Byte range replaced when the function is re-rendered (doc block included)
    pub range: Range<usize>,
    /// Text before the `function` keyword, e.g. `export `
    pub modifiers: String,
    /// Indentation of the declaration's line
    pub indent: String,
}

/// How a function entered the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared in the source file
    Declared(DeclSite),
    /// Added by the rewriter as a sibling of a read-only function
    Alias { indent: String },
}

/// A namespaced function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub namespace: String,
    pub name: String,
    /// Type parameter text including angle brackets, e.g. `<T>`
    pub type_params: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    /// Raw JSDoc block (`/** ... */`) directly preceding the declaration
    pub doc: Option<String>,
    pub origin: Origin,
    /// Set once the rewriter has changed this signature
    pub modified: bool,
}

impl FunctionSignature {
    /// Identity key: `namespace.name`, or just `name` in the root namespace
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Render the declaration line (without doc block)
    pub fn render_declaration(&self, modifiers: &str) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.text.as_str()).collect();
        let mut out = format!(
            "{}function {}{}({})",
            modifiers,
            self.name,
            self.type_params.as_deref().unwrap_or(""),
            params.join(", ")
        );
        if let Some(ret) = &self.return_type {
            out.push_str(": ");
            out.push_str(ret);
        }
        out.push(';');
        out
    }
}

/// Join a namespace and a member name into a full name
pub fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// An enum declaration; inert apart from the `const` qualifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub namespace: String,
    pub name: String,
    /// Range of the `const` keyword and the whitespace after it
    pub const_keyword: Option<Range<usize>>,
    /// Set when the emitter should drop the `const` qualifier
    pub strip_const: bool,
}

/// A logical namespace; several source blocks may contribute to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Dotted name with the root prefix removed (`io`, `games.events`)
    pub name: String,
    pub functions: Vec<FunctionSignature>,
    pub enums: Vec<EnumDecl>,
    /// Byte offset where appended members are inserted (last block of this namespace)
    pub insertion_point: usize,
    /// True when the closing brace sits on its own line
    pub closes_on_own_line: bool,
    /// Indentation used for appended members when no function supplies one
    pub member_indent: String,
}

/// The whole declaration tree of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTree {
    pub namespaces: Vec<Namespace>,
}

impl NamespaceTree {
    /// Visit every function in declaration order (aliases after their namespace's declarations)
    pub fn for_each_function(&self, mut f: impl FnMut(&Namespace, &FunctionSignature)) {
        for ns in &self.namespaces {
            for func in &ns.functions {
                f(ns, func);
            }
        }
    }

    /// Look up a function by full name
    pub fn function(&self, full: &str) -> Option<&FunctionSignature> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.functions.iter())
            .find(|f| f.full_name() == full)
    }

    /// Total number of functions in the tree
    pub fn function_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.functions.len()).sum()
    }

    fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.iter_mut().find(|ns| ns.name == name)
    }
}

/// Build the namespace tree of a parsed declaration file
///
/// Namespaces outside `root_namespace` are not part of the API surface and
/// are left out of the tree (their text still passes through the emitter).
pub fn load(parsed: &ParsedDeclarations, root_namespace: &str) -> NamespaceTree {
    let mut loader = Loader {
        parsed,
        root: root_namespace,
        tree: NamespaceTree::default(),
    };
    loader.items(&parsed.module.body, None);
    loader.tree
}

struct Loader<'a> {
    parsed: &'a ParsedDeclarations,
    root: &'a str,
    tree: NamespaceTree,
}

/// A declaration together with the span of its enclosing statement
struct DeclItem<'d> {
    decl: &'d Decl,
    outer: Option<Span>,
}

fn decl_of(item: &ModuleItem) -> Option<DeclItem<'_>> {
    match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => Some(DeclItem { decl, outer: None }),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => Some(DeclItem {
            decl: &export.decl,
            outer: Some(export.span),
        }),
        _ => None,
    }
}

impl Loader<'_> {
    /// Walk a list of items; `namespace` is the dotted path of the enclosing block
    fn items(&mut self, items: &[ModuleItem], namespace: Option<&str>) {
        for item in items {
            let Some(DeclItem { decl, outer }) = decl_of(item) else {
                continue;
            };
            match decl {
                Decl::TsModule(module) => self.module(module, namespace),
                Decl::Fn(fn_decl) => {
                    if let Some(ns) = namespace.and_then(|ns| self.api_namespace(ns)) {
                        self.function(fn_decl, outer, ns);
                    }
                }
                Decl::TsEnum(enum_decl) => {
                    if let Some(ns) = namespace.and_then(|ns| self.api_namespace(ns)) {
                        self.enumeration(enum_decl, outer, ns);
                    }
                }
                _ => {}
            }
        }
    }

    fn module(&mut self, module: &TsModuleDecl, parent: Option<&str>) {
        let first = match &module.id {
            TsModuleName::Ident(ident) => ident.sym.to_string(),
            // `declare module "x"` and `declare global` blocks are transparent
            TsModuleName::Str(_) => {
                if let Some(TsNamespaceBody::TsModuleBlock(block)) = &module.body {
                    self.items(&block.body, parent);
                }
                return;
            }
        };
        if module.global {
            if let Some(TsNamespaceBody::TsModuleBlock(block)) = &module.body {
                self.items(&block.body, parent);
            }
            return;
        }

        let mut path = match parent {
            Some(p) => format!("{}.{}", p, first),
            None => first,
        };
        let mut body = module.body.as_ref();
        while let Some(TsNamespaceBody::TsNamespaceDecl(inner)) = body {
            path.push('.');
            path.push_str(&inner.id.sym);
            body = Some(&*inner.body);
        }
        let Some(TsNamespaceBody::TsModuleBlock(block)) = body else {
            return;
        };

        if let Some(name) = self.api_namespace(&path) {
            self.open_namespace(&name, block);
        }
        self.items(&block.body, Some(&path));
    }

    /// Map a declared path onto an API namespace name, or None if outside the root
    fn api_namespace(&self, declared: &str) -> Option<String> {
        if self.root.is_empty() {
            return Some(declared.to_string());
        }
        if declared == self.root {
            return Some(String::new());
        }
        declared
            .strip_prefix(self.root)
            .and_then(|rest| rest.strip_prefix('.'))
            .map(str::to_string)
    }

    /// Register a block for a namespace, creating it on first sight
    fn open_namespace(&mut self, name: &str, block: &TsModuleBlock) {
        let source = self.parsed.source();
        let block_end = self.parsed.offset(block.span.hi).min(source.len());
        let close = source[..block_end].rfind('}').unwrap_or(block_end);
        let line_start = line_start(source, close);
        let closes_on_own_line = source[line_start..close].trim().is_empty();
        let insertion_point = if closes_on_own_line { line_start } else { close };
        let closing_indent = if closes_on_own_line {
            source[line_start..close].to_string()
        } else {
            String::new()
        };
        let member_indent = format!("{}    ", closing_indent);

        match self.tree.namespace_mut(name) {
            Some(ns) => {
                ns.insertion_point = insertion_point;
                ns.closes_on_own_line = closes_on_own_line;
                ns.member_indent = member_indent;
            }
            None => self.tree.namespaces.push(Namespace {
                name: name.to_string(),
                functions: Vec::new(),
                enums: Vec::new(),
                insertion_point,
                closes_on_own_line,
                member_indent,
            }),
        }
    }

    fn function(&mut self, fn_decl: &FnDecl, outer: Option<Span>, namespace: String) {
        let parsed = self.parsed;
        let source = parsed.source();
        let function = &fn_decl.function;

        let ident_start = parsed.offset(fn_decl.ident.span.lo);
        let keyword_start = keyword_before(source, ident_start, "function").unwrap_or(ident_start);
        let mut decl_start = parsed.offset(function.span.lo).min(keyword_start);
        if let Some(outer) = outer {
            decl_start = decl_start.min(parsed.offset(outer.lo));
        }
        let decl_start = extend_over_modifiers(source, decl_start, FUNCTION_MODIFIERS);

        let mut decl_end = parsed.offset(function.span.hi);
        if let Some(ret) = &function.return_type {
            decl_end = decl_end.max(parsed.offset(ret.span.hi));
        }
        let decl_end = include_semicolon(source, decl_end);

        let modifiers = source[decl_start..keyword_start].to_string();

        let doc_range = doc_before(source, decl_start);
        let range_start = doc_range.as_ref().map_or(decl_start, |r| r.start);
        let doc = doc_range.map(|r| source[r].to_string());

        let mut next_argument = 0;
        let mut parameters = Vec::with_capacity(function.params.len());
        for param in &function.params {
            let position = if is_this_param(param) {
                None
            } else {
                next_argument += 1;
                Some(next_argument - 1)
            };
            parameters.push(self.parameter(param, position));
        }

        let signature = FunctionSignature {
            namespace: namespace.clone(),
            name: fn_decl.ident.sym.to_string(),
            type_params: function
                .type_params
                .as_ref()
                .map(|tp| parsed.text(tp.span).to_string()),
            parameters,
            return_type: function
                .return_type
                .as_ref()
                .map(|ret| parsed.text(ret.type_ann.span()).to_string()),
            doc,
            origin: Origin::Declared(DeclSite {
                range: range_start..decl_end,
                modifiers,
                indent: indent_of(source, range_start),
            }),
            modified: false,
        };

        if let Some(ns) = self.tree.namespace_mut(&namespace) {
            ns.functions.push(signature);
        }
    }

    fn parameter(&self, param: &Param, position: Option<usize>) -> Parameter {
        let parsed = self.parsed;
        let (name, type_ann) = match &param.pat {
            Pat::Ident(b) => (b.id.sym.to_string(), b.type_ann.as_ref()),
            Pat::Rest(r) => {
                let name = match &*r.arg {
                    Pat::Ident(b) => b.id.sym.to_string(),
                    _ => String::new(),
                };
                (name, r.type_ann.as_ref())
            }
            Pat::Array(a) => (String::new(), a.type_ann.as_ref()),
            Pat::Object(o) => (String::new(), o.type_ann.as_ref()),
            _ => (String::new(), None),
        };

        let lo = parsed.offset(param.span.lo);
        let mut hi = parsed.offset(param.span.hi);
        if let Some(ann) = type_ann {
            hi = hi.max(parsed.offset(ann.span.hi));
        }
        let text = parsed.source().get(lo..hi).unwrap_or("").trim().to_string();

        Parameter {
            name,
            position,
            text,
            type_text: type_ann.map(|ann| parsed.text(ann.type_ann.span()).to_string()),
            shape: type_ann.map_or(TypeShape::Missing, |ann| shape_of(&ann.type_ann, parsed)),
        }
    }

    fn enumeration(&mut self, enum_decl: &TsEnumDecl, outer: Option<Span>, namespace: String) {
        let parsed = self.parsed;
        let source = parsed.source();
        let ident_start = parsed.offset(enum_decl.id.span.lo);
        let keyword_start = keyword_before(source, ident_start, "enum").unwrap_or(ident_start);
        let mut start = parsed.offset(enum_decl.span.lo).min(keyword_start);
        if let Some(outer) = outer {
            start = start.min(parsed.offset(outer.lo));
        }
        let start = extend_over_modifiers(source, start, ENUM_MODIFIERS);

        let const_keyword = if enum_decl.is_const {
            find_keyword(source, start..ident_start, "const").map(|kw| {
                let after = source[kw.end..]
                    .find(|c: char| !c.is_whitespace())
                    .map_or(source.len(), |n| kw.end + n);
                kw.start..after
            })
        } else {
            None
        };

        let decl = EnumDecl {
            namespace: namespace.clone(),
            name: enum_decl.id.sym.to_string(),
            const_keyword,
            strip_const: false,
        };
        if let Some(ns) = self.tree.namespace_mut(&namespace) {
            ns.enums.push(decl);
        }
    }
}

/// The `this` pseudo-parameter types the receiver and is never passed as an argument
fn is_this_param(param: &Param) -> bool {
    matches!(&param.pat, Pat::Ident(b) if &*b.id.sym == "this")
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Start of `keyword` if it directly precedes `pos` on the same line
fn keyword_before(source: &str, pos: usize, keyword: &str) -> Option<usize> {
    let before = source[..pos].trim_end_matches([' ', '\t']);
    if !before.ends_with(keyword) {
        return None;
    }
    let start = before.len() - keyword.len();
    let preceded_ok = before[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_ident_char(c));
    preceded_ok.then_some(start)
}

/// Move `pos` backwards over modifier keywords on the same line
fn extend_over_modifiers(source: &str, mut pos: usize, modifiers: &[&str]) -> usize {
    while let Some(start) = modifiers
        .iter()
        .find_map(|kw| keyword_before(source, pos, kw))
    {
        pos = start;
    }
    pos
}

/// Extend an end offset over a trailing `;` (skipping inline whitespace)
fn include_semicolon(source: &str, end: usize) -> usize {
    let rest = &source[end..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(';') {
        end + (rest.len() - trimmed.len()) + 1
    } else {
        end
    }
}

/// Range of a `/** ... */` block separated from `pos` only by whitespace
fn doc_before(source: &str, pos: usize) -> Option<Range<usize>> {
    let before = source[..pos].trim_end();
    if !before.ends_with("*/") {
        return None;
    }
    let end = before.len();
    let start = source[..end - 2].rfind("/*")?;
    if source[start..].starts_with("/**") {
        Some(start..end)
    } else {
        None
    }
}

fn line_start(source: &str, pos: usize) -> usize {
    source[..pos].rfind('\n').map_or(0, |n| n + 1)
}

/// Leading whitespace of the line containing `pos`, if only whitespace precedes it
fn indent_of(source: &str, pos: usize) -> String {
    let prefix = &source[line_start(source, pos)..pos];
    if prefix.chars().all(char::is_whitespace) {
        prefix.to_string()
    } else {
        String::new()
    }
}

/// Find a whole-word keyword inside a byte range
fn find_keyword(source: &str, range: Range<usize>, keyword: &str) -> Option<Range<usize>> {
    let hay = &source[range.clone()];
    let mut from = 0;
    while let Some(idx) = hay[from..].find(keyword) {
        let start = from + idx;
        let end = start + keyword.len();
        let before_ok = hay[..start].chars().next_back().map_or(true, |c| !is_ident_char(c));
        let after_ok = hay[end..].chars().next().map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            return Some(range.start + start..range.start + end);
        }
        from = end;
    }
    None
}
