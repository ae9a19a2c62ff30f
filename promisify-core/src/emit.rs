//! Declaration emitter
//!
//! Serializes the transformed tree by splicing edits into the original text.
//! Bytes that no edit touches are copied through unchanged, so untransformed
//! functions, comments and formatting come out byte-identical.
//!
//! Edits:
//! - modified declared function: its doc+declaration range is re-rendered
//! - alias: appended before the closing brace of its namespace's last block
//! - stripped enum: the `const ` keyword range is removed

use crate::model::{FunctionSignature, Namespace, NamespaceTree, Origin};
use std::ops::Range;
use tracing::warn;

/// One text replacement against the original source
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    text: String,
}

/// Render the transformed tree as declaration text
pub fn emit(source: &str, tree: &NamespaceTree) -> String {
    let edits = collect_edits(tree);
    apply_edits(source, edits)
}

fn collect_edits(tree: &NamespaceTree) -> Vec<Edit> {
    let mut edits = Vec::new();
    for ns in &tree.namespaces {
        for func in &ns.functions {
            match &func.origin {
                Origin::Declared(site) if func.modified => {
                    edits.push(Edit {
                        range: site.range.clone(),
                        text: render_declared(func, &site.modifiers, &site.indent),
                    });
                }
                Origin::Declared(_) => {}
                Origin::Alias { indent } => {
                    edits.push(Edit {
                        range: ns.insertion_point..ns.insertion_point,
                        text: render_alias(ns, func, indent),
                    });
                }
            }
        }
        for enum_decl in &ns.enums {
            if let (true, Some(range)) = (enum_decl.strip_const, &enum_decl.const_keyword) {
                edits.push(Edit {
                    range: range.clone(),
                    text: String::new(),
                });
            }
        }
    }
    edits
}

/// Doc block and declaration for a function rewritten in place
///
/// The range starts after the line's indentation, so the first line carries
/// no indent of its own.
fn render_declared(func: &FunctionSignature, modifiers: &str, indent: &str) -> String {
    let decl = func.render_declaration(modifiers);
    match &func.doc {
        Some(doc) => format!("{}\n{}{}", doc, indent, decl),
        None => decl,
    }
}

fn render_alias(ns: &Namespace, func: &FunctionSignature, indent: &str) -> String {
    let indent = if indent.is_empty() {
        ns.member_indent.as_str()
    } else {
        indent
    };
    let decl = func.render_declaration("");
    if ns.closes_on_own_line {
        match &func.doc {
            Some(doc) => format!("\n{}{}\n{}{}\n", indent, doc, indent, decl),
            None => format!("\n{}{}\n", indent, decl),
        }
    } else {
        match &func.doc {
            Some(doc) => format!("{} {} ", doc, decl),
            None => format!("{} ", decl),
        }
    }
}

/// Apply non-overlapping edits in one pass over the source
///
/// Insertions at the same offset keep their collection order.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(source.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor || edit.range.end > source.len() {
            warn!(
                "skipping overlapping edit at {}..{}",
                edit.range.start, edit.range.end
            );
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}
