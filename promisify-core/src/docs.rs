//! JSDoc conversion for rewritten functions
//!
//! The callback's `@param` tag becomes a `@returns` tag; its description is
//! carried over verbatim inside the configured template. Existing
//! `@returns` tags are dropped because the return type changed.
//!
//! Only docs of rewritten functions pass through here. They are re-rendered
//! in canonical block style; untouched docs are never reformatted.

use crate::config::DESCRIPTION_PLACEHOLDER;
use regex::Regex;
use std::sync::OnceLock;

/// Result of converting one doc block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocConversion {
    /// Rendered doc block
    pub text: String,
    /// False when no `@param` tag for the callback was present
    pub tag_found: bool,
}

fn param_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^@param\s+(?:\{[^}]*\}\s*)?\[?([A-Za-z_$][A-Za-z0-9_$]*)(?:=[^\]]*)?\]?(?:\s+-)?\s*(.*)$",
        )
        .unwrap()
    })
}

fn returns_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@returns?\b").unwrap())
}

/// Strip comment markers, returning one content string per line
fn content_lines(doc: &str) -> Vec<String> {
    let inner = doc
        .trim()
        .strip_prefix("/**")
        .unwrap_or(doc)
        .trim_end()
        .strip_suffix("*/")
        .unwrap_or(doc);

    let mut lines: Vec<String> = inner
        .lines()
        .map(|line| {
            let line = line.trim_start();
            let line = match line.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            };
            line.trim_end().to_string()
        })
        .collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Render content lines as a block comment at the given indentation
fn render(lines: &[String], indent: &str) -> String {
    let mut out = String::from("/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(&format!("{} *\n", indent));
        } else {
            out.push_str(&format!("{} * {}\n", indent, line));
        }
    }
    out.push_str(&format!("{} */", indent));
    out
}

/// Group content lines into the free-text head and one block per tag
fn split_tags(lines: Vec<String>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut head = Vec::new();
    let mut tags: Vec<Vec<String>> = Vec::new();
    for line in lines {
        if line.starts_with('@') {
            tags.push(vec![line]);
        } else if let Some(tag) = tags.last_mut() {
            tag.push(line);
        } else {
            head.push(line);
        }
    }
    (head, tags)
}

/// Build the `@returns` lines for a description that may span several lines
fn returns_lines(template: &str, description: &[String]) -> Vec<String> {
    let first = description.first().map(String::as_str).unwrap_or("");
    let mut lines = vec![format!(
        "@returns {}",
        template.replace(DESCRIPTION_PLACEHOLDER, first)
    )];
    lines.extend(description.iter().skip(1).cloned());
    lines
}

/// Convert the callback tag of a doc block into a `@returns` tag
pub fn convert_callback_doc(
    doc: &str,
    callback_name: &str,
    indent: &str,
    template: &str,
    placeholder: &str,
) -> DocConversion {
    let (head, tags) = split_tags(content_lines(doc));

    let mut out = head;
    let mut returns: Option<Vec<String>> = None;
    let mut kept_tags = Vec::new();

    for tag in tags {
        let first = tag[0].as_str();
        if returns_tag_re().is_match(first) {
            continue;
        }
        if returns.is_none() {
            if let Some(caps) = param_tag_re().captures(first) {
                if &caps[1] == callback_name {
                    let mut description: Vec<String> = vec![caps[2].trim().to_string()];
                    description.extend(tag.iter().skip(1).cloned());
                    while description.last().is_some_and(|l| l.is_empty()) {
                        description.pop();
                    }
                    if description.iter().all(|l| l.is_empty()) {
                        description = vec![placeholder.to_string()];
                    }
                    returns = Some(returns_lines(template, &description));
                    continue;
                }
            }
        }
        kept_tags.push(tag);
    }

    let tag_found = returns.is_some();
    let returns =
        returns.unwrap_or_else(|| returns_lines(template, &[placeholder.to_string()]));

    for tag in kept_tags {
        out.extend(tag);
    }
    out.extend(returns);

    DocConversion {
        text: render(&out, indent),
        tag_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "A promise resolving with {description}";

    fn convert(doc: &str) -> DocConversion {
        convert_callback_doc(doc, "callback", "    ", TEMPLATE, "the result")
    }

    #[test]
    fn test_param_tag_becomes_returns() {
        let doc = "/**\n     * Lists files.\n     * @param pathId The folder id.\n     * @param callback The list of entries.\n     */";
        let result = convert(doc);
        assert!(result.tag_found);
        assert_eq!(
            result.text,
            "/**\n     * Lists files.\n     * @param pathId The folder id.\n     * @returns A promise resolving with The list of entries.\n     */"
        );
    }

    #[test]
    fn test_typed_tag_with_dash_separator() {
        let doc = "/** @param {Function} callback - called with the result */";
        let result = convert(doc);
        assert!(result.tag_found);
        assert!(result
            .text
            .contains("@returns A promise resolving with called with the result"));
        assert!(!result.text.contains("@param"));
    }

    #[test]
    fn test_multiline_description_is_kept() {
        let doc = "/**\n * @param callback First line\n * second line\n */";
        let result = convert_callback_doc(doc, "callback", "", TEMPLATE, "x");
        assert_eq!(
            result.text,
            "/**\n * @returns A promise resolving with First line\n * second line\n */"
        );
    }

    #[test]
    fn test_existing_returns_tag_dropped() {
        let doc = "/**\n * @param callback Done.\n * @returns nothing\n */";
        let result = convert_callback_doc(doc, "callback", "", TEMPLATE, "x");
        assert_eq!(result.text.matches("@returns").count(), 1);
        assert!(!result.text.contains("nothing"));
    }

    #[test]
    fn test_missing_tag_uses_placeholder() {
        let doc = "/**\n * Does a thing.\n */";
        let result = convert_callback_doc(doc, "callback", "", TEMPLATE, "the result");
        assert!(!result.tag_found);
        assert_eq!(
            result.text,
            "/**\n * Does a thing.\n * @returns A promise resolving with the result\n */"
        );
    }

    #[test]
    fn test_other_param_with_same_prefix_is_not_matched() {
        let doc = "/**\n * @param callbackId The id.\n */";
        let result = convert_callback_doc(doc, "callback", "", TEMPLATE, "p");
        assert!(!result.tag_found);
        assert!(result.text.contains("@param callbackId The id."));
    }

    #[test]
    fn test_blank_lines_in_head_preserved() {
        let doc = "/**\n * Summary.\n *\n * Details.\n * @param callback Result.\n */";
        let result = convert_callback_doc(doc, "callback", "", TEMPLATE, "p");
        assert!(result.text.contains(" * Summary.\n *\n * Details.\n"));
    }
}
