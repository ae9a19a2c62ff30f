//! Build-time error taxonomy
//!
//! Two tiers:
//! - `Diagnostic`: localized, non-fatal findings collected during a run
//! - `TransformError`: fatal conditions that abort emission
//!
//! Diagnostics never stop unrelated transformations. A `TransformError`
//! means no artifact may be written for the run.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Non-fatal finding attached to a single function or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Callback parameter references the wrapper type with the wrong number
    /// of type arguments; the function is left untouched.
    MalformedWrapperType {
        function: String,
        parameter: String,
        type_text: String,
    },
    /// The doc block has no tag for the callback parameter; a placeholder
    /// description was used for the generated `@returns` tag.
    MissingDocumentation { function: String, parameter: String },
    /// The parser recovered from an error and kept going.
    ParseRecovered { file: String, message: String },
}

impl Diagnostic {
    /// Short machine-friendly code for the diagnostic kind
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::MalformedWrapperType { .. } => "malformed-wrapper-type",
            Diagnostic::MissingDocumentation { .. } => "missing-documentation",
            Diagnostic::ParseRecovered { .. } => "parse-recovered",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedWrapperType {
                function,
                parameter,
                type_text,
            } => write!(
                f,
                "{}: parameter `{}` has malformed wrapper type `{}`, left untransformed",
                function, parameter, type_text
            ),
            Diagnostic::MissingDocumentation {
                function,
                parameter,
            } => write!(
                f,
                "{}: no doc tag for callback parameter `{}`, placeholder used",
                function, parameter
            ),
            Diagnostic::ParseRecovered { file, message } => {
                write!(f, "{}: recovered from parse error: {}", file, message)
            }
        }
    }
}

/// Fatal transformation failure
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("name collision on `{name}`: {existing} conflicts with {incoming}")]
    NameCollision {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("alias `{alias}` for `{original}` collides with an existing declaration")]
    AliasCollision { alias: String, original: String },

    #[error("emitted declarations disagree with the manifest for `{name}`: {reason}")]
    ManifestMismatch { name: String, reason: String },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}
