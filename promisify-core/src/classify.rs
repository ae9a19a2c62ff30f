//! Callback classification
//!
//! Decides, per function, whether it takes a callback and what the callback
//! delivers. The match is over the typed `TypeShape` model, never over raw
//! type text.
//!
//! Order of checks:
//! 1. First parameter whose name is an accepted callback name
//! 2. Reference to the wrapper type with one type argument -> typed
//! 3. Exactly one call signature with at least one parameter -> bare function
//! 4. Anything else -> opaque, result type `void`

use crate::config::TransformConfig;
use crate::error::Diagnostic;
use crate::model::FunctionSignature;
use crate::types::{TypeIndex, TypeShape};
use serde::Serialize;

/// Result type used when the callback's payload type is unknown
pub const OPAQUE_RESULT_TYPE: &str = "void";

/// Result type used for an unannotated callback parameter
const UNTYPED_RESULT_TYPE: &str = "any";

/// Callback categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    /// `callback: Wrapper<T>`
    Typed,
    /// `callback: (result: T) => void` or an alias/interface resolving to it
    BareFunction,
    /// A callback whose payload shape could not be determined
    Opaque,
}

impl CallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::Typed => "typed",
            CallbackKind::BareFunction => "bare-function",
            CallbackKind::Opaque => "opaque",
        }
    }
}

/// A recognized callback parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCallback {
    pub kind: CallbackKind,
    /// Name of the callback parameter
    pub parameter: String,
    /// 0-based argument index of the callback parameter
    pub position: usize,
    /// True when the callback is the last runtime argument
    pub is_last: bool,
    /// Type the deferred value resolves with
    pub result_type: String,
}

impl DetectedCallback {
    /// Index the runtime binder must splice at, if not the end of the argument list
    pub fn position_override(&self) -> Option<usize> {
        (!self.is_last).then_some(self.position)
    }
}

/// Outcome of classifying one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No recognized callback parameter; the function is left alone
    None,
    Callback(DetectedCallback),
}

/// Classify a function's callback usage
///
/// Returns `Err` with a `MalformedWrapperType` diagnostic when the callback
/// references the wrapper type with the wrong number of type arguments. The
/// caller must treat that function as unclassified.
pub fn classify(
    signature: &FunctionSignature,
    config: &TransformConfig,
    types: &TypeIndex,
) -> Result<Classification, Diagnostic> {
    let Some((param, position)) = signature
        .parameters
        .iter()
        .filter(|p| config.is_callback_param(&p.name))
        .find_map(|p| p.position.map(|position| (p, position)))
    else {
        return Ok(Classification::None);
    };

    let argument_count = signature
        .parameters
        .iter()
        .filter(|p| p.position.is_some())
        .count();
    let is_last = position + 1 == argument_count;
    let detected = |kind, result_type: String| {
        Classification::Callback(DetectedCallback {
            kind,
            parameter: param.name.clone(),
            position,
            is_last,
            result_type,
        })
    };

    if let TypeShape::Reference { name, args } = &param.shape {
        if *name == config.wrapper_type {
            return match args.as_slice() {
                [inner] => Ok(detected(CallbackKind::Typed, inner.clone())),
                _ => Err(Diagnostic::MalformedWrapperType {
                    function: signature.full_name(),
                    parameter: param.name.clone(),
                    type_text: param.type_text.clone().unwrap_or_default(),
                }),
            };
        }
    }

    if let Some(signatures) = types.call_signatures(&param.shape) {
        if let [only] = signatures.as_slice() {
            if let Some(first) = only.params.first() {
                let result_type = first
                    .type_text
                    .clone()
                    .unwrap_or_else(|| UNTYPED_RESULT_TYPE.to_string());
                return Ok(detected(CallbackKind::BareFunction, result_type));
            }
        }
    }

    Ok(detected(CallbackKind::Opaque, OPAQUE_RESULT_TYPE.to_string()))
}
