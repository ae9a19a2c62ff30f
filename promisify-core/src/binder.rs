//! Runtime binder generation
//!
//! Produces the JavaScript module shipped next to the rewritten declarations.
//! The manifest tables are embedded as frozen literals and handed to an
//! internal `bind(root, manifest)`; the module exports a single
//! `promisify()` activation function.

use crate::config::BinderOptions;
use crate::manifest::Manifest;

/// Render the binder module for a manifest
pub fn render_binder(
    manifest: &Manifest,
    options: &BinderOptions,
    alias_suffix: &str,
) -> serde_json::Result<String> {
    let tables = manifest.tables();
    Ok(format!(
        r#"// Generated by promisify-dts. Do not edit.

const DEFERRED_FUNCTIONS = Object.freeze({deferred});
const ALIASED_FUNCTIONS = Object.freeze({aliased});
const CALLBACK_POSITION_OVERRIDE = Object.freeze({positions});
const OPAQUE_CALLBACK_FUNCTIONS = Object.freeze({opaque});

const MANIFEST = Object.freeze({{
  deferredFunctions: DEFERRED_FUNCTIONS,
  aliasedFunctions: ALIASED_FUNCTIONS,
  callbackPositionOverride: CALLBACK_POSITION_OVERRIDE,
  opaqueCallbackFunctions: OPAQUE_CALLBACK_FUNCTIONS,
}});

const GLOBAL_BINDING = {global};
const ALIAS_SUFFIX = {suffix};
const SUCCESS_FIELD = {success};
const ERROR_FIELD = {error};
const FALLBACK_ERROR = {fallback};
{runtime}
export function promisify() {{
  const root = resolvePath(globalThis, GLOBAL_BINDING.split('.'));
  if (root === undefined) {{
    return;
  }}
  bind(root, MANIFEST);
}}
"#,
        deferred = serde_json::to_string(&tables.deferred_functions)?,
        aliased = serde_json::to_string(&tables.aliased_functions)?,
        positions = serde_json::to_string(&tables.callback_position_override)?,
        opaque = serde_json::to_string(&tables.opaque_callback_functions)?,
        global = serde_json::to_string(&options.global_binding)?,
        suffix = serde_json::to_string(alias_suffix)?,
        success = serde_json::to_string(&options.success_field)?,
        error = serde_json::to_string(&options.error_field)?,
        fallback = serde_json::to_string(&options.fallback_error_message)?,
        runtime = runtime_javascript(),
    ))
}

/// Render the companion declaration file for the binder module
pub fn render_binder_declaration() -> String {
    "// Generated by promisify-dts. Do not edit.\n\n/**\n * Installs the promise-returning wrappers on the live API object.\n * Call once before using any wrapped function.\n */\nexport declare function promisify(): void;\n".to_string()
}

/// Interception logic shared by every generated binder
fn runtime_javascript() -> &'static str {
    r#"
function resolvePath(start, segments) {
  let target = start;
  for (const segment of segments) {
    if (target === null || target === undefined) {
      return undefined;
    }
    target = target[segment];
  }
  if (target === null || (typeof target !== 'object' && typeof target !== 'function')) {
    return undefined;
  }
  return target;
}

function isWritable(target, name) {
  const descriptor = Object.getOwnPropertyDescriptor(target, name);
  return Boolean(descriptor && (descriptor.writable || descriptor.set));
}

function settle(payload, opaque, resolve, reject) {
  if (opaque) {
    resolve(payload);
    return;
  }
  if (payload && payload[SUCCESS_FIELD]) {
    resolve(payload);
    return;
  }
  const message = payload ? payload[ERROR_FIELD] : undefined;
  reject(new Error(message ? String(message) : FALLBACK_ERROR));
}

function wrap(parent, original, position, opaque) {
  return function (...args) {
    return new Promise((resolve, reject) => {
      let settled = false;
      const callback = (payload) => {
        if (settled) {
          return;
        }
        settled = true;
        settle(payload, opaque, resolve, reject);
      };
      const callArgs = args.slice();
      const index = position === undefined ? callArgs.length : position;
      while (callArgs.length < index) {
        callArgs.push(undefined);
      }
      callArgs.splice(index, 0, callback);
      try {
        original.apply(parent, callArgs);
      } catch (error) {
        if (!settled) {
          settled = true;
          reject(error);
        }
      }
    });
  };
}

function bind(root, manifest) {
  const aliased = new Set(manifest.aliasedFunctions);
  const opaque = new Set(manifest.opaqueCallbackFunctions);
  const positions = manifest.callbackPositionOverride;

  for (const fullName of manifest.deferredFunctions) {
    const path = fullName.split('.');
    const exposedName = path.pop();
    const parent = resolvePath(root, path);
    if (parent === undefined) {
      continue;
    }

    let invokeName = exposedName;
    let isAlias = false;
    if (exposedName.endsWith(ALIAS_SUFFIX)) {
      const originalName = exposedName.slice(0, -ALIAS_SUFFIX.length);
      if (aliased.has(path.concat(originalName).join('.'))) {
        invokeName = originalName;
        isAlias = true;
      }
    }

    const original = parent[invokeName];
    if (typeof original !== 'function') {
      continue;
    }
    if (!isAlias && !isWritable(parent, exposedName)) {
      continue;
    }

    const position = Object.prototype.hasOwnProperty.call(positions, fullName)
      ? positions[fullName]
      : undefined;
    parent[exposedName] = wrap(parent, original, position, opaque.has(fullName));
  }
}
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CallbackKind;
    use crate::manifest::{ManifestBuilder, ManifestEntry};
    use crate::rewrite::TransformKind;

    fn sample_manifest() -> Manifest {
        let mut builder = ManifestBuilder::new();
        let entries = [
            ("files.list", "files.list", TransformKind::InPlace, CallbackKind::Typed, None),
            (
                "io.readTextFileAsync",
                "io.readTextFile",
                TransformKind::Aliased,
                CallbackKind::Typed,
                None,
            ),
            ("events.set", "events.set", TransformKind::InPlace, CallbackKind::Typed, Some(1)),
            ("utils.track", "utils.track", TransformKind::InPlace, CallbackKind::Opaque, None),
        ];
        for (exposed, original, kind, callback, position) in entries {
            builder
                .register(ManifestEntry {
                    exposed_name: exposed.to_string(),
                    original_name: original.to_string(),
                    kind,
                    callback,
                    result_type: "void".to_string(),
                    position_override: position,
                })
                .unwrap();
        }
        builder.finish()
    }

    #[test]
    fn test_tables_are_embedded_as_literals() {
        let js = render_binder(&sample_manifest(), &BinderOptions::default(), "Async").unwrap();
        assert!(js.contains(
            r#"const DEFERRED_FUNCTIONS = Object.freeze(["files.list","io.readTextFileAsync","events.set","utils.track"]);"#
        ));
        assert!(js.contains(r#"const ALIASED_FUNCTIONS = Object.freeze(["io.readTextFile"]);"#));
        assert!(js.contains(r#"const CALLBACK_POSITION_OVERRIDE = Object.freeze({"events.set":1});"#));
        assert!(js.contains(r#"const OPAQUE_CALLBACK_FUNCTIONS = Object.freeze(["utils.track"]);"#));
    }

    #[test]
    fn test_single_exported_activation_function() {
        let js = render_binder(&sample_manifest(), &BinderOptions::default(), "Async").unwrap();
        assert_eq!(js.matches("export ").count(), 1);
        assert!(js.contains("export function promisify() {"));
        assert!(js.contains("bind(root, MANIFEST);"));
    }

    #[test]
    fn test_options_are_json_escaped() {
        let options = BinderOptions {
            fallback_error_message: "Call \"failed\"".to_string(),
            ..BinderOptions::default()
        };
        let js = render_binder(&Manifest::default(), &options, "Promise").unwrap();
        assert!(js.contains(r#"const FALLBACK_ERROR = "Call \"failed\"";"#));
        assert!(js.contains(r#"const ALIAS_SUFFIX = "Promise";"#));
        assert!(js.contains(r#"const GLOBAL_BINDING = "overwolf";"#));
        assert!(js.contains("Object.freeze([])"));
    }

    #[test]
    fn test_runtime_settles_once() {
        let js = runtime_javascript();
        assert!(js.contains("if (settled) {"));
        assert!(js.contains("callArgs.splice(index, 0, callback);"));
        assert!(js.contains("original.apply(parent, callArgs);"));
    }

    #[test]
    fn test_declaration_exports_promisify() {
        let dts = render_binder_declaration();
        assert!(dts.contains("export declare function promisify(): void;"));
    }
}
