//! End-to-end transformation tests over the workspace fixtures

use promisify_core::config::{self, ResolvedConfig};
use promisify_core::{transform_path_with_config, RunOutput, TransformError};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Config discovered next to the overwolf fixture (marks io.readTextFile read-only)
fn overwolf_config() -> ResolvedConfig {
    config::load_and_resolve(&fixture_path("overwolf"), None).unwrap()
}

fn run_overwolf() -> RunOutput {
    transform_path_with_config(&fixture_path("overwolf"), &overwolf_config()).unwrap()
}

fn emitted(run: &RunOutput) -> &str {
    &run.files[0].output
}

#[test]
fn test_fixture_config_is_discovered() {
    let config = overwolf_config();
    assert!(config.config_path.unwrap().ends_with("promisify.config.json"));
    assert!(config.transform.is_read_only("io.readTextFile"));
}

#[test]
fn test_typed_callback_in_place() {
    let run = run_overwolf();
    let out = emitted(&run);
    assert!(out.contains("    function list(pathId: string): Promise<FileEntry[]>;"));
    assert!(!out.contains("function list(pathId: string, callback"));
    assert!(run.manifest.deferred_functions().contains(&"files.list"));
}

#[test]
fn test_converted_doc_block() {
    let run = run_overwolf();
    let expected = "    /**\n     * Lists the entries of a folder.\n     * @param pathId The folder id.\n     * @returns A promise resolved with the result the callback would have received: The folder entries.\n     */\n    function list(pathId: string): Promise<FileEntry[]>;";
    assert!(emitted(&run).contains(expected));
}

#[test]
fn test_read_only_function_gets_alias() {
    let run = run_overwolf();
    let out = emitted(&run);

    // Original declaration untouched
    assert!(out.contains(
        "    /**\n     * Reads a text file.\n     * @param filePath The file to read.\n     * @param callback Called with the file content.\n     */\n    function readTextFile(filePath: string, callback: CallbackFunction<ReadFileResult>): void;"
    ));
    assert_eq!(out.matches("function readTextFileAsync(").count(), 1);
    assert!(out.contains("    function readTextFileAsync(filePath: string): Promise<ReadFileResult>;\n}"));

    assert!(run
        .manifest
        .deferred_functions()
        .contains(&"io.readTextFileAsync"));
    assert!(!run.manifest.deferred_functions().contains(&"io.readTextFile"));
    assert_eq!(run.manifest.aliased_functions(), vec!["io.readTextFile"]);
}

#[test]
fn test_interior_callback_position_override() {
    let run = run_overwolf();
    assert!(emitted(&run).contains("    function set(name: string, value: string): Promise<SetResult>;"));
    assert_eq!(
        run.manifest.callback_position_override(),
        vec![("games.events.set", 1)]
    );
}

#[test]
fn test_opaque_callback() {
    let run = run_overwolf();
    assert!(emitted(&run).contains("    function track(): Promise<void>;"));
    assert_eq!(run.manifest.opaque_callback_functions(), vec!["utils.track"]);
}

#[test]
fn test_alias_resolved_bare_function_callback() {
    let run = run_overwolf();
    assert!(emitted(&run).contains("    function onEvent(): Promise<TrackEvent>;"));
    let diagnostics: Vec<&str> = run
        .report
        .diagnostics
        .iter()
        .map(|d| d.code.as_str())
        .collect();
    assert_eq!(diagnostics, vec!["missing-documentation"]);
    assert!(run.report.diagnostics[0].message.contains("utils.onEvent"));
}

#[test]
fn test_untransformed_text_is_byte_identical() {
    let source = std::fs::read_to_string(fixture_path("overwolf/index.d.ts")).unwrap();
    let run = run_overwolf();
    let out = emitted(&run);

    let exist = "    /**\n     * Checks whether a file exists.\n     * @param filePath The path to check.\n     */\n    function exist(filePath: string): boolean;\n";
    assert!(source.contains(exist));
    assert!(out.contains(exist));

    // Everything before the first transformed namespace is untouched, except the const enum
    let header_end = source.find("    const enum").unwrap();
    assert_eq!(&out[..header_end], &source[..header_end]);
    assert!(out.contains("    enum eEncoding {"));
}

#[test]
fn test_manifest_order_and_uniqueness() {
    let run = run_overwolf();
    let deferred = run.manifest.deferred_functions();
    assert_eq!(
        deferred,
        vec![
            "io.readTextFileAsync",
            "files.list",
            "games.events.set",
            "utils.track",
            "utils.onEvent",
        ]
    );
    let mut unique = deferred.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), deferred.len());
}

#[test]
fn test_binder_embeds_manifest() {
    let run = run_overwolf();
    let binder = run
        .artifacts
        .iter()
        .find(|a| a.relative_path == PathBuf::from("promisify.js"))
        .unwrap();
    assert!(binder
        .contents
        .contains(r#"const CALLBACK_POSITION_OVERRIDE = Object.freeze({"games.events.set":1});"#));
    assert!(binder
        .contents
        .contains(r#"const ALIASED_FUNCTIONS = Object.freeze(["io.readTextFile"]);"#));
    assert!(binder.contents.contains("export function promisify() {"));
}

#[test]
fn test_second_pass_is_a_no_op_without_read_only_functions() {
    let config = ResolvedConfig::defaults().unwrap();
    let first = transform_path_with_config(&fixture_path("overwolf/index.d.ts"), &config).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("index.d.ts");
    std::fs::write(&path, &first.files[0].output).unwrap();

    let second = transform_path_with_config(&path, &config).unwrap();
    assert_eq!(second.files[0].output, first.files[0].output);
    assert!(second.manifest.is_empty());
}

#[test]
fn test_report_counts() {
    let run = run_overwolf();
    assert_eq!(run.report.files, vec!["index.d.ts"]);
    assert_eq!(run.report.function_count, 6);
    assert_eq!(run.report.transforms.len(), 5);
    let aliased = run
        .report
        .transforms
        .iter()
        .filter(|t| t.kind == "aliased")
        .count();
    assert_eq!(aliased, 1);
}

#[test]
fn test_root_namespace_function_uses_bare_name() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("root.d.ts");
    std::fs::write(
        &path,
        "declare namespace overwolf {\n    function getVersion(callback: CallbackFunction<string>): void;\n}\n",
    )
    .unwrap();
    let run = transform_path_with_config(&path, &ResolvedConfig::defaults().unwrap()).unwrap();
    assert_eq!(run.manifest.deferred_functions(), vec!["getVersion"]);
}

#[test]
fn test_parse_failure_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.d.ts");
    std::fs::write(&path, "declare function f(x: number").unwrap();
    let err = transform_path_with_config(&path, &ResolvedConfig::defaults().unwrap()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransformError>(),
        Some(TransformError::Parse { .. })
    ));
}
