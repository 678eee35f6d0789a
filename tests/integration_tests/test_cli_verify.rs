// integration tests for the verify command

use crate::common::*;
use tempfile::TempDir;

#[test]
fn test_verify_valid_scenario() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(
        dir.path(),
        "ok.json5",
        r#"{
            elements: [{ id: "a", tag: "show-when", attributes: { "has-hash": "intro" } }],
            steps: [{ action: "set_hash", value: "intro" }],
        }"#,
    );

    let output = run_show_when(&["--no-json", "verify", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Scenario is valid"));

    let output = run_show_when(&["--json", "verify", path.to_str().unwrap()]);
    let json = stdout_json(&output);
    assert_eq!(json["result"]["valid"], true);
    assert_eq!(json["result"]["elements"], 1);
    assert_eq!(json["result"]["steps"], 1);
}

#[test]
fn test_verify_lists_problems() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(
        dir.path(),
        "bad.json5",
        r#"{
            elements: [
                { id: "a", tag: "only-show", attributes: { "when-network": "offline" } },
                { id: "b", tag: "show-when", attributes: { "has-network": "sometimes" } },
            ],
            steps: [{ action: "disconnect", element: "c" }],
        }"#,
    );

    let output = run_show_when(&["--no-json", "verify", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));

    let text = stdout(&output);
    assert!(text.contains("3 error(s)"), "stdout: {}", text);
    assert!(text.contains("'when-network' is not supported"));
    assert!(text.contains("must be 'online' or 'offline'"));
    assert!(text.contains("unknown element 'c'"));
}

#[test]
fn test_verify_json_error() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(
        dir.path(),
        "bad.json5",
        r#"{ elements: [{ id: "a", tag: "show-if" }] }"#,
    );

    let output = run_show_when(&["--json", "verify", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));

    let json = stdout_json(&output);
    assert_eq!(json["error"]["code"], -32005);
    assert_eq!(
        json["error"]["data"]["problems"],
        serde_json::json!(["elements[0]: unknown tag 'show-if'"])
    );
    assert_eq!(json["error"]["data"]["details"], path.display().to_string());
}

#[test]
fn test_verify_invalid_json5() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(dir.path(), "broken.json5", "{ elements: [ }");

    let output = run_show_when(&["--no-json", "verify", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("invalid JSON5"));
}
