// integration tests for the run command

use crate::common::*;
use tempfile::TempDir;

const NETWORK_SCENARIO: &str = r#"{
    // offline banner and the content it replaces
    name: "offline banner",
    environment: { online: false },
    elements: [
        { id: "notice", tag: "show-when", attributes: { "has-network": "offline" } },
        { id: "content", tag: "hide-when", attributes: { "has-network": "offline" } },
    ],
    steps: [
        { action: "set_online", value: true },
        { action: "disconnect", element: "notice" },
        { action: "set_online", value: false },
    ],
}"#;

#[test]
fn test_run_json_trace() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(dir.path(), "network.json5", NETWORK_SCENARIO);

    let output = run_show_when(&["--json", "run", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json = stdout_json(&output);
    let records = json["result"]["records"].as_array().unwrap();
    assert_eq!(json["result"]["name"], "offline banner");
    assert_eq!(records.len(), 4);

    let visible = |record: usize, id: &str| -> bool {
        records[record]["elements"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["id"] == id)
            .unwrap()["visible"]
            .as_bool()
            .unwrap()
    };

    assert!(visible(0, "notice"));
    assert!(!visible(0, "content"));
    assert!(!visible(1, "notice"));
    assert!(visible(1, "content"));
    assert_eq!(records[1]["events"][0]["type"], "online");

    // detached: no longer follows the network
    assert!(!visible(3, "notice"));
    assert!(!visible(3, "content"));
    assert_eq!(records[2]["elements"][0]["subscriptions"], serde_json::json!([]));
}

#[test]
fn test_run_text_trace() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(dir.path(), "network.json5", NETWORK_SCENARIO);

    let output = run_show_when(&["--no-json", "run", path.to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("[0] initial"));
    assert!(text.contains("[1] set_online online"));
    assert!(text.contains("~ online"));
    assert!(text.contains("(detached)"));
}

#[test]
fn test_run_from_env_var() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(dir.path(), "network.json5", NETWORK_SCENARIO);

    let output = run_show_when_with_env(
        &["--json", "run"],
        &[("SHOW_WHEN_SCENARIO", path.to_str().unwrap())],
    );
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["result"]["records"].as_array().unwrap().len(), 4);
}

#[test]
fn test_run_without_scenario() {
    let output = run_show_when(&["--no-json", "run"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("SHOW_WHEN_SCENARIO"));
}

#[test]
fn test_run_missing_file() {
    let output = run_show_when(&["--json", "run", "/nonexistent/scenario.json5"]);
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(stdout_json(&output)["error"]["code"], -32005);
}

#[test]
fn test_run_unknown_element() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(
        dir.path(),
        "bad.json5",
        r#"{ steps: [{ action: "connect", element: "ghost" }] }"#,
    );

    let output = run_show_when(&["--no-json", "run", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("unknown element 'ghost'"));
}

#[test]
fn test_run_media_swap() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(
        dir.path(),
        "media.json",
        r#"{
            "environment": { "viewport": { "width": 700 } },
            "elements": [
                { "id": "wide", "tag": "show-when", "attributes": { "has-media": "(min-width: 600px)" } }
            ],
            "steps": [
                { "action": "set_attribute", "element": "wide", "name": "has-media", "value": "(min-width: 900px)" },
                { "action": "resize", "width": 1000, "height": 700 }
            ]
        }"#,
    );

    let output = run_show_when(&["--json", "run", path.to_str().unwrap()]);
    let json = stdout_json(&output);
    let records = json["result"]["records"].as_array().unwrap();

    assert_eq!(records[1]["elements"][0]["visible"], false);
    assert_eq!(
        records[1]["elements"][0]["subscriptions"],
        serde_json::json!(["media:(min-width: 900px)"])
    );
    assert_eq!(records[2]["elements"][0]["visible"], true);
    assert_eq!(records[2]["events"][0]["type"], "media.change");
}
