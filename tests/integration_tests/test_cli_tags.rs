// integration tests for tags and completions

use crate::common::*;

#[test]
fn test_tags_json() {
    let output = run_show_when(&["--json", "tags"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let tags = json["result"].as_array().unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t["tag"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["hide-when", "only-show", "show-when"]);

    let only_show = &tags[1];
    assert_eq!(only_show["live"], false);
    assert!(only_show["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|a| a != "when-network"));
}

#[test]
fn test_tags_text() {
    let output = run_show_when(&["--no-json", "tags"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("hide-when"));
    assert!(text.contains("polarity: inverted"));
    assert!(text.contains("has-network"));
}

#[test]
fn test_completions() {
    for shell in ["bash", "zsh", "fish"] {
        let output = run_show_when(&["completions", shell]);
        assert!(output.status.success(), "{} completions failed", shell);
        assert!(stdout(&output).contains("show-when"));
    }
}

#[test]
fn test_completions_unknown_shell() {
    let output = run_show_when(&["completions", "tcsh"]);
    assert!(!output.status.success());
}
