// integration tests for the eval command

use crate::common::*;

#[test]
fn test_eval_param_matches() {
    let output = run_show_when(&[
        "--no-json",
        "eval",
        "--attr",
        "has-param=mode=dark",
        "--url",
        "/?mode=dark&x=1",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("show-when visible"), "stdout: {}", text);
    assert!(text.contains("param    matched"), "stdout: {}", text);
}

#[test]
fn test_eval_param_value_mismatch() {
    let output = run_show_when(&[
        "--json",
        "eval",
        "--attr",
        "has-param=mode=dark",
        "--url",
        "/?mode=light",
    ]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["jsonrpc"], "2.0");
    assert_eq!(json["result"]["visible"], false);
    assert_eq!(json["result"]["predicates"][0]["kind"], "param");
    assert_eq!(json["result"]["predicates"][0]["outcome"], "unmatched");
}

#[test]
fn test_eval_hash() {
    let matched = run_show_when(&["--json", "eval", "-a", "has-hash=section2", "--url", "/#section2"]);
    assert_eq!(stdout_json(&matched)["result"]["visible"], true);

    let other = run_show_when(&["--json", "eval", "-a", "has-hash=section2", "--url", "/#section3"]);
    assert_eq!(stdout_json(&other)["result"]["visible"], false);

    let none = run_show_when(&["--json", "eval", "-a", "has-hash=section2"]);
    assert_eq!(stdout_json(&none)["result"]["visible"], false);
}

#[test]
fn test_eval_empty_configuration() {
    let all = run_show_when(&["--json", "eval"]);
    assert_eq!(stdout_json(&all)["result"]["visible"], true);
    assert_eq!(stdout_json(&all)["result"]["configuration"], "all()");

    let any = run_show_when(&["--json", "eval", "--any"]);
    assert_eq!(stdout_json(&any)["result"]["visible"], false);
    assert_eq!(stdout_json(&any)["result"]["combinator"], "any");
}

#[test]
fn test_eval_hide_when_offline() {
    let output = run_show_when(&[
        "--json",
        "eval",
        "--tag",
        "hide-when",
        "-a",
        "has-network=offline",
        "--offline",
    ]);

    let json = stdout_json(&output);
    assert_eq!(json["result"]["matched"], true);
    assert_eq!(json["result"]["visible"], false);
    assert_eq!(json["result"]["polarity"], "inverted");
}

#[test]
fn test_eval_media_and_support() {
    let output = run_show_when(&[
        "--json",
        "eval",
        "-a",
        "has-media=(min-width: 600px) and (prefers-color-scheme: dark)",
        "-a",
        "has-support=(display: grid)",
        "--width",
        "800",
        "--color-scheme",
        "dark",
        "--supports",
        "display: grid",
    ]);

    let json = stdout_json(&output);
    assert_eq!(json["result"]["visible"], true);
    assert_eq!(json["result"]["predicates"].as_array().unwrap().len(), 2);

    let narrow = run_show_when(&[
        "--json",
        "eval",
        "-a",
        "has-media=(min-width: 600px)",
        "--width",
        "400",
    ]);
    assert_eq!(stdout_json(&narrow)["result"]["visible"], false);
}

#[test]
fn test_eval_only_show_ignores_network() {
    let output = run_show_when(&[
        "--json",
        "eval",
        "--tag",
        "only-show",
        "-a",
        "when-network=offline",
    ]);

    let json = stdout_json(&output);
    assert_eq!(json["result"]["visible"], true);
    assert_eq!(json["result"]["predicates"].as_array().unwrap().len(), 0);
}

#[test]
fn test_eval_unknown_tag() {
    let output = run_show_when(&["--json", "eval", "--tag", "show-if"]);

    assert_eq!(output.status.code(), Some(4));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["code"], -32004);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not defined"));
}

#[test]
fn test_eval_invalid_color_scheme() {
    let output = run_show_when(&["--no-json", "eval", "--color-scheme", "sepia"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("invalid color scheme"));
}

#[test]
fn test_eval_quiet() {
    let output = run_show_when(&["--quiet", "eval"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}
