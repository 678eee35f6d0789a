// shared utilities for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// path to the built show-when binary
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_show-when"))
}

/// run show-when and capture output
pub fn run_show_when(args: &[&str]) -> Output {
    run_show_when_with_env(args, &[])
}

/// run show-when with extra environment variables
pub fn run_show_when_with_env(args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(binary_path());
    cmd.args(args);
    cmd.env_remove("SHOW_WHEN_SCENARIO");
    cmd.env_remove("SHOW_WHEN_LOG");

    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    cmd.output().expect("Failed to run show-when")
}

/// write a scenario file into a test directory
pub fn write_scenario(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write scenario");
    path
}

/// parse a JSON-RPC line from stdout
pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({}): {}", e, stdout);
    })
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
