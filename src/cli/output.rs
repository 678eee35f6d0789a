//! output formatting utilities for scriptable CLI output
//!
//! uses JSON-RPC 2.0 format for machine-readable output:
//! - success: {"jsonrpc": "2.0", "result": {...}, "id": null}
//! - error: {"jsonrpc": "2.0", "error": {"code": N, "message": "...", "data": {...}}, "id": null}

use serde::Serialize;
use std::io::IsTerminal;

use crate::conditions::{Combinator, PredicateOutcome};
use crate::element::Polarity;

/// JSON-RPC version constant
const JSONRPC_VERSION: &str = "2.0";

/// output mode determines how results are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// human-readable text output
    Text,
    /// machine-readable JSON-RPC 2.0 output
    Json,
    /// no output on success (errors still go to stderr)
    Quiet,
}

impl OutputMode {
    /// determine output mode from CLI flags and environment
    ///
    /// priority: quiet > json > no_json > auto-detect
    pub fn from_flags(json: bool, no_json: bool, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        if json {
            return Self::Json;
        }
        if no_json {
            return Self::Text;
        }
        // auto-detect: JSON when stdout is not a TTY (piped)
        if !std::io::stdout().is_terminal() {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// JSON-RPC 2.0 success response
#[derive(Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub result: T,
    /// null for CLI responses (no request id)
    pub id: Option<String>,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 error response
#[derive(Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Serialize)]
pub struct RpcError {
    /// exit code offset by -32000
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// additional error data
#[derive(Serialize)]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonRpcError {
    /// application errors use the -32000 to -32099 range
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: RpcError {
                code: to_jsonrpc_code(code),
                message: message.into(),
                data: None,
            },
            id: None,
        }
    }

    pub fn with_problems(code: i32, message: impl Into<String>, problems: Vec<String>) -> Self {
        let mut error = Self::new(code, message);
        if !problems.is_empty() {
            error.error.data = Some(ErrorData {
                problems: Some(problems),
                details: None,
            });
        }
        error
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let data = self.error.data.get_or_insert(ErrorData {
            problems: None,
            details: None,
        });
        data.details = Some(details.into());
        self
    }
}

/// convert exit code to JSON-RPC error code
fn to_jsonrpc_code(code: i32) -> i32 {
    -32000 - code
}

// ============================================================================
// Result data structures for different commands
// ============================================================================

/// result data for eval
#[derive(Serialize)]
pub struct EvalData {
    pub tag: String,
    pub visible: bool,
    pub matched: bool,
    pub polarity: Polarity,
    pub combinator: Combinator,
    pub configuration: String,
    /// outcomes of configured predicates only
    pub predicates: Vec<PredicateOutcome>,
}

/// result data for one tag definition
#[derive(Serialize)]
pub struct TagData {
    pub tag: String,
    pub polarity: Polarity,
    pub live: bool,
    pub attributes: Vec<String>,
    pub description: &'static str,
}

/// result data for verify
#[derive(Serialize)]
pub struct VerifyData {
    pub path: String,
    pub valid: bool,
    pub elements: usize,
    pub steps: usize,
}

/// print JSON-RPC success response to stdout
pub fn print_json<T: Serialize>(data: &T) {
    let response = JsonRpcResponse::new(data);
    if let Ok(json) = serde_json::to_string(&response) {
        println!("{}", json);
    }
}

/// print JSON-RPC error to stdout
pub fn print_json_error(code: i32, message: &str) {
    let error = JsonRpcError::new(code, message);
    if let Ok(json) = serde_json::to_string(&error) {
        println!("{}", json);
    }
}

/// print JSON-RPC error listing problems found in `details`
pub fn print_json_error_with_problems(code: i32, message: &str, problems: Vec<String>, details: &str) {
    let error = JsonRpcError::with_problems(code, message, problems).with_details(details);
    if let Ok(json) = serde_json::to_string(&error) {
        println!("{}", json);
    }
}
