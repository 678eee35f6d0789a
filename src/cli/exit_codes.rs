//! exit codes for show-when commands
//!
//! these follow Unix conventions where 0 = success and non-zero = error
//! specific codes help scripts distinguish between failure types

#![allow(dead_code)]

/// command completed successfully
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// invalid command-line arguments
pub const INVALID_ARGS: i32 = 4;

/// scenario file missing, unparsable, invalid or failed to run
pub const SCENARIO_ERROR: i32 = 5;
