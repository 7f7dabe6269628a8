//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: morph error (missing input, bad dimensions)
//! - 11: I/O error (frame write, output directory)
//! - 12: input error (unreadable image, bad JSON params, bad grid size)
//! - 13: serialization error

use lumasort_core::LumaError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    /// A core error (missing target or source, bad dimensions).
    Morph(LumaError),
    /// An I/O error (frame write, directory creation).
    Io(String),
    /// A user input error (unreadable image, bad JSON params).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Morph(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Morph(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<LumaError> for CliError {
    fn from(e: LumaError) -> Self {
        match e {
            LumaError::Io(msg) => CliError::Io(msg),
            LumaError::EmptyImage(what) => CliError::Input(format!("empty {what} image")),
            other => CliError::Morph(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
