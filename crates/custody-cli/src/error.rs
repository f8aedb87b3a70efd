//! CLI error types.

use std::fmt;

use custody_core::CustodyError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The engine rejected the operation.
    Custody(CustodyError),
    /// State file missing, already present, or unreadable.
    State(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custody(e) => write!(f, "{e}"),
            Self::State(msg) => write!(f, "state file error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Custody(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CustodyError> for CliError {
    fn from(err: CustodyError) -> Self {
        Self::Custody(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::State(err.to_string())
    }
}
