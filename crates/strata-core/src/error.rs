//! Error types for workspace configuration.

use std::error::Error;
use std::fmt;

/// Errors from validating a [`WorkspaceConfig`](crate::WorkspaceConfig).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration field is out of range or inconsistent with another.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid workspace config: {reason}"),
        }
    }
}

impl Error for ConfigError {}
