//! Error types for the workspace manager.
//!
//! Every variant names the role involved, and where relevant the expected
//! and actual arena, so misuse can be diagnosed from the message alone.

use std::error::Error;
use std::fmt;

use strata_arena::ArenaError;

/// Errors from workspace manager operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceError {
    /// The role has no binding, or its binding lacks a required part.
    NotConfigured {
        /// The role.
        role: &'static str,
        /// What is missing: `"configuration"` or `"workspace name"`.
        missing: &'static str,
    },
    /// The operation violates an open/closed precondition.
    IllegalState {
        /// The role.
        role: &'static str,
        /// Description of the violated precondition.
        message: String,
    },
    /// The array lives somewhere other than the role's arena and migration
    /// was not allowed.
    InvalidLocation {
        /// The role.
        role: &'static str,
        /// Where the array should live.
        expected: String,
        /// Where the array actually lives.
        actual: String,
    },
    /// The array is detached but the role requires arena-backed storage.
    UnexpectedDetached {
        /// The role.
        role: &'static str,
        /// The workspace the array should live in.
        expected: String,
    },
    /// The role's arena cannot satisfy an allocation under its policy.
    ArenaExhausted {
        /// The role.
        role: &'static str,
        /// The arena's workspace name.
        workspace: String,
        /// Number of bytes requested.
        requested: usize,
        /// Capacity of the arena in bytes.
        capacity: usize,
    },
    /// Any other arena failure: stale buffers, bad shapes, bad configs.
    Arena {
        /// The role.
        role: &'static str,
        /// The underlying arena error.
        source: ArenaError,
    },
}

impl WorkspaceError {
    /// Attribute an arena failure in `workspace` to `role`.
    ///
    /// Capacity failures become [`WorkspaceError::ArenaExhausted`].
    pub fn from_arena(role: &'static str, workspace: &str, err: ArenaError) -> Self {
        match err {
            ArenaError::CapacityExceeded {
                requested,
                capacity,
            } => Self::ArenaExhausted {
                role,
                workspace: workspace.to_string(),
                requested,
                capacity,
            },
            source => Self::Arena { role, source },
        }
    }

    pub(crate) fn illegal_state(role: &'static str, message: impl Into<String>) -> Self {
        Self::IllegalState {
            role,
            message: message.into(),
        }
    }

    /// The role the error concerns.
    pub fn role(&self) -> &'static str {
        match self {
            Self::NotConfigured { role, .. }
            | Self::IllegalState { role, .. }
            | Self::InvalidLocation { role, .. }
            | Self::UnexpectedDetached { role, .. }
            | Self::ArenaExhausted { role, .. }
            | Self::Arena { role, .. } => role,
        }
    }
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { role, missing } => {
                write!(f, "no {missing} set for array role {role}")
            }
            Self::IllegalState { role, message } => {
                write!(f, "illegal workspace state for array role {role}: {message}")
            }
            Self::InvalidLocation {
                role,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "array of role {role} should be in {expected} but is in {actual}"
                )
            }
            Self::UnexpectedDetached { role, expected } => {
                write!(
                    f,
                    "array of role {role} is detached but should be in workspace '{expected}'"
                )
            }
            Self::ArenaExhausted {
                role,
                workspace,
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "workspace '{workspace}' for array role {role} exhausted: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::Arena { role, source } => write!(f, "array role {role}: {source}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena { source, .. } => Some(source),
            _ => None,
        }
    }
}
