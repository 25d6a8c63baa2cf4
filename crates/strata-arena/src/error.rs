//! Errors raised by workspace arenas.

use std::error::Error;
use std::fmt;

use strata_core::ConfigError;

/// Failure of an arena allocation or buffer access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The arena cannot satisfy an allocation under its growth policy.
    CapacityExceeded {
        /// Size of the failed request in bytes.
        requested: usize,
        /// Arena capacity in bytes at the time of the request.
        capacity: usize,
    },
    /// A buffer from a generation that has since been reset.
    StaleHandle {
        /// Name of the arena the buffer was allocated in.
        workspace: String,
        /// Generation recorded when the buffer was allocated.
        handle_generation: u32,
        /// The arena's current generation.
        current_generation: u32,
    },
    /// A shape that cannot describe the supplied or requested buffer.
    InvalidShape {
        /// Description of the problem.
        reason: String,
    },
    /// The arena's configuration failed validation.
    InvalidConfig(ConfigError),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena full: cannot fit {requested} bytes within {capacity} bytes"
                )
            }
            Self::StaleHandle {
                workspace,
                handle_generation,
                current_generation,
            } => {
                write!(
                    f,
                    "stale buffer in workspace '{workspace}': generation {handle_generation}, current {current_generation}"
                )
            }
            Self::InvalidShape { reason } => write!(f, "invalid shape: {reason}"),
            Self::InvalidConfig(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ArenaError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}
