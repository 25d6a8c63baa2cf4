//! Core types and traits for the Strata workspace manager.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena and the workspace manager:
//! array roles, workspace configuration, array layout, and arena IDs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod id;
pub mod layout;
pub mod role;

pub use config::{GrowthPolicy, OverAllocationPolicy, ReusePolicy, WorkspaceConfig};
pub use error::ConfigError;
pub use id::ArenaId;
pub use layout::{ArrayOrder, Shape};
pub use role::{ArrayRole, ArrayType};
