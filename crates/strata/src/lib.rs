//! Strata: role-typed workspace management for arena-backed arrays.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let mgr = WorkspaceMgr::builder()
//!     .with(ArrayType::Input, "WS_INPUT", WorkspaceConfig::new(1 << 20))
//!     .with(ArrayType::Activations, "WS_ACT", WorkspaceConfig::new(1 << 20))
//!     .default_no_workspace()
//!     .build();
//!
//! let scopes = mgr
//!     .notify_scope_entered_all(&[ArrayType::Input, ArrayType::Activations])
//!     .unwrap();
//! let x = mgr.create(ArrayType::Input, &[4, 4]).unwrap();
//! let y = mgr.leverage_to(ArrayType::Activations, x).unwrap();
//! assert_eq!(y.owner_name(), Some("WS_ACT"));
//!
//! let y = mgr
//!     .validate_array_location(ArrayType::Activations, y, false, true)
//!     .unwrap();
//! assert!(y.is_valid());
//! scopes.close().unwrap();
//!
//! // The arena was reset when its outermost scope closed.
//! assert!(!y.is_valid());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | Roles, configuration, layout, IDs |
//! | [`arena`] | `strata-arena` | Segmented arenas, `NdArray`, buffer handles |
//! | [`workspace`] | `strata-workspace` | `WorkspaceMgr`, scope guards, borrowing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Roles, workspace configuration, and array layout (`strata-core`).
///
/// Implement [`types::ArrayRole`] for your own role enum, or use the
/// built-in [`types::ArrayType`].
pub use strata_core as types;

/// Arena storage and arrays (`strata-arena`).
///
/// [`arena::Workspace`] is one named arena; [`arena::NdArray`] is either
/// detached (heap) or attached to an arena buffer.
pub use strata_arena as arena;

/// The workspace manager (`strata-workspace`).
///
/// [`workspace::WorkspaceMgr`] maps roles to arenas and controls scope
/// entry, validation, and leverage.
pub use strata_workspace as workspace;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use strata_core::{
        ArrayOrder, ArrayRole, ArrayType, GrowthPolicy, OverAllocationPolicy, ReusePolicy,
        WorkspaceConfig,
    };

    // Arrays
    pub use strata_arena::NdArray;

    // Errors
    pub use strata_arena::ArenaError;
    pub use strata_core::ConfigError;
    pub use strata_workspace::WorkspaceError;

    // Manager
    pub use strata_workspace::{BorrowedWorkspace, MultiScope, WorkspaceMgr, WorkspaceScope};
}
