//! Role-typed workspace manager.
//!
//! Associates a closed set of array roles ([`ArrayRole`]) with named
//! arenas, controls when those arenas are entered and exited, and moves
//! arrays between arenas or out to the heap.
//!
//! # Components
//!
//! ```text
//! WorkspaceMgr<R>
//! ├── WorkspaceRegistry<R>   role → (name, config, scoped-out)
//! ├── ScopeStack             thread-local: open arenas + entry frames
//! │   └── WorkspaceScope / MultiScope guards (RAII exit)
//! ├── validate_array_location
//! ├── leverage_to / create / dup
//! └── BorrowedWorkspace      weak cross-thread allocation handle
//! ```
//!
//! # Example
//!
//! ```
//! use strata_core::{ArrayType, WorkspaceConfig};
//! use strata_workspace::WorkspaceMgr;
//!
//! let mgr = WorkspaceMgr::builder()
//!     .with(ArrayType::Input, "WS_INPUT", WorkspaceConfig::new(1 << 20))
//!     .default_no_workspace()
//!     .build();
//!
//! let scope = mgr.notify_scope_entered(ArrayType::Input).unwrap();
//! let x = mgr.create(ArrayType::Input, &[10, 10]).unwrap();
//! assert_eq!(x.owner_name(), Some("WS_INPUT"));
//!
//! // Scoped-out roles allocate on the heap, no scope needed.
//! let tmp = mgr.create(ArrayType::FfWorkingMem, &[5]).unwrap();
//! assert!(!tmp.is_attached());
//!
//! scope.close().unwrap();
//! assert!(!mgr.is_workspace_open(ArrayType::Input));
//! ```
//!
//! [`ArrayRole`]: strata_core::ArrayRole

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod borrow;
pub mod error;
mod leverage;
pub mod manager;
pub mod registry;
pub mod scope;
mod validate;

pub use borrow::BorrowedWorkspace;
pub use error::WorkspaceError;
pub use manager::{WorkspaceMgr, WorkspaceMgrBuilder};
pub use registry::{Target, WorkspaceBinding, WorkspaceRegistry};
pub use scope::{MultiScope, WorkspaceScope};
