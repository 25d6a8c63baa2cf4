//! Segmented bump arenas and array handles for Strata workspaces.
//!
//! This crate is the allocation collaborator behind the workspace manager.
//! It knows nothing about roles or scopes: it provides named arenas that
//! can be cycled and reset, and arrays that remember which arena (and which
//! generation of it) their storage came from.
//!
//! # Architecture
//!
//! ```text
//! Workspace (named arena, Arc-shared)
//! ├── SegmentList → Segment[] (bump-allocated Vec<f32>)
//! ├── generation (bumped on every reset)
//! └── cycle bookkeeping (begin_cycle / end_cycle, reuse policy)
//!
//! NdArray
//! ├── Detached(Vec<f32>)
//! └── Attached { Arc<Workspace>, BufferHandle }
//! ```
//!
//! # Safety
//!
//! All allocations are `Vec<f32>` slices. "Uninitialized" allocation means
//! the contents are unspecified (stale values from a previous cycle), never
//! uninitialized memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod error;
pub mod handle;
pub mod segment;
pub mod workspace;

pub use array::NdArray;
pub use error::ArenaError;
pub use handle::BufferHandle;
pub use workspace::{AllocInit, SharedWorkspace, Workspace};
