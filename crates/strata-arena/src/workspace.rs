//! Named, cycle-tracked arenas.
//!
//! A [`Workspace`] is the allocation target behind a role. It wraps a
//! [`SegmentList`] with the bookkeeping the scope manager drives:
//!
//! - **Cycles.** [`Workspace::begin_cycle`] / [`Workspace::end_cycle`]
//!   bracket the outermost scope. `end_cycle` applies the reuse policy.
//! - **Generations.** Every reset bumps the generation. Buffers remember
//!   the generation they were allocated in, so reading a buffer after its
//!   storage was recycled fails with [`ArenaError::StaleHandle`] instead of
//!   returning another array's data.
//!
//! Workspaces are shared as `Arc<Workspace>`: arrays keep their arena alive
//! and borrowed handles reach it from other threads. State sits behind a
//! mutex, uncontended in the normal single-owner case.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::layout::{element_count, reorder};
use strata_core::{ArenaId, ArrayOrder, ReusePolicy, WorkspaceConfig};

use crate::array::NdArray;
use crate::error::ArenaError;
use crate::handle::BufferHandle;
use crate::segment::SegmentList;

/// Shared handle to a workspace arena.
pub type SharedWorkspace = Arc<Workspace>;

/// Initial contents of a new allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocInit {
    /// Zero-filled.
    Zeroed,
    /// Unspecified: may hold data from a previous cycle.
    Uninitialized,
}

/// A named arena that arrays are bump-allocated from.
pub struct Workspace {
    id: ArenaId,
    name: String,
    config: WorkspaceConfig,
    state: Mutex<ArenaState>,
}

struct ArenaState {
    segments: SegmentList,
    /// Incremented on every reset.
    generation: u32,
    /// Completed outermost cycles.
    cycles: u64,
    /// Completed cycles since the last reset.
    cycles_since_reset: u32,
    /// Whether a cycle is in progress.
    active: bool,
}

impl ArenaState {
    fn reset(&mut self) {
        self.segments.reset();
        self.generation = self.generation.wrapping_add(1);
        self.cycles_since_reset = 0;
    }
}

impl Workspace {
    /// Create a new, inactive arena.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if `config` fails validation.
    pub fn new(name: impl Into<String>, config: WorkspaceConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let name = name.into();
        let id = ArenaId::next();
        tracing::debug!(workspace = %name, arena = %id, initial_bytes = config.initial_size_bytes, "created arena");
        Ok(Self {
            id,
            state: Mutex::new(ArenaState {
                segments: SegmentList::new(&config),
                generation: 0,
                cycles: 0,
                cycles_since_reset: 0,
                active: false,
            }),
            name,
            config,
        })
    }

    /// Wrap this arena in an `Arc` for sharing.
    pub fn into_shared(self) -> SharedWorkspace {
        Arc::new(self)
    }

    /// Process-unique identity of this arena.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// The workspace name this arena was opened under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration the arena was created with.
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Mark the start of an outermost scope.
    pub fn begin_cycle(&self) {
        self.state.lock().active = true;
    }

    /// Mark the end of an outermost scope and apply the reuse policy.
    ///
    /// Returns `true` if the arena was reset.
    pub fn end_cycle(&self) -> bool {
        let mut state = self.state.lock();
        state.active = false;
        state.cycles += 1;
        state.cycles_since_reset = state.cycles_since_reset.saturating_add(1);
        let due = self.config.reuse == ReusePolicy::ResetOnExit
            && state.cycles_since_reset >= self.config.cycles_before_reset;
        if due {
            state.reset();
            tracing::debug!(workspace = %self.name, generation = state.generation, "arena reset at end of cycle");
        }
        due
    }

    /// Recycle all storage now, invalidating every outstanding buffer.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.reset();
        tracing::debug!(workspace = %self.name, generation = state.generation, "arena reset");
    }

    /// Whether a cycle is currently in progress.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Current generation.
    pub fn generation(&self) -> u32 {
        self.state.lock().generation
    }

    /// Number of completed cycles.
    pub fn cycle_count(&self) -> u64 {
        self.state.lock().cycles
    }

    /// Bytes currently allocated.
    pub fn used_bytes(&self) -> usize {
        self.state.lock().segments.total_used() * std::mem::size_of::<f32>()
    }

    /// Total capacity across all segments in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.state.lock().segments.capacity_bytes()
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.state.lock().segments.segment_count()
    }

    /// Allocate an array of `shape` in this arena.
    pub fn allocate(
        self: &Arc<Self>,
        shape: &[usize],
        order: ArrayOrder,
        init: AllocInit,
    ) -> Result<NdArray, ArenaError> {
        let len = buffer_len(shape)?;
        let handle = {
            let mut state = self.state.lock();
            let (segment, offset) = state.segments.alloc(len, init == AllocInit::Zeroed)?;
            BufferHandle::new(state.generation, segment, offset, len)
        };
        tracing::trace!(workspace = %self.name, %handle, "allocated");
        Ok(NdArray::attached(shape, order, Arc::clone(self), handle))
    }

    /// Allocate an array of `shape` in `order`, filled from `src` laid out in `src_order`.
    ///
    /// Logical content is preserved when the orders differ.
    pub fn allocate_copy(
        self: &Arc<Self>,
        shape: &[usize],
        order: ArrayOrder,
        src: &[f32],
        src_order: ArrayOrder,
    ) -> Result<NdArray, ArenaError> {
        let len = buffer_len(shape)?;
        if src.len() != len as usize {
            return Err(ArenaError::InvalidShape {
                reason: format!("shape {shape:?} needs {len} elements, source has {}", src.len()),
            });
        }
        let mut state = self.state.lock();
        let (segment, offset) = state.segments.alloc(len, false)?;
        let handle = BufferHandle::new(state.generation, segment, offset, len);
        let dst = state.segments.slice_mut(segment, offset, len);
        reorder(src, shape, src_order, order, dst);
        drop(state);
        tracing::trace!(workspace = %self.name, %handle, "allocated copy");
        Ok(NdArray::attached(shape, order, Arc::clone(self), handle))
    }

    /// Whether `handle` still refers to live storage.
    pub fn is_live(&self, handle: &BufferHandle) -> bool {
        self.state.lock().generation == handle.generation
    }

    pub(crate) fn read<T>(
        &self,
        handle: &BufferHandle,
        f: impl FnOnce(&[f32]) -> T,
    ) -> Result<T, ArenaError> {
        let state = self.state.lock();
        self.check_live(state.generation, handle)?;
        Ok(f(state.segments.slice(handle.segment, handle.offset, handle.len)))
    }

    pub(crate) fn write<T>(
        &self,
        handle: &BufferHandle,
        f: impl FnOnce(&mut [f32]) -> T,
    ) -> Result<T, ArenaError> {
        let mut state = self.state.lock();
        self.check_live(state.generation, handle)?;
        Ok(f(state
            .segments
            .slice_mut(handle.segment, handle.offset, handle.len)))
    }

    fn check_live(&self, current: u32, handle: &BufferHandle) -> Result<(), ArenaError> {
        if current == handle.generation {
            Ok(())
        } else {
            Err(ArenaError::StaleHandle {
                workspace: self.name.clone(),
                handle_generation: handle.generation,
                current_generation: current,
            })
        }
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("generation", &self.state.try_lock().map(|s| s.generation))
            .finish_non_exhaustive()
    }
}

/// Element count of `shape` as a `u32` buffer length.
pub(crate) fn buffer_len(shape: &[usize]) -> Result<u32, ArenaError> {
    element_count(shape)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ArenaError::InvalidShape {
            reason: format!("shape {shape:?} exceeds the maximum buffer length"),
        })
}
