//! Array handles.
//!
//! [`NdArray`] is a dense `f32` array that is either *detached* (owns a
//! heap `Vec`) or *attached* to a [`Workspace`] arena. Attached arrays keep
//! their arena alive through an `Arc` but can still go stale: once the arena
//! resets, every access fails with [`ArenaError::StaleHandle`].
//!
//! Arrays are deliberately not `Clone`. Copies are explicit, through
//! [`NdArray::detach`] or the workspace manager's `dup`.

use std::fmt;
use std::sync::Arc;

use strata_core::layout::reorder;
use strata_core::{ArenaId, ArrayOrder, Shape};

use crate::error::ArenaError;
use crate::handle::BufferHandle;
use crate::workspace::{buffer_len, SharedWorkspace, Workspace};

enum Storage {
    Detached(Vec<f32>),
    Attached {
        arena: SharedWorkspace,
        handle: BufferHandle,
    },
}

/// A dense `f32` array with a shape, an element order and an optional owning arena.
pub struct NdArray {
    shape: Shape,
    order: ArrayOrder,
    storage: Storage,
}

impl NdArray {
    /// Build a detached array from existing data laid out in `order`.
    pub fn from_vec(shape: &[usize], order: ArrayOrder, data: Vec<f32>) -> Result<Self, ArenaError> {
        let len = buffer_len(shape)?;
        if data.len() != len as usize {
            return Err(ArenaError::InvalidShape {
                reason: format!("shape {shape:?} needs {len} elements, got {}", data.len()),
            });
        }
        Ok(Self {
            shape: Shape::from_slice(shape),
            order,
            storage: Storage::Detached(data),
        })
    }

    /// A detached, zero-filled array.
    pub fn zeros(shape: &[usize], order: ArrayOrder) -> Result<Self, ArenaError> {
        let len = buffer_len(shape)?;
        Self::from_vec(shape, order, vec![0.0; len as usize])
    }

    pub(crate) fn attached(
        shape: &[usize],
        order: ArrayOrder,
        arena: SharedWorkspace,
        handle: BufferHandle,
    ) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            order,
            storage: Storage::Attached { arena, handle },
        }
    }

    /// Dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element order.
    pub fn order(&self) -> ArrayOrder {
        self.order
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Detached(data) => data.len(),
            Storage::Attached { handle, .. } => handle.len() as usize,
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the array's storage belongs to an arena.
    pub fn is_attached(&self) -> bool {
        matches!(self.storage, Storage::Attached { .. })
    }

    /// The owning arena, or `None` for a detached array.
    pub fn owner(&self) -> Option<&SharedWorkspace> {
        match &self.storage {
            Storage::Detached(_) => None,
            Storage::Attached { arena, .. } => Some(arena),
        }
    }

    /// Identity of the owning arena.
    pub fn owner_id(&self) -> Option<ArenaId> {
        self.owner().map(|ws| ws.id())
    }

    /// Workspace name of the owning arena.
    pub fn owner_name(&self) -> Option<&str> {
        self.owner().map(|ws| ws.name())
    }

    /// The arena location, for attached arrays.
    pub fn handle(&self) -> Option<BufferHandle> {
        match &self.storage {
            Storage::Detached(_) => None,
            Storage::Attached { handle, .. } => Some(*handle),
        }
    }

    /// Whether the array is owned by `workspace` and still live there.
    pub fn is_in(&self, workspace: &Workspace) -> bool {
        match &self.storage {
            Storage::Detached(_) => false,
            Storage::Attached { arena, handle } => {
                arena.id() == workspace.id() && arena.is_live(handle)
            }
        }
    }

    /// `false` only for an attached array whose arena has been reset since allocation.
    pub fn is_valid(&self) -> bool {
        match &self.storage {
            Storage::Detached(_) => true,
            Storage::Attached { arena, handle } => arena.is_live(handle),
        }
    }

    /// Run `f` over the raw elements in physical order.
    pub fn with_data<T>(&self, f: impl FnOnce(&[f32]) -> T) -> Result<T, ArenaError> {
        match &self.storage {
            Storage::Detached(data) => Ok(f(data)),
            Storage::Attached { arena, handle } => arena.read(handle, f),
        }
    }

    /// Run `f` over the raw elements in physical order, mutably.
    pub fn with_data_mut<T>(&mut self, f: impl FnOnce(&mut [f32]) -> T) -> Result<T, ArenaError> {
        match &mut self.storage {
            Storage::Detached(data) => Ok(f(data)),
            Storage::Attached { arena, handle } => arena.write(handle, f),
        }
    }

    /// Copy of the raw elements in physical order.
    pub fn to_vec(&self) -> Result<Vec<f32>, ArenaError> {
        self.with_data(<[f32]>::to_vec)
    }

    /// Copy of the elements in row-major logical order, independent of layout.
    pub fn to_logical_vec(&self) -> Result<Vec<f32>, ArenaError> {
        self.with_data(|src| {
            let mut out = vec![0.0; src.len()];
            reorder(src, &self.shape, self.order, ArrayOrder::RowMajor, &mut out);
            out
        })
    }

    /// A detached heap copy with the same shape, order and content.
    pub fn detach(&self) -> Result<NdArray, ArenaError> {
        let data = self.to_vec()?;
        Ok(Self {
            shape: self.shape.clone(),
            order: self.order,
            storage: Storage::Detached(data),
        })
    }

    /// A detached heap copy laid out in `order`, preserving logical content.
    pub fn detach_as(&self, order: ArrayOrder) -> Result<NdArray, ArenaError> {
        let data = self.with_data(|src| {
            let mut out = vec![0.0; src.len()];
            reorder(src, &self.shape, self.order, order, &mut out);
            out
        })?;
        Ok(Self {
            shape: self.shape.clone(),
            order,
            storage: Storage::Detached(data),
        })
    }

    /// Copy this array into `workspace`, keeping shape and order.
    pub fn copy_into(&self, workspace: &Arc<Workspace>) -> Result<NdArray, ArenaError> {
        self.copy_into_as(workspace, self.order)
    }

    /// Copy this array into `workspace` laid out in `order`.
    ///
    /// The source is read out before the target is locked, so copying
    /// between two arenas never holds both locks at once.
    pub fn copy_into_as(
        &self,
        workspace: &Arc<Workspace>,
        order: ArrayOrder,
    ) -> Result<NdArray, ArenaError> {
        let data = self.to_vec()?;
        workspace.allocate_copy(&self.shape, order, &data, self.order)
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("NdArray");
        d.field("shape", &self.shape.as_slice())
            .field("order", &self.order);
        match &self.storage {
            Storage::Detached(_) => d.field("owner", &"detached"),
            Storage::Attached { arena, handle } => d
                .field("owner", &arena.name())
                .field("arena", &arena.id())
                .field("generation", &handle.generation()),
        };
        d.finish()
    }
}
