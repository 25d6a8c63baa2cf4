//! Moving arrays into a role's arena, and allocating there.

use strata_arena::{AllocInit, NdArray};
use strata_core::{ArrayOrder, ArrayRole};

use crate::error::WorkspaceError;
use crate::manager::WorkspaceMgr;
use crate::registry::Target;

impl<R: ArrayRole> WorkspaceMgr<R> {
    /// Move `array` into the arena bound to `role`.
    ///
    /// - Detached arrays are returned unchanged.
    /// - Arrays already live in the role's open arena are returned unchanged.
    /// - For a scoped-out role the array is copied to the heap.
    /// - Otherwise the role's workspace must be open on this thread, and the
    ///   array is copied into it with shape and order preserved.
    pub fn leverage_to(&self, role: R, array: NdArray) -> Result<NdArray, WorkspaceError> {
        if !array.is_attached() {
            return Ok(array);
        }
        match self.registry.resolve(role)? {
            Target::ScopedOut => {
                tracing::debug!(role = role.name(), from = ?array.owner_name(), "detaching array");
                array
                    .detach()
                    .map_err(|e| WorkspaceError::from_arena(role.name(), "<heap>", e))
            }
            Target::Arena { name, .. } => {
                let target = self.open_workspace(role, name)?;
                if array.is_in(&target) {
                    return Ok(array);
                }
                tracing::debug!(role = role.name(), from = ?array.owner_name(), to = name, "leveraging array");
                array
                    .copy_into(&target)
                    .map_err(|e| WorkspaceError::from_arena(role.name(), name, e))
            }
        }
    }

    /// Allocate a zero-filled row-major array for `role`.
    pub fn create(&self, role: R, shape: &[usize]) -> Result<NdArray, WorkspaceError> {
        self.allocate(role, shape, ArrayOrder::RowMajor, AllocInit::Zeroed)
    }

    /// Allocate a zero-filled array for `role` in the given order.
    pub fn create_with_order(
        &self,
        role: R,
        shape: &[usize],
        order: ArrayOrder,
    ) -> Result<NdArray, WorkspaceError> {
        self.allocate(role, shape, order, AllocInit::Zeroed)
    }

    /// Allocate a row-major array for `role` with unspecified contents.
    ///
    /// Arena memory may hold values from an earlier cycle; use this only
    /// when every element will be overwritten.
    pub fn create_uninitialized(&self, role: R, shape: &[usize]) -> Result<NdArray, WorkspaceError> {
        self.allocate(role, shape, ArrayOrder::RowMajor, AllocInit::Uninitialized)
    }

    /// Allocate an array for `role` in the given order with unspecified contents.
    pub fn create_uninitialized_with_order(
        &self,
        role: R,
        shape: &[usize],
        order: ArrayOrder,
    ) -> Result<NdArray, WorkspaceError> {
        self.allocate(role, shape, order, AllocInit::Uninitialized)
    }

    /// Copy `source` into `role`'s arena, keeping its order.
    pub fn dup(&self, role: R, source: &NdArray) -> Result<NdArray, WorkspaceError> {
        self.dup_with_order(role, source, source.order())
    }

    /// Copy `source` into `role`'s arena laid out in `order`.
    pub fn dup_with_order(
        &self,
        role: R,
        source: &NdArray,
        order: ArrayOrder,
    ) -> Result<NdArray, WorkspaceError> {
        match self.registry.resolve(role)? {
            Target::ScopedOut => source
                .detach_as(order)
                .map_err(|e| WorkspaceError::from_arena(role.name(), "<heap>", e)),
            Target::Arena { name, .. } => {
                let ws = self.open_workspace(role, name)?;
                source
                    .copy_into_as(&ws, order)
                    .map_err(|e| WorkspaceError::from_arena(role.name(), name, e))
            }
        }
    }

    fn allocate(
        &self,
        role: R,
        shape: &[usize],
        order: ArrayOrder,
        init: AllocInit,
    ) -> Result<NdArray, WorkspaceError> {
        match self.registry.resolve(role)? {
            Target::ScopedOut => NdArray::zeros(shape, order)
                .map_err(|e| WorkspaceError::from_arena(role.name(), "<heap>", e)),
            Target::Arena { name, .. } => {
                let ws = self.open_workspace(role, name)?;
                ws.allocate(shape, order, init)
                    .map_err(|e| WorkspaceError::from_arena(role.name(), name, e))
            }
        }
    }
}
