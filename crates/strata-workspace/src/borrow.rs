//! Non-owning workspace handles for cross-context allocation.
//!
//! A [`BorrowedWorkspace`] lets code running outside the lender's scope
//! (typically another thread) allocate in the lender's arena. It holds a
//! weak reference and takes no part in nesting.
//!
//! # Aliasing contract
//!
//! The lender's scope must outlive every use of the borrow. This cannot be
//! expressed in the type system without tying the borrow to the lender's
//! guard lifetime, which would prevent sending it to another thread.
//! Violations are detected on use instead: once the arena is dropped, or
//! the lender's outermost scope has closed (even if it has since been
//! reopened), every operation fails with `IllegalState`. Arrays already
//! allocated through the borrow follow the arena's usual generation rules.
//!
//! Detection is best-effort. The liveness check and the allocation take the
//! arena lock separately, so if the lender ends its cycle between the two,
//! the borrower allocates into the next generation's storage without an
//! error. Only the lender outliving every use rules this out.

use std::sync::Weak;

use strata_arena::{AllocInit, NdArray, SharedWorkspace, Workspace};
use strata_core::ArrayOrder;

use crate::error::WorkspaceError;

enum Lent {
    Heap,
    Arena {
        name: String,
        workspace: Weak<Workspace>,
        cycle: u64,
    },
}

/// A weak, `Send + Sync` handle to a workspace opened elsewhere.
pub struct BorrowedWorkspace {
    role: &'static str,
    lent: Lent,
}

impl BorrowedWorkspace {
    pub(crate) fn heap(role: &'static str) -> Self {
        Self {
            role,
            lent: Lent::Heap,
        }
    }

    pub(crate) fn arena(role: &'static str, workspace: &SharedWorkspace) -> Self {
        Self {
            role,
            lent: Lent::Arena {
                name: workspace.name().to_string(),
                workspace: SharedWorkspace::downgrade(workspace),
                cycle: workspace.cycle_count(),
            },
        }
    }

    /// Name of the role the workspace was borrowed for.
    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Workspace name, or `None` for a heap borrow of a scoped-out role.
    pub fn name(&self) -> Option<&str> {
        match &self.lent {
            Lent::Heap => None,
            Lent::Arena { name, .. } => Some(name),
        }
    }

    /// Whether allocations go to the heap.
    pub fn is_heap(&self) -> bool {
        matches!(self.lent, Lent::Heap)
    }

    /// Whether the lender's scope is still open.
    pub fn is_valid(&self) -> bool {
        match &self.lent {
            Lent::Heap => true,
            Lent::Arena { .. } => self.upgrade().is_ok(),
        }
    }

    /// The lent arena, or `None` for a heap borrow.
    pub fn workspace(&self) -> Result<Option<SharedWorkspace>, WorkspaceError> {
        match &self.lent {
            Lent::Heap => Ok(None),
            Lent::Arena { .. } => self.upgrade().map(Some),
        }
    }

    /// Allocate a zero-filled array.
    pub fn create(&self, shape: &[usize], order: ArrayOrder) -> Result<NdArray, WorkspaceError> {
        self.allocate(shape, order, AllocInit::Zeroed)
    }

    /// Allocate an array with unspecified contents.
    pub fn create_uninitialized(
        &self,
        shape: &[usize],
        order: ArrayOrder,
    ) -> Result<NdArray, WorkspaceError> {
        self.allocate(shape, order, AllocInit::Uninitialized)
    }

    /// Copy `source` into the lent workspace, laid out in `order`.
    pub fn dup(&self, source: &NdArray, order: ArrayOrder) -> Result<NdArray, WorkspaceError> {
        let result = match self.workspace()? {
            None => source.detach_as(order),
            Some(ws) => source.copy_into_as(&ws, order),
        };
        result.map_err(|e| self.arena_error(e))
    }

    fn allocate(
        &self,
        shape: &[usize],
        order: ArrayOrder,
        init: AllocInit,
    ) -> Result<NdArray, WorkspaceError> {
        let result = match self.workspace()? {
            None => NdArray::zeros(shape, order),
            Some(ws) => ws.allocate(shape, order, init),
        };
        result.map_err(|e| self.arena_error(e))
    }

    fn arena_error(&self, e: strata_arena::ArenaError) -> WorkspaceError {
        WorkspaceError::from_arena(self.role, self.name().unwrap_or("<heap>"), e)
    }

    fn upgrade(&self) -> Result<SharedWorkspace, WorkspaceError> {
        let Lent::Arena {
            name,
            workspace,
            cycle,
        } = &self.lent
        else {
            return Err(WorkspaceError::illegal_state(self.role, "heap borrow has no workspace"));
        };
        let ws = workspace.upgrade().ok_or_else(|| {
            WorkspaceError::illegal_state(
                self.role,
                format!("borrowed workspace '{name}' has been dropped"),
            )
        })?;
        if !ws.is_active() || ws.cycle_count() != *cycle {
            return Err(WorkspaceError::illegal_state(
                self.role,
                format!("borrowed workspace '{name}' outlived its owner's scope"),
            ));
        }
        Ok(ws)
    }
}

impl std::fmt::Debug for BorrowedWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BorrowedWorkspace")
            .field("role", &self.role)
            .field("workspace", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::WorkspaceConfig;

    fn active_arena() -> SharedWorkspace {
        let ws = Workspace::new("WS_LENT", WorkspaceConfig::new(1024))
            .unwrap()
            .into_shared();
        ws.begin_cycle();
        ws
    }

    #[test]
    fn borrow_allocates_in_lent_arena() {
        let ws = active_arena();
        let borrowed = BorrowedWorkspace::arena("R", &ws);
        let a = borrowed.create(&[2, 2], ArrayOrder::RowMajor).unwrap();
        assert_eq!(a.owner_id(), Some(ws.id()));
        assert!(borrowed.is_valid());
    }

    #[test]
    fn borrow_is_invalid_after_cycle_ends() {
        let ws = active_arena();
        let borrowed = BorrowedWorkspace::arena("R", &ws);
        ws.end_cycle();
        ws.begin_cycle();
        assert!(!borrowed.is_valid());
        assert!(matches!(
            borrowed.create(&[1], ArrayOrder::RowMajor),
            Err(WorkspaceError::IllegalState { .. })
        ));
    }

    #[test]
    fn borrow_is_invalid_after_drop() {
        let ws = active_arena();
        let borrowed = BorrowedWorkspace::arena("R", &ws);
        drop(ws);
        let err = borrowed.create(&[1], ArrayOrder::RowMajor).unwrap_err();
        assert!(err.to_string().contains("dropped"));
    }

    #[test]
    fn heap_borrow_detaches() {
        let borrowed = BorrowedWorkspace::heap("R");
        assert!(borrowed.is_heap());
        let a = borrowed.create(&[3], ArrayOrder::RowMajor).unwrap();
        assert!(!a.is_attached());
        let b = borrowed.dup(&a, ArrayOrder::ColumnMajor).unwrap();
        assert!(!b.is_attached());
    }

    #[test]
    fn borrowed_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BorrowedWorkspace>();
    }
}
