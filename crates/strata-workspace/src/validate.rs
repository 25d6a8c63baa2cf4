//! Checking that arrays live where their role says they should.

use strata_arena::NdArray;
use strata_core::ArrayRole;

use crate::error::WorkspaceError;
use crate::manager::WorkspaceMgr;
use crate::registry::Target;
use crate::scope::with_scopes;

impl<R: ArrayRole> WorkspaceMgr<R> {
    /// Check that `array` lives in the arena bound to `role`.
    ///
    /// When the role's workspace is open on this thread, the array must be
    /// live in exactly that arena instance; otherwise its owner's workspace
    /// name must match and its storage must not be stale.
    ///
    /// - Match: the array is returned unchanged.
    /// - Mismatch: with `migrate_if_invalid` the array is leveraged into the
    ///   role's arena, otherwise `InvalidLocation`.
    /// - Detached array for an arena-backed role: `UnexpectedDetached` if
    ///   `exception_if_detached`, otherwise returned unchanged.
    /// - Scoped-out role: detached arrays pass; attached arrays are
    ///   detached when migrating, `InvalidLocation` otherwise.
    pub fn validate_array_location(
        &self,
        role: R,
        array: NdArray,
        migrate_if_invalid: bool,
        exception_if_detached: bool,
    ) -> Result<NdArray, WorkspaceError> {
        let name = match self.registry.resolve(role)? {
            Target::ScopedOut => {
                if !array.is_attached() {
                    return Ok(array);
                }
                if migrate_if_invalid {
                    return self.leverage_to(role, array);
                }
                return Err(WorkspaceError::InvalidLocation {
                    role: role.name(),
                    expected: "detached memory".into(),
                    actual: describe(&array),
                });
            }
            Target::Arena { name, .. } => name,
        };

        let Some(owner) = array.owner() else {
            if exception_if_detached {
                return Err(WorkspaceError::UnexpectedDetached {
                    role: role.name(),
                    expected: name.to_string(),
                });
            }
            return Ok(array);
        };

        let open = with_scopes(|s| s.open_workspace(name).cloned());
        let valid = match &open {
            Some(ws) => array.is_in(ws),
            None => owner.name() == name && array.is_valid(),
        };
        if valid {
            return Ok(array);
        }
        if migrate_if_invalid {
            return self.leverage_to(role, array);
        }
        let expected = match &open {
            Some(ws) => format!("workspace '{name}' (arena {}, generation {})", ws.id(), ws.generation()),
            None => format!("workspace '{name}'"),
        };
        Err(WorkspaceError::InvalidLocation {
            role: role.name(),
            expected,
            actual: describe(&array),
        })
    }
}

fn describe(array: &NdArray) -> String {
    match (array.owner(), array.handle()) {
        (Some(ws), Some(handle)) => format!(
            "workspace '{}' (arena {}, generation {})",
            ws.name(),
            ws.id(),
            handle.generation()
        ),
        _ => "detached memory".into(),
    }
}
