//! The workspace manager and its builder.

use strata_core::{ArrayRole, WorkspaceConfig};

use crate::registry::WorkspaceRegistry;

/// Role-typed workspace manager.
///
/// Owns the role → workspace bindings. Scope state is not stored here: it
/// lives in the calling thread's scope stack, keyed by workspace name, so
/// the manager can be shared (for example behind an `Arc`) by threads that
/// each enter and exit scopes independently. Binding mutation takes
/// `&mut self`, which confines it to setup phases.
///
/// The operations are spread over several modules:
///
/// | Module | Operations |
/// |---|---|
/// | `registry` | configuration, naming, scoped-out roles, assertions |
/// | `scope` | entering, borrowing, and querying scopes |
/// | `leverage` | `leverage_to`, `create*`, `dup*` |
/// | `validate` | `validate_array_location` |
#[derive(Clone, Debug)]
pub struct WorkspaceMgr<R: ArrayRole> {
    pub(crate) registry: WorkspaceRegistry<R>,
}

impl<R: ArrayRole> WorkspaceMgr<R> {
    /// A manager with no bindings: every role is unconfigured.
    pub fn new() -> Self {
        Self {
            registry: WorkspaceRegistry::new(),
        }
    }

    /// A manager with every role scoped-out; all allocations go to the heap.
    pub fn no_workspaces() -> Self {
        Self::builder().default_no_workspace().build()
    }

    /// Start building a manager.
    pub fn builder() -> WorkspaceMgrBuilder<R> {
        WorkspaceMgrBuilder {
            registry: WorkspaceRegistry::new(),
            default_no_workspace: false,
        }
    }

    /// The role bindings.
    pub fn registry(&self) -> &WorkspaceRegistry<R> {
        &self.registry
    }
}

impl<R: ArrayRole> Default for WorkspaceMgr<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`WorkspaceMgr`].
#[derive(Debug)]
#[must_use]
pub struct WorkspaceMgrBuilder<R: ArrayRole> {
    registry: WorkspaceRegistry<R>,
    default_no_workspace: bool,
}

impl<R: ArrayRole> WorkspaceMgrBuilder<R> {
    /// Bind `role` to the arena `name` with `config`.
    pub fn with(mut self, role: R, name: impl Into<String>, config: WorkspaceConfig) -> Self {
        self.registry.set_workspace(role, name.into(), config);
        self
    }

    /// Route `role`'s allocations to the heap.
    pub fn scoped_out(mut self, role: R) -> Self {
        self.registry.set_scoped_out(role);
        self
    }

    /// Scope out every role in `R::ALL` that has no binding at build time.
    pub fn default_no_workspace(mut self) -> Self {
        self.default_no_workspace = true;
        self
    }

    /// Finish building.
    pub fn build(mut self) -> WorkspaceMgr<R> {
        if self.default_no_workspace {
            for &role in R::ALL {
                if self.registry.binding(role).is_none() {
                    self.registry.set_scoped_out(role);
                }
            }
        }
        WorkspaceMgr {
            registry: self.registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ArrayType;

    #[test]
    fn no_workspaces_scopes_out_everything() {
        let mgr = WorkspaceMgr::<ArrayType>::no_workspaces();
        assert!(ArrayType::ALL.iter().all(|&r| mgr.is_scoped_out(r)));
    }

    #[test]
    fn builder_default_keeps_explicit_bindings() {
        let mgr = WorkspaceMgr::builder()
            .with(ArrayType::Input, "WS_IN", WorkspaceConfig::default())
            .default_no_workspace()
            .build();
        assert!(!mgr.is_scoped_out(ArrayType::Input));
        assert_eq!(mgr.get_workspace_name(ArrayType::Input), Ok("WS_IN"));
        assert!(mgr.is_scoped_out(ArrayType::Activations));
        assert!(mgr.is_scoped_out(ArrayType::FfCache));
    }

    #[test]
    fn builder_without_default_leaves_roles_unconfigured() {
        let mgr = WorkspaceMgr::builder()
            .scoped_out(ArrayType::FfWorkingMem)
            .build();
        assert!(mgr.is_scoped_out(ArrayType::FfWorkingMem));
        assert!(!mgr.is_scoped_out(ArrayType::Input));
        assert!(mgr.get_configuration(ArrayType::Input).is_err());
    }
}
