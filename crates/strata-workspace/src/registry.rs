//! Role → workspace bindings.
//!
//! [`WorkspaceRegistry`] is the source of truth for which arena backs which
//! role. The registry itself is a plain map; the open/closed guards that
//! protect binding mutation live on [`WorkspaceMgr`], which can see the
//! calling thread's scope stack.

use indexmap::IndexMap;
use strata_core::{ArrayRole, WorkspaceConfig};

use crate::error::WorkspaceError;
use crate::manager::WorkspaceMgr;
use crate::scope;

/// Per-role binding: arena name, arena policy, and the scoped-out flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkspaceBinding {
    /// Name of the arena the role maps to.
    pub workspace_name: Option<String>,
    /// Policy for that arena.
    pub configuration: Option<WorkspaceConfig>,
    /// Route allocations to the heap, ignoring name and configuration.
    pub scoped_out: bool,
}

/// Where allocations for a role go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'a> {
    /// Untracked heap memory.
    ScopedOut,
    /// A named arena.
    Arena {
        /// Workspace name.
        name: &'a str,
        /// Arena policy.
        config: &'a WorkspaceConfig,
    },
}

/// Mapping from role to [`WorkspaceBinding`].
#[derive(Clone, Debug)]
pub struct WorkspaceRegistry<R: ArrayRole> {
    bindings: IndexMap<R, WorkspaceBinding>,
}

impl<R: ArrayRole> WorkspaceRegistry<R> {
    /// An empty registry: every role is unconfigured.
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// The binding for `role`, if one was ever created.
    pub fn binding(&self, role: R) -> Option<&WorkspaceBinding> {
        self.bindings.get(&role)
    }

    /// Iterate over all bindings in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&R, &WorkspaceBinding)> {
        self.bindings.iter()
    }

    /// Resolve the allocation target for `role`.
    ///
    /// Fails with `NotConfigured` unless the role is scoped-out or has both
    /// a workspace name and a configuration.
    pub fn resolve(&self, role: R) -> Result<Target<'_>, WorkspaceError> {
        let binding = self.bindings.get(&role).ok_or(WorkspaceError::NotConfigured {
            role: role.name(),
            missing: "configuration",
        })?;
        if binding.scoped_out {
            return Ok(Target::ScopedOut);
        }
        let config = binding
            .configuration
            .as_ref()
            .ok_or(WorkspaceError::NotConfigured {
                role: role.name(),
                missing: "configuration",
            })?;
        let name = binding
            .workspace_name
            .as_deref()
            .ok_or(WorkspaceError::NotConfigured {
                role: role.name(),
                missing: "workspace name",
            })?;
        Ok(Target::Arena { name, config })
    }

    /// The arena name `role` maps to, unless scoped-out or unnamed.
    pub(crate) fn arena_name(&self, role: R) -> Option<&str> {
        self.bindings
            .get(&role)
            .filter(|b| !b.scoped_out)
            .and_then(|b| b.workspace_name.as_deref())
    }

    pub(crate) fn set_configuration(&mut self, role: R, config: WorkspaceConfig) {
        let binding = self.bindings.entry(role).or_default();
        binding.configuration = Some(config);
        binding.scoped_out = false;
    }

    pub(crate) fn set_workspace_name(&mut self, role: R, name: String) {
        self.bindings.entry(role).or_default().workspace_name = Some(name);
    }

    pub(crate) fn set_workspace(&mut self, role: R, name: String, config: WorkspaceConfig) {
        self.bindings.insert(
            role,
            WorkspaceBinding {
                workspace_name: Some(name),
                configuration: Some(config),
                scoped_out: false,
            },
        );
    }

    pub(crate) fn set_scoped_out(&mut self, role: R) {
        self.bindings.insert(
            role,
            WorkspaceBinding {
                scoped_out: true,
                ..WorkspaceBinding::default()
            },
        );
    }

    pub(crate) fn is_scoped_out(&self, role: R) -> bool {
        self.bindings.get(&role).is_some_and(|b| b.scoped_out)
    }
}

impl<R: ArrayRole> Default for WorkspaceRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ArrayRole> WorkspaceMgr<R> {
    /// Set the arena policy for `role`.
    ///
    /// Clears the scoped-out flag. Fails with `IllegalState` while the
    /// role's workspace is open on this thread.
    pub fn set_configuration(
        &mut self,
        role: R,
        config: WorkspaceConfig,
    ) -> Result<(), WorkspaceError> {
        self.assert_not_open(role, "cannot change the configuration of an open workspace")?;
        tracing::debug!(role = role.name(), "set workspace configuration");
        self.registry.set_configuration(role, config);
        Ok(())
    }

    /// The arena policy for `role`.
    pub fn get_configuration(&self, role: R) -> Result<&WorkspaceConfig, WorkspaceError> {
        self.registry
            .binding(role)
            .and_then(|b| b.configuration.as_ref())
            .ok_or(WorkspaceError::NotConfigured {
                role: role.name(),
                missing: "configuration",
            })
    }

    /// Route allocations for `role` to the heap from now on.
    ///
    /// Clears any workspace name and configuration bound to the role.
    /// Fails with `IllegalState` while the role's workspace is open on this thread.
    pub fn set_scoped_out_for(&mut self, role: R) -> Result<(), WorkspaceError> {
        self.assert_not_open(role, "cannot scope out an open workspace")?;
        tracing::debug!(role = role.name(), "scoped out of workspaces");
        self.registry.set_scoped_out(role);
        Ok(())
    }

    /// Whether allocations for `role` go to the heap.
    pub fn is_scoped_out(&self, role: R) -> bool {
        self.registry.is_scoped_out(role)
    }

    /// Rename the arena `role` maps to.
    ///
    /// Fails with `IllegalState` while the role's workspace is open on this thread.
    pub fn set_workspace_name(
        &mut self,
        role: R,
        name: impl Into<String>,
    ) -> Result<(), WorkspaceError> {
        self.assert_not_open(role, "cannot rename an open workspace")?;
        let name = name.into();
        tracing::debug!(role = role.name(), workspace = %name, "set workspace name");
        self.registry.set_workspace_name(role, name);
        Ok(())
    }

    /// The arena name `role` maps to.
    pub fn get_workspace_name(&self, role: R) -> Result<&str, WorkspaceError> {
        self.registry
            .binding(role)
            .and_then(|b| b.workspace_name.as_deref())
            .ok_or(WorkspaceError::NotConfigured {
                role: role.name(),
                missing: "workspace name",
            })
    }

    /// Bind `role` to the arena `name` with `config`, replacing any previous binding.
    ///
    /// Fails with `IllegalState` while the role's workspace is open on this thread.
    pub fn set_workspace(
        &mut self,
        role: R,
        name: impl Into<String>,
        config: WorkspaceConfig,
    ) -> Result<(), WorkspaceError> {
        self.assert_not_open(role, "cannot rebind an open workspace")?;
        let name = name.into();
        tracing::debug!(role = role.name(), workspace = %name, "bound workspace");
        self.registry.set_workspace(role, name, config);
        Ok(())
    }

    /// Fail with `IllegalState` carrying `msg` if `role`'s workspace is open on this thread.
    pub fn assert_not_open(&self, role: R, msg: &str) -> Result<(), WorkspaceError> {
        if self.is_workspace_open(role) {
            return Err(WorkspaceError::illegal_state(role.name(), msg));
        }
        Ok(())
    }

    /// Fail with `IllegalState` carrying `msg` unless the calling thread's
    /// current workspace is the one bound to `role`.
    ///
    /// The current workspace is the target of the innermost open scope.
    /// Scoped-out roles always pass.
    pub fn assert_current_workspace(&self, role: R, msg: &str) -> Result<(), WorkspaceError> {
        let name = match self.registry.resolve(role)? {
            Target::ScopedOut => return Ok(()),
            Target::Arena { name, .. } => name,
        };
        let current = scope::with_scopes(|s| s.current().map(|c| c.map(str::to_owned)));
        if current.as_ref().and_then(Option::as_deref) == Some(name) {
            return Ok(());
        }
        let actual = match current {
            None => "no workspace".to_string(),
            Some(None) => "a scoped-out region".to_string(),
            Some(Some(other)) => format!("'{other}'"),
        };
        Err(WorkspaceError::illegal_state(
            role.name(),
            format!("expected current workspace '{name}', actual current workspace is {actual}: {msg}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ArrayType;

    #[test]
    fn unconfigured_role_fails_to_resolve() {
        let registry = WorkspaceRegistry::<ArrayType>::new();
        assert_eq!(
            registry.resolve(ArrayType::Input),
            Err(WorkspaceError::NotConfigured {
                role: "INPUT",
                missing: "configuration",
            })
        );
    }

    #[test]
    fn name_without_config_is_not_configured() {
        let mut registry = WorkspaceRegistry::new();
        registry.set_workspace_name(ArrayType::Input, "WS_IN".into());
        assert!(matches!(
            registry.resolve(ArrayType::Input),
            Err(WorkspaceError::NotConfigured {
                missing: "configuration",
                ..
            })
        ));
    }

    #[test]
    fn config_without_name_is_not_configured() {
        let mut registry = WorkspaceRegistry::new();
        registry.set_configuration(ArrayType::Input, WorkspaceConfig::default());
        assert!(matches!(
            registry.resolve(ArrayType::Input),
            Err(WorkspaceError::NotConfigured {
                missing: "workspace name",
                ..
            })
        ));
    }

    #[test]
    fn set_workspace_resolves_to_arena() {
        let mut registry = WorkspaceRegistry::new();
        let config = WorkspaceConfig::new(64);
        registry.set_workspace(ArrayType::Input, "WS_IN".into(), config.clone());
        assert_eq!(
            registry.resolve(ArrayType::Input),
            Ok(Target::Arena {
                name: "WS_IN",
                config: &config,
            })
        );
    }

    #[test]
    fn scoped_out_clears_binding_and_configuration_restores_it() {
        let mut registry = WorkspaceRegistry::new();
        registry.set_workspace(ArrayType::Input, "WS_IN".into(), WorkspaceConfig::default());
        registry.set_scoped_out(ArrayType::Input);
        assert!(registry.is_scoped_out(ArrayType::Input));
        assert_eq!(registry.resolve(ArrayType::Input), Ok(Target::ScopedOut));
        assert!(registry.arena_name(ArrayType::Input).is_none());

        registry.set_configuration(ArrayType::Input, WorkspaceConfig::default());
        assert!(!registry.is_scoped_out(ArrayType::Input));
    }
}
