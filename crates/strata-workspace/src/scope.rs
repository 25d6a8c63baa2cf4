//! Per-thread scope stack and scope guards.
//!
//! Each thread owns an independent [`ScopeStack`] in thread-local storage,
//! so unrelated threads never contend on scope bookkeeping. The stack
//! tracks, per workspace name, the arena instance for this thread and its
//! nesting depth:
//!
//! ```text
//! Closed ──enter──▶ Open(1) ──enter──▶ Open(n)
//!   ▲                  │                  │
//!   └──────exit────────┘◀──────exit───────┘
//! ```
//!
//! Entering a closed name begins a cycle on its arena (creating or reusing
//! it); exiting to depth 0 ends the cycle, which lets the arena apply its
//! reuse policy. Frames are pushed for every entry, and exits must match
//! the most recent unmatched entry.
//!
//! Scopes are released by [`WorkspaceScope`] and [`MultiScope`] guards. An
//! explicit `close()` reports ordering violations; dropping a guard exits
//! on every path, including unwinding, and repairs the stack if the drop
//! happened out of order.

use std::cell::RefCell;
use std::marker::PhantomData;

use indexmap::IndexMap;
use strata_arena::{ArenaError, SharedWorkspace, Workspace};
use strata_core::{ArrayRole, WorkspaceConfig};

use crate::borrow::BorrowedWorkspace;
use crate::error::WorkspaceError;
use crate::manager::WorkspaceMgr;
use crate::registry::Target;

thread_local! {
    static SCOPES: RefCell<ScopeStack> = RefCell::new(ScopeStack::new());
}

/// Run `f` against the calling thread's scope stack.
pub(crate) fn with_scopes<T>(f: impl FnOnce(&mut ScopeStack) -> T) -> T {
    SCOPES.with(|cell| f(&mut cell.borrow_mut()))
}

/// Identifies one pushed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScopeToken(u64);

struct OpenArena {
    workspace: SharedWorkspace,
    depth: usize,
}

struct Frame {
    token: ScopeToken,
    /// Workspace name, or `None` for a scoped-out frame.
    target: Option<String>,
}

/// One thread's open workspaces and entry frames.
///
/// Arenas are cached per workspace name for the life of the thread and
/// never evicted, so a thread's retained memory grows with the number of
/// distinct names it has entered.
pub(crate) struct ScopeStack {
    /// Arenas seen on this thread, by workspace name. Closed arenas stay
    /// cached (depth 0) so the next entry reuses their storage.
    arenas: IndexMap<String, OpenArena>,
    frames: Vec<Frame>,
    next_token: u64,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        Self {
            arenas: IndexMap::new(),
            frames: Vec::new(),
            next_token: 0,
        }
    }

    fn push(&mut self, target: Option<String>) -> ScopeToken {
        let token = ScopeToken(self.next_token);
        self.next_token += 1;
        self.frames.push(Frame { token, target });
        token
    }

    /// Enter the workspace `name`, opening its arena if closed.
    ///
    /// A cached closed arena is reused if its configuration equals `config`
    /// and replaced otherwise. An arena that is already open is reused as-is.
    pub(crate) fn enter(
        &mut self,
        name: &str,
        config: &WorkspaceConfig,
    ) -> Result<(ScopeToken, SharedWorkspace), ArenaError> {
        let index = match self.arenas.get_index_of(name) {
            Some(index) => {
                let open = &mut self.arenas[index];
                if open.depth == 0 && open.workspace.config() != config {
                    tracing::debug!(workspace = name, "configuration changed; replacing arena");
                    open.workspace = Workspace::new(name, config.clone())?.into_shared();
                }
                index
            }
            None => {
                let workspace = Workspace::new(name, config.clone())?.into_shared();
                self.arenas
                    .insert_full(name.to_string(), OpenArena { workspace, depth: 0 })
                    .0
            }
        };
        let open = &mut self.arenas[index];
        if open.depth == 0 {
            open.workspace.begin_cycle();
            tracing::debug!(workspace = name, arena = %open.workspace.id(), "workspace scope opened");
        } else {
            tracing::trace!(workspace = name, depth = open.depth + 1, "nested workspace scope");
        }
        open.depth += 1;
        let workspace = SharedWorkspace::clone(&open.workspace);
        let token = self.push(Some(name.to_string()));
        Ok((token, workspace))
    }

    /// Push a frame that routes allocation outside every arena.
    pub(crate) fn enter_scoped_out(&mut self) -> ScopeToken {
        tracing::trace!("scoped-out region entered");
        self.push(None)
    }

    /// Exit the frame identified by `token`, which must be the innermost one.
    pub(crate) fn exit(&mut self, token: ScopeToken, role: &'static str) -> Result<(), WorkspaceError> {
        if self.frames.last().map(|f| f.token) == Some(token) {
            let target = self.frames.pop().and_then(|f| f.target);
            self.release(target);
            return Ok(());
        }
        let message = if self.frames.iter().any(|f| f.token == token) {
            "scope closed out of nesting order; close the innermost scope first"
        } else {
            "scope already closed"
        };
        Err(WorkspaceError::illegal_state(role, message))
    }

    /// Remove the frame for `token` wherever it sits. Returns whether it was found.
    pub(crate) fn repair(&mut self, token: ScopeToken) -> bool {
        let Some(index) = self.frames.iter().position(|f| f.token == token) else {
            return false;
        };
        let frame = self.frames.remove(index);
        self.release(frame.target);
        true
    }

    fn release(&mut self, target: Option<String>) {
        let Some(name) = target else {
            tracing::trace!("scoped-out region exited");
            return;
        };
        if let Some(open) = self.arenas.get_mut(&name) {
            open.depth = open.depth.saturating_sub(1);
            if open.depth == 0 {
                let reset = open.workspace.end_cycle();
                tracing::debug!(workspace = %name, reset, "workspace scope closed");
            } else {
                tracing::trace!(workspace = %name, depth = open.depth, "nested workspace scope exited");
            }
        }
    }

    /// Nesting depth of `name` on this thread.
    pub(crate) fn depth(&self, name: &str) -> usize {
        self.arenas.get(name).map_or(0, |open| open.depth)
    }

    /// The open arena for `name`, if its depth is non-zero.
    pub(crate) fn open_workspace(&self, name: &str) -> Option<&SharedWorkspace> {
        self.arenas
            .get(name)
            .filter(|open| open.depth > 0)
            .map(|open| &open.workspace)
    }

    /// Target of the innermost frame: `None` with no frames,
    /// `Some(None)` for a scoped-out frame.
    pub(crate) fn current(&self) -> Option<Option<&str>> {
        self.frames.last().map(|f| f.target.as_deref())
    }
}

/// Guard for one entered role.
///
/// Closing (or dropping) the guard exits exactly the frame it pushed. The
/// guard is bound to the thread that created it.
#[must_use = "dropping a scope guard exits the scope immediately"]
pub struct WorkspaceScope {
    token: ScopeToken,
    role: &'static str,
    workspace: Option<SharedWorkspace>,
    closed: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl WorkspaceScope {
    fn new(token: ScopeToken, role: &'static str, workspace: Option<SharedWorkspace>) -> Self {
        Self {
            token,
            role,
            workspace,
            closed: false,
            _thread_bound: PhantomData,
        }
    }

    /// The live arena, or `None` for a scoped-out role.
    pub fn workspace(&self) -> Option<&SharedWorkspace> {
        self.workspace.as_ref()
    }

    /// Whether this scope routes allocation to the heap.
    pub fn is_scoped_out(&self) -> bool {
        self.workspace.is_none()
    }

    /// Name of the role this scope was entered for.
    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Exit the scope.
    ///
    /// Fails with `IllegalState` if an inner scope is still open. The frame
    /// is removed regardless, so the stack stays consistent.
    pub fn close(mut self) -> Result<(), WorkspaceError> {
        self.closed = true;
        let token = self.token;
        let role = self.role;
        with_scopes(|s| {
            let result = s.exit(token, role);
            if result.is_err() {
                s.repair(token);
            }
            result
        })
    }
}

impl Drop for WorkspaceScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let token = self.token;
        let role = self.role;
        // The thread-local may already be gone during thread teardown.
        let _ = SCOPES.try_with(|cell| {
            let mut stack = cell.borrow_mut();
            if let Err(e) = stack.exit(token, role) {
                tracing::warn!(role, error = %e, "scope guard dropped out of order; repairing stack");
                stack.repair(token);
            }
        });
    }
}

impl std::fmt::Debug for WorkspaceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceScope")
            .field("role", &self.role)
            .field("workspace", &self.workspace.as_ref().map(|ws| ws.name()))
            .finish()
    }
}

/// Guard for several roles entered together.
///
/// Closing (or dropping) exits every role in reverse order of entry.
#[must_use = "dropping a scope guard exits the scopes immediately"]
#[derive(Debug, Default)]
pub struct MultiScope {
    scopes: Vec<WorkspaceScope>,
}

impl MultiScope {
    /// Number of roles held.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether no roles are held.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The individual scopes, in entry order.
    pub fn scopes(&self) -> &[WorkspaceScope] {
        &self.scopes
    }

    /// Exit every role in reverse order, reporting the first failure.
    pub fn close(mut self) -> Result<(), WorkspaceError> {
        let mut result = Ok(());
        while let Some(scope) = self.scopes.pop() {
            let closed = scope.close();
            if result.is_ok() {
                result = closed;
            }
        }
        result
    }
}

impl Drop for MultiScope {
    fn drop(&mut self) {
        while let Some(scope) = self.scopes.pop() {
            drop(scope);
        }
    }
}

impl<R: ArrayRole> WorkspaceMgr<R> {
    /// Enter `role`'s workspace on this thread.
    ///
    /// Opens (or reuses) the arena the first time; nested entries only bump
    /// the nesting depth. A scoped-out role pushes a heap frame instead and
    /// opens nothing. Fails with `NotConfigured` for an unbound role.
    pub fn notify_scope_entered(&self, role: R) -> Result<WorkspaceScope, WorkspaceError> {
        match self.registry.resolve(role)? {
            Target::ScopedOut => {
                let token = with_scopes(ScopeStack::enter_scoped_out);
                Ok(WorkspaceScope::new(token, role.name(), None))
            }
            Target::Arena { name, config } => {
                let (token, workspace) = with_scopes(|s| s.enter(name, config))
                    .map_err(|e| WorkspaceError::from_arena(role.name(), name, e))?;
                Ok(WorkspaceScope::new(token, role.name(), Some(workspace)))
            }
        }
    }

    /// Enter several roles in order, returning one guard that exits them in reverse.
    ///
    /// If any entry fails, the roles already entered are exited (in reverse)
    /// before the error is returned.
    pub fn notify_scope_entered_all(&self, roles: &[R]) -> Result<MultiScope, WorkspaceError> {
        let mut multi = MultiScope {
            scopes: Vec::with_capacity(roles.len()),
        };
        for &role in roles {
            // On error `multi` drops here, unwinding the entered roles.
            multi.scopes.push(self.notify_scope_entered(role)?);
        }
        Ok(multi)
    }

    /// Borrow `role`'s open workspace for use from another context.
    ///
    /// The handle does not take part in nesting. It stays usable only while
    /// the lender's scope remains open; see [`BorrowedWorkspace`]. Fails with
    /// `IllegalState` if the workspace is not open on this thread.
    pub fn notify_scope_borrowed(&self, role: R) -> Result<BorrowedWorkspace, WorkspaceError> {
        match self.registry.resolve(role)? {
            Target::ScopedOut => Ok(BorrowedWorkspace::heap(role.name())),
            Target::Arena { name, .. } => {
                let workspace = self.open_workspace(role, name)?;
                tracing::trace!(role = role.name(), workspace = name, "workspace borrowed");
                Ok(BorrowedWorkspace::arena(role.name(), &workspace))
            }
        }
    }

    /// Whether `role`'s workspace is open (nesting depth > 0) on this thread.
    ///
    /// Always `false` for scoped-out and unconfigured roles.
    pub fn is_workspace_open(&self, role: R) -> bool {
        self.registry
            .arena_name(role)
            .is_some_and(|name| with_scopes(|s| s.depth(name)) > 0)
    }

    /// The arena open for `name` on this thread, or `IllegalState`.
    pub(crate) fn open_workspace(
        &self,
        role: R,
        name: &str,
    ) -> Result<SharedWorkspace, WorkspaceError> {
        with_scopes(|s| s.open_workspace(name).cloned()).ok_or_else(|| {
            WorkspaceError::illegal_state(
                role.name(),
                format!("workspace '{name}' is not open on this thread"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkspaceConfig {
        WorkspaceConfig::new(1024)
    }

    #[test]
    fn enter_and_exit_tracks_depth() {
        let mut stack = ScopeStack::new();
        let (a, ws) = stack.enter("WS", &config()).unwrap();
        assert_eq!(stack.depth("WS"), 1);
        assert!(ws.is_active());
        let (b, _) = stack.enter("WS", &config()).unwrap();
        assert_eq!(stack.depth("WS"), 2);
        stack.exit(b, "R").unwrap();
        assert_eq!(stack.depth("WS"), 1);
        assert!(ws.is_active());
        stack.exit(a, "R").unwrap();
        assert_eq!(stack.depth("WS"), 0);
        assert!(!ws.is_active());
        assert!(stack.open_workspace("WS").is_none());
    }

    #[test]
    fn reentry_reuses_arena() {
        let mut stack = ScopeStack::new();
        let (a, first) = stack.enter("WS", &config()).unwrap();
        stack.exit(a, "R").unwrap();
        let (b, second) = stack.enter("WS", &config()).unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(second.cycle_count(), 1);
        stack.exit(b, "R").unwrap();
    }

    #[test]
    fn changed_config_replaces_closed_arena() {
        let mut stack = ScopeStack::new();
        let (a, first) = stack.enter("WS", &config()).unwrap();
        stack.exit(a, "R").unwrap();
        let (b, second) = stack.enter("WS", &WorkspaceConfig::new(2048)).unwrap();
        assert_ne!(first.id(), second.id());
        stack.exit(b, "R").unwrap();
    }

    #[test]
    fn out_of_order_exit_rejected() {
        let mut stack = ScopeStack::new();
        let (a, _) = stack.enter("A", &config()).unwrap();
        let (b, _) = stack.enter("B", &config()).unwrap();
        assert!(matches!(
            stack.exit(a, "R"),
            Err(WorkspaceError::IllegalState { .. })
        ));
        assert_eq!(stack.depth("A"), 1);
        stack.exit(b, "R").unwrap();
        stack.exit(a, "R").unwrap();
    }

    #[test]
    fn double_exit_rejected() {
        let mut stack = ScopeStack::new();
        let (a, _) = stack.enter("A", &config()).unwrap();
        stack.exit(a, "R").unwrap();
        let err = stack.exit(a, "R").unwrap_err();
        assert_eq!(
            err,
            WorkspaceError::IllegalState {
                role: "R",
                message: "scope already closed".into(),
            }
        );
    }

    #[test]
    fn repair_removes_inner_frame() {
        let mut stack = ScopeStack::new();
        let (a, _) = stack.enter("A", &config()).unwrap();
        let (b, _) = stack.enter("B", &config()).unwrap();
        assert!(stack.repair(a));
        assert_eq!(stack.depth("A"), 0);
        assert_eq!(stack.current(), Some(Some("B")));
        stack.exit(b, "R").unwrap();
        assert_eq!(stack.current(), None);
        assert!(!stack.repair(a));
    }

    #[test]
    fn scoped_out_frame_has_no_target() {
        let mut stack = ScopeStack::new();
        let (a, _) = stack.enter("A", &config()).unwrap();
        let out = stack.enter_scoped_out();
        assert_eq!(stack.current(), Some(None));
        assert_eq!(stack.depth("A"), 1);
        stack.exit(out, "R").unwrap();
        assert_eq!(stack.current(), Some(Some("A")));
        stack.exit(a, "R").unwrap();
    }

    #[test]
    fn invalid_config_fails_entry_without_frame() {
        let mut stack = ScopeStack::new();
        let bad = WorkspaceConfig::default().with_cycles_before_reset(0);
        assert!(stack.enter("A", &bad).is_err());
        assert_eq!(stack.current(), None);
        assert_eq!(stack.depth("A"), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn depth_matches_net_nesting(
                ops in proptest::collection::vec(any::<bool>(), 1..40),
            ) {
                let mut stack = ScopeStack::new();
                let mut tokens = Vec::new();
                for enter in ops {
                    if enter {
                        let (t, _) = stack.enter("WS", &config()).unwrap();
                        tokens.push(t);
                    } else if let Some(t) = tokens.pop() {
                        stack.exit(t, "R").unwrap();
                    }
                    prop_assert_eq!(stack.depth("WS"), tokens.len());
                    prop_assert_eq!(stack.open_workspace("WS").is_some(), !tokens.is_empty());
                }
                while let Some(t) = tokens.pop() {
                    stack.exit(t, "R").unwrap();
                }
                prop_assert_eq!(stack.depth("WS"), 0);
            }
        }
    }
}
