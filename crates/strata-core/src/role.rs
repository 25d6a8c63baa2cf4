//! Semantic array roles.
//!
//! A role names *what an array is for* (an input, an activation, a
//! gradient, scratch memory) rather than where it lives. The workspace
//! manager maps each role to an arena.

use std::fmt;
use std::hash::Hash;

/// A member of a closed, caller-defined set of array roles.
///
/// Roles are plain identity values: they are used as map keys and in error
/// messages, and `ALL` lists every member so that a manager can apply a
/// default to every role (see `default_no_workspace` on the manager builder).
///
/// ```
/// use strata_core::ArrayRole;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Role { Input, Temp }
///
/// impl ArrayRole for Role {
///     const ALL: &'static [Self] = &[Role::Input, Role::Temp];
///     fn name(&self) -> &'static str {
///         match self {
///             Role::Input => "input",
///             Role::Temp => "temp",
///         }
///     }
/// }
///
/// assert_eq!(Role::ALL.len(), 2);
/// ```
pub trait ArrayRole: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every member of the role set, in declaration order.
    const ALL: &'static [Self];

    /// Stable, human-readable name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Standard roles for layer-wise neural network execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayType {
    /// Network or layer input.
    Input,
    /// Layer output activations.
    Activations,
    /// Gradient with respect to activations.
    ActivationGrad,
    /// Working memory for the forward pass.
    FfWorkingMem,
    /// Working memory for the backward pass.
    BpWorkingMem,
    /// Working memory inside a recurrent forward loop.
    RnnFfLoopWorkingMem,
    /// Working memory inside a recurrent backward loop.
    RnnBpLoopWorkingMem,
    /// Working memory for parameter updaters.
    UpdaterWorkingMem,
    /// Forward-pass values cached for reuse in the backward pass.
    FfCache,
}

impl ArrayRole for ArrayType {
    const ALL: &'static [Self] = &[
        Self::Input,
        Self::Activations,
        Self::ActivationGrad,
        Self::FfWorkingMem,
        Self::BpWorkingMem,
        Self::RnnFfLoopWorkingMem,
        Self::RnnBpLoopWorkingMem,
        Self::UpdaterWorkingMem,
        Self::FfCache,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Activations => "ACTIVATIONS",
            Self::ActivationGrad => "ACTIVATION_GRAD",
            Self::FfWorkingMem => "FF_WORKING_MEM",
            Self::BpWorkingMem => "BP_WORKING_MEM",
            Self::RnnFfLoopWorkingMem => "RNN_FF_LOOP_WORKING_MEM",
            Self::RnnBpLoopWorkingMem => "RNN_BP_LOOP_WORKING_MEM",
            Self::UpdaterWorkingMem => "UPDATER_WORKING_MEM",
            Self::FfCache => "FF_CACHE",
        }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_lists_every_variant_once() {
        let distinct: HashSet<_> = ArrayType::ALL.iter().collect();
        assert_eq!(distinct.len(), ArrayType::ALL.len());
        assert_eq!(ArrayType::ALL.len(), 9);
    }

    #[test]
    fn names_are_distinct() {
        let names: HashSet<_> = ArrayType::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), ArrayType::ALL.len());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(ArrayType::FfWorkingMem.to_string(), "FF_WORKING_MEM");
    }
}
