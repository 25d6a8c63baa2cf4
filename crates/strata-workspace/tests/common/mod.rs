//! Shared fixtures for workspace manager integration tests.

#![allow(dead_code)]

use strata_core::{ArrayRole, WorkspaceConfig};
use strata_workspace::WorkspaceMgr;

/// Roles used across the integration tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Input,
    Activation,
    Gradient,
    Working,
    Temp,
}

impl ArrayRole for Role {
    const ALL: &'static [Self] = &[
        Role::Input,
        Role::Activation,
        Role::Gradient,
        Role::Working,
        Role::Temp,
    ];

    fn name(&self) -> &'static str {
        match self {
            Role::Input => "INPUT",
            Role::Activation => "ACTIVATION",
            Role::Gradient => "GRADIENT",
            Role::Working => "WORKING",
            Role::Temp => "TEMP",
        }
    }
}

pub const ONE_MB: usize = 1024 * 1024;

/// Input, Activation and Gradient each get their own 1MB arena;
/// Working is left unconfigured; Temp is scoped-out.
pub fn standard_mgr() -> WorkspaceMgr<Role> {
    WorkspaceMgr::builder()
        .with(Role::Input, "WS_INPUT", WorkspaceConfig::new(ONE_MB))
        .with(Role::Activation, "WS_ACT", WorkspaceConfig::new(ONE_MB))
        .with(Role::Gradient, "WS_GRAD", WorkspaceConfig::new(ONE_MB))
        .scoped_out(Role::Temp)
        .build()
}

/// Fill an array with `0, 1, 2, ...` in physical order.
pub fn fill_iota(array: &mut strata_arena::NdArray) {
    array
        .with_data_mut(|d| {
            for (i, v) in d.iter_mut().enumerate() {
                *v = i as f32;
            }
        })
        .unwrap();
}
