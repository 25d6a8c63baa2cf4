//! Benchmark profiles for the Strata workspace manager.
//!
//! Provides pre-built [`WorkspaceMgr`] profiles for benchmarking:
//!
//! - [`training_profile`]: layer-wise training layout with shared working memory
//! - [`inference_profile`]: activations in an arena, everything else on the heap
//! - [`layer_shapes`]: a fixed sequence of activation shapes for a small MLP

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_core::{ArrayType, OverAllocationPolicy, WorkspaceConfig};
use strata_workspace::WorkspaceMgr;

/// Arena size used by the profiles for activation memory.
pub const ACTIVATION_BYTES: usize = 4 << 20;

/// Arena size used by the profiles for working memory.
pub const WORKING_BYTES: usize = 1 << 20;

/// Build a training profile.
///
/// Input and activations share one arena; forward and backward working
/// memory share another; recurrent loops get their own. Gradients, the
/// updater and the forward cache stay on the heap.
pub fn training_profile() -> WorkspaceMgr<ArrayType> {
    let act = WorkspaceConfig::new(ACTIVATION_BYTES)
        .with_over_allocation(OverAllocationPolicy::Overallocate { percent: 20 });
    let working = WorkspaceConfig::new(WORKING_BYTES);
    WorkspaceMgr::builder()
        .with(ArrayType::Input, "WS_LAYER_ACT", act.clone())
        .with(ArrayType::Activations, "WS_LAYER_ACT", act)
        .with(ArrayType::FfWorkingMem, "WS_LAYER_WORKING_MEM", working.clone())
        .with(ArrayType::BpWorkingMem, "WS_LAYER_WORKING_MEM", working.clone())
        .with(ArrayType::RnnFfLoopWorkingMem, "WS_RNN_LOOP_WORKING_MEM", working.clone())
        .with(ArrayType::RnnBpLoopWorkingMem, "WS_RNN_LOOP_WORKING_MEM", working)
        .default_no_workspace()
        .build()
}

/// Build an inference profile: only activations live in an arena.
pub fn inference_profile() -> WorkspaceMgr<ArrayType> {
    WorkspaceMgr::builder()
        .with(
            ArrayType::Activations,
            "WS_INFERENCE_ACT",
            WorkspaceConfig::new(ACTIVATION_BYTES),
        )
        .default_no_workspace()
        .build()
}

/// Activation shapes of a small MLP at the given batch size.
pub fn layer_shapes(batch: usize) -> Vec<[usize; 2]> {
    [784, 256, 128, 64, 10]
        .into_iter()
        .map(|width| [batch, width])
        .collect()
}
