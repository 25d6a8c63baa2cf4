//! Integration tests: borrowed workspaces and per-thread scope isolation.

mod common;

use std::thread;

use common::{fill_iota, standard_mgr, Role};
use strata_core::ArrayOrder;
use strata_workspace::WorkspaceError;

#[test]
fn worker_allocates_in_lenders_arena() {
    let mgr = standard_mgr();
    let scope = mgr.notify_scope_entered(Role::Input).unwrap();
    let arena = scope.workspace().unwrap().id();
    let borrowed = mgr.notify_scope_borrowed(Role::Input).unwrap();
    assert_eq!(borrowed.name(), Some("WS_INPUT"));

    let array = thread::scope(|s| {
        s.spawn(|| {
            // The worker has its own, empty scope stack.
            assert!(!mgr.is_workspace_open(Role::Input));
            let mut a = borrowed.create(&[2, 2], ArrayOrder::RowMajor).unwrap();
            fill_iota(&mut a);
            a
        })
        .join()
        .unwrap()
    });

    assert_eq!(array.owner_id(), Some(arena));
    let array = mgr
        .validate_array_location(Role::Input, array, false, true)
        .unwrap();
    assert_eq!(array.to_vec().unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
    scope.close().unwrap();
}

#[test]
fn borrow_does_not_affect_nesting() {
    let mgr = standard_mgr();
    let scope = mgr.notify_scope_entered(Role::Input).unwrap();
    let _borrowed = mgr.notify_scope_borrowed(Role::Input).unwrap();
    scope.close().unwrap();
    assert!(!mgr.is_workspace_open(Role::Input));
}

#[test]
fn borrow_fails_after_lender_closes() {
    let mgr = standard_mgr();
    let scope = mgr.notify_scope_entered(Role::Input).unwrap();
    let borrowed = mgr.notify_scope_borrowed(Role::Input).unwrap();
    scope.close().unwrap();
    assert!(!borrowed.is_valid());

    // Reopening does not revive the old borrow.
    let _again = mgr.notify_scope_entered(Role::Input).unwrap();
    let err = thread::scope(|s| {
        s.spawn(|| borrowed.create(&[1], ArrayOrder::RowMajor).unwrap_err())
            .join()
            .unwrap()
    });
    assert!(matches!(err, WorkspaceError::IllegalState { role: "INPUT", .. }));
}

#[test]
fn borrowing_closed_workspace_fails() {
    let mgr = standard_mgr();
    let err = mgr.notify_scope_borrowed(Role::Input).unwrap_err();
    assert!(matches!(err, WorkspaceError::IllegalState { .. }));
}

#[test]
fn borrowing_scoped_out_role_gives_heap() {
    let mgr = standard_mgr();
    let borrowed = mgr.notify_scope_borrowed(Role::Temp).unwrap();
    assert!(borrowed.is_heap());
    assert!(borrowed.is_valid());
    let a = borrowed.create(&[3], ArrayOrder::RowMajor).unwrap();
    assert!(!a.is_attached());
}

#[test]
fn worker_dup_copies_into_lenders_arena() {
    let mgr = standard_mgr();
    let _scope = mgr.notify_scope_entered(Role::Activation).unwrap();
    let borrowed = mgr.notify_scope_borrowed(Role::Activation).unwrap();
    let mut source = strata_arena::NdArray::zeros(&[2, 3], ArrayOrder::RowMajor).unwrap();
    fill_iota(&mut source);

    let copy = thread::scope(|s| {
        s.spawn(|| borrowed.dup(&source, ArrayOrder::ColumnMajor).unwrap())
            .join()
            .unwrap()
    });
    assert_eq!(copy.owner_name(), Some("WS_ACT"));
    assert_eq!(copy.to_logical_vec().unwrap(), source.to_logical_vec().unwrap());
}

#[test]
fn threads_open_independent_arenas() {
    let mgr = standard_mgr();
    let ids: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let scope = mgr.notify_scope_entered(Role::Gradient).unwrap();
                    let id = scope.workspace().unwrap().id();
                    let a = mgr.create(Role::Gradient, &[16]).unwrap();
                    assert_eq!(a.owner_id(), Some(id));
                    scope.close().unwrap();
                    id
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(!mgr.is_workspace_open(Role::Gradient));
}
