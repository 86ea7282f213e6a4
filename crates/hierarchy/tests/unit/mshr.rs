//! MSHR File Unit Tests.
//!
//! Verifies allocation, lookup by block address, capacity exhaustion, and
//! slot reuse after release.

use memsim_core::mshr::{AccessSource, FillState, MshrFile};

// ══════════════════════════════════════════════════════════
// 1. Allocation and lookup
// ══════════════════════════════════════════════════════════

/// A fresh allocation is findable and starts waiting for the controller.
#[test]
fn allocate_then_find() {
    let mut mshrs = MshrFile::new(16);
    assert_eq!(mshrs.find(0x1000), None);

    let slot = mshrs.allocate(0x1000, AccessSource::Data).unwrap();
    assert_eq!(mshrs.find(0x1000), Some(slot));
    assert_eq!(mshrs.in_use(), 1);

    let mshr = mshrs.get(slot).unwrap();
    assert_eq!(mshr.block_addr, 0x1000);
    assert_eq!(mshr.source, AccessSource::Data);
    assert_eq!(mshr.state, FillState::WaitingForController);
}

/// Lookup keys on the block address; neighbours do not match.
#[test]
fn find_is_per_block() {
    let mut mshrs = MshrFile::new(16);
    let _ = mshrs.allocate(0x1000, AccessSource::Data).unwrap();
    assert!(mshrs.find(0x1000).is_some());
    assert_eq!(mshrs.find(0x1020), None);
    assert_eq!(mshrs.find(0x0FE0), None);
}

/// Distinct blocks occupy distinct slots.
#[test]
fn distinct_blocks_distinct_slots() {
    let mut mshrs = MshrFile::new(16);
    let a = mshrs.allocate(0x1000, AccessSource::Data).unwrap();
    let b = mshrs.allocate(0x2000, AccessSource::Instruction).unwrap();
    assert_ne!(a, b);
    assert_eq!(mshrs.in_use(), 2);
}

// ══════════════════════════════════════════════════════════
// 2. Capacity
// ══════════════════════════════════════════════════════════

/// The seventeenth outstanding miss finds no slot.
#[test]
fn exhaustion_returns_none() {
    let mut mshrs = MshrFile::new(16);
    for i in 0..16u32 {
        assert!(mshrs.allocate(i * 0x20, AccessSource::Data).is_some());
    }
    assert_eq!(mshrs.in_use(), 16);
    assert_eq!(mshrs.allocate(16 * 0x20, AccessSource::Data), None);
}

/// Releasing a slot makes it allocatable again.
#[test]
fn release_reopens_slot() {
    let mut mshrs = MshrFile::new(2);
    let a = mshrs.allocate(0x1000, AccessSource::Data).unwrap();
    let _ = mshrs.allocate(0x2000, AccessSource::Data).unwrap();
    assert_eq!(mshrs.allocate(0x3000, AccessSource::Data), None);

    mshrs.release(a);
    assert_eq!(mshrs.find(0x1000), None);
    assert!(mshrs.allocate(0x3000, AccessSource::Data).is_some());
    assert_eq!(mshrs.in_use(), 2);
}

// ══════════════════════════════════════════════════════════
// 3. State updates
// ══════════════════════════════════════════════════════════

/// State written through `get_mut` is visible on the next lookup.
#[test]
fn state_updates_stick() {
    let mut mshrs = MshrFile::new(4);
    let slot = mshrs.allocate(0x1000, AccessSource::Data).unwrap();

    mshrs.get_mut(slot).unwrap().state = FillState::DramFill { ready_at: 260 };
    assert_eq!(
        mshrs.get(slot).unwrap().state,
        FillState::DramFill { ready_at: 260 }
    );

    mshrs.get_mut(slot).unwrap().state = FillState::Ready;
    assert_eq!(mshrs.get(slot).unwrap().state, FillState::Ready);
}

/// Iteration visits exactly the occupied slots.
#[test]
fn iter_visits_occupied_slots() {
    let mut mshrs = MshrFile::new(8);
    let a = mshrs.allocate(0x1000, AccessSource::Data).unwrap();
    let b = mshrs.allocate(0x2000, AccessSource::Data).unwrap();
    mshrs.release(a);

    let visited: Vec<usize> = mshrs.iter().map(|(slot, _)| slot).collect();
    assert_eq!(visited, [b]);
}
