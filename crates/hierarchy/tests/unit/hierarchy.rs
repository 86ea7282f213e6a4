//! End-to-End Hierarchy Scenarios.
//!
//! Drives the full L1 / MSHR / L2 / DRAM pipeline through the issuer-facing
//! API and checks the exact stall cycles: the all-miss cold path, open-row
//! and conflicting follow-ups, the fixed L2 hit latency, miss coalescing,
//! MSHR exhaustion, and the replacement behavior visible from outside.
//!
//! Protocol per simulated cycle: the issuer presents at most one access,
//! then calls `tick` for that cycle and polls `fill_ready` while stalled.

use memsim_core::cache::policies::rrip::{RRPV_DISTANT, RRPV_LONG};
use memsim_core::config::{HierarchyConfig, ReplacementPolicy};
use memsim_core::hierarchy::{AccessStatus, MemoryHierarchy};
use memsim_core::mshr::AccessSource;
use pretty_assertions::assert_eq;

fn hierarchy() -> MemoryHierarchy {
    MemoryHierarchy::new(&HierarchyConfig::default()).unwrap()
}

/// Accesses `addr`, and on a miss ticks until the fill completes.
///
/// Returns with `cycle` advanced to the cycle after the access finished,
/// so the caller can keep issuing back-to-back.
fn fetch(h: &mut MemoryHierarchy, source: AccessSource, addr: u32, cycle: &mut u64) {
    match h.l1_access(source, addr, *cycle).unwrap() {
        AccessStatus::Hit => *cycle += 1,
        AccessStatus::MissPending => {
            while !h.fill_ready(source, addr) {
                h.tick(*cycle).unwrap();
                *cycle += 1;
                assert!(*cycle < 1_000_000, "fill for {addr:#x} never completed");
            }
            h.complete_fill(source, addr).unwrap();
        }
        AccessStatus::NoMshr => panic!("unexpected MSHR exhaustion for {addr:#x}"),
    }
}

// ══════════════════════════════════════════════════════════
// 1. Cold all-miss path
// ══════════════════════════════════════════════════════════

/// The canonical cold miss: L1 miss, L2 miss, queued at cycle 0 with
/// arrival 5, issued at 5 with two commands, ready at
/// 5 + 200 + 50 + 5 = 260; the replay at 261 hits.
#[test]
fn cold_miss_completes_at_cycle_260() {
    let mut h = hierarchy();

    assert_eq!(
        h.l1_access(AccessSource::Data, 0x1000, 0).unwrap(),
        AccessStatus::MissPending
    );

    for cycle in 0..260 {
        h.tick(cycle).unwrap();
        assert!(
            !h.fill_ready(AccessSource::Data, 0x1000),
            "fill must not be ready after tick {cycle}"
        );
    }
    h.tick(260).unwrap();
    assert!(h.fill_ready(AccessSource::Data, 0x1000));

    h.complete_fill(AccessSource::Data, 0x1000).unwrap();
    assert_eq!(
        h.l1_access(AccessSource::Data, 0x1000, 261).unwrap(),
        AccessStatus::Hit
    );

    let stats = h.stats();
    assert_eq!(stats.dcache_misses, 1);
    assert_eq!(stats.dcache_hits, 1);
    assert_eq!(stats.l2_misses, 1);
    assert_eq!(stats.row_buffer_misses, 1);
    assert_eq!(stats.l1_fills, 1);
    assert_eq!(h.mshrs().in_use(), 0);
}

/// Follow-up to the open row: one command, ready 160 cycles after the
/// access that queued it. A third access to another row of the same bank
/// conflicts and pays for three commands.
#[test]
fn row_hit_then_conflict_timing() {
    let mut h = hierarchy();
    let mut cycle = 0;
    fetch(&mut h, AccessSource::Data, 0x1000, &mut cycle);
    assert_eq!(cycle, 261);

    // Same bank 0, same row 0. Queued at 261 (arrival 266), issued at 266,
    // ready at 266 + 100 + 50 + 5 = 421.
    assert_eq!(
        h.l1_access(AccessSource::Data, 0x1100, 261).unwrap(),
        AccessStatus::MissPending
    );
    for c in 261..421 {
        h.tick(c).unwrap();
        assert!(!h.fill_ready(AccessSource::Data, 0x1100));
    }
    h.tick(421).unwrap();
    assert!(h.fill_ready(AccessSource::Data, 0x1100));
    h.complete_fill(AccessSource::Data, 0x1100).unwrap();
    assert_eq!(h.stats().row_buffer_hits, 1);

    // Bank 0 row 1: precharge + activate + read. Queued at 422 (arrival
    // 427), issued at 427, ready at 427 + 300 + 50 + 5 = 782.
    assert_eq!(
        h.l1_access(AccessSource::Data, 0x2000, 422).unwrap(),
        AccessStatus::MissPending
    );
    for c in 422..782 {
        h.tick(c).unwrap();
        assert!(!h.fill_ready(AccessSource::Data, 0x2000));
    }
    h.tick(782).unwrap();
    assert!(h.fill_ready(AccessSource::Data, 0x2000));
    assert_eq!(h.stats().row_buffer_conflicts, 1);
}

// ══════════════════════════════════════════════════════════
// 2. L2 hit path
// ══════════════════════════════════════════════════════════

/// A block brought in through the data side sits in L2; an instruction
/// fetch of the same block then misses L1-I, hits L2, and fills after
/// exactly the 15-cycle L2 latency.
#[test]
fn l2_hit_fills_after_fixed_latency() {
    let mut h = hierarchy();
    let mut cycle = 0;
    fetch(&mut h, AccessSource::Data, 0x4000, &mut cycle);

    assert_eq!(
        h.l1_access(AccessSource::Instruction, 0x4000, 300).unwrap(),
        AccessStatus::MissPending
    );
    assert_eq!(h.stats().l2_hits, 1);

    // Ready exactly at 300 + 15.
    for c in 300..315 {
        h.tick(c).unwrap();
        assert!(!h.fill_ready(AccessSource::Instruction, 0x4000));
    }
    h.tick(315).unwrap();
    assert!(h.fill_ready(AccessSource::Instruction, 0x4000));

    h.complete_fill(AccessSource::Instruction, 0x4000).unwrap();
    assert_eq!(
        h.l1_access(AccessSource::Instruction, 0x4000, 316).unwrap(),
        AccessStatus::Hit
    );
}

// ══════════════════════════════════════════════════════════
// 3. Coalescing
// ══════════════════════════════════════════════════════════

/// Two misses to the same block in consecutive cycles share one MSHR and
/// generate a single L2 probe; after the fill, both words hit.
#[test]
fn same_block_misses_coalesce() {
    let mut h = hierarchy();

    assert_eq!(
        h.l1_access(AccessSource::Data, 0xA000, 0).unwrap(),
        AccessStatus::MissPending
    );
    h.tick(0).unwrap();
    assert_eq!(
        h.l1_access(AccessSource::Data, 0xA004, 1).unwrap(),
        AccessStatus::MissPending
    );

    assert_eq!(h.mshrs().in_use(), 1);
    assert_eq!(h.stats().l2_misses, 1, "the coalesced miss must not probe L2");
    assert_eq!(h.stats().coalesced_misses, 1);

    let mut cycle = 1;
    while !h.fill_ready(AccessSource::Data, 0xA000) {
        h.tick(cycle).unwrap();
        cycle += 1;
    }
    h.complete_fill(AccessSource::Data, 0xA000).unwrap();

    assert_eq!(
        h.l1_access(AccessSource::Data, 0xA000, cycle).unwrap(),
        AccessStatus::Hit
    );
    assert_eq!(
        h.l1_access(AccessSource::Data, 0xA004, cycle + 1).unwrap(),
        AccessStatus::Hit
    );
    assert_eq!(h.mshrs().in_use(), 0);
}

// ══════════════════════════════════════════════════════════
// 4. MSHR exhaustion
// ══════════════════════════════════════════════════════════

/// Sixteen outstanding blocks fill the MSHR file; the seventeenth miss is
/// turned away without touching L2.
#[test]
fn seventeenth_outstanding_miss_gets_no_mshr() {
    let mut h = hierarchy();

    for i in 0..16u32 {
        assert_eq!(
            h.l1_access(AccessSource::Data, i * 0x20, 0).unwrap(),
            AccessStatus::MissPending,
            "block {i}"
        );
    }
    assert_eq!(h.mshrs().in_use(), 16);
    let l2_misses_before = h.stats().l2_misses;

    assert_eq!(
        h.l1_access(AccessSource::Data, 16 * 0x20, 0).unwrap(),
        AccessStatus::NoMshr
    );
    assert_eq!(h.mshrs().in_use(), 16);
    assert_eq!(h.stats().l2_misses, l2_misses_before);
}

// ══════════════════════════════════════════════════════════
// 5. Errors
// ══════════════════════════════════════════════════════════

/// A misaligned address is an issuer bug, reported as an error.
#[test]
fn misaligned_access_is_an_error() {
    let mut h = hierarchy();
    assert!(h.l1_access(AccessSource::Data, 0x1002, 0).is_err());
}

// ══════════════════════════════════════════════════════════
// 6. Replacement behavior end to end
// ══════════════════════════════════════════════════════════

/// Nine blocks through one L1-D set under LRU: the ninth fill evicts the
/// first block fetched, and only that one.
#[test]
fn lru_eviction_visible_from_outside() {
    let mut h = hierarchy();
    let mut cycle = 0;

    // t * 0x2000 keeps set index 0 in L1-D while varying the tag.
    for t in 0..9u32 {
        fetch(&mut h, AccessSource::Data, t * 0x2000, &mut cycle);
    }

    assert!(!h.dcache().contains(0), "tag 0 was the LRU victim");
    for t in 1..9u32 {
        assert!(h.dcache().contains(t * 0x2000), "tag {t} must survive");
    }

    // The set's valid recencies still form a permutation of 0..8.
    let mut recencies: Vec<u32> = h
        .dcache()
        .set_blocks(0)
        .iter()
        .filter(|block| block.valid)
        .map(|block| block.meta)
        .collect();
    recencies.sort_unstable();
    assert_eq!(recencies, (0..8).collect::<Vec<u32>>());
}

/// Under static RRIP, filling a set inserts everything at the long RRPV;
/// the ninth fill ages the set to distant and replaces way 0.
#[test]
fn rrip_insertion_visible_from_outside() {
    let mut config = HierarchyConfig::default();
    config.l1_d.policy = ReplacementPolicy::Rrip;
    let mut h = MemoryHierarchy::new(&config).unwrap();
    let mut cycle = 0;

    for t in 0..9u32 {
        fetch(&mut h, AccessSource::Data, t * 0x2000, &mut cycle);
    }

    assert!(!h.dcache().contains(0), "way 0 aged to distant first");
    for t in 1..9u32 {
        assert!(h.dcache().contains(t * 0x2000), "tag {t} must survive");
    }

    let blocks = h.dcache().set_blocks(0);
    assert_eq!(blocks[0].meta, RRPV_LONG, "fresh insertion predicts long");
    for (way, block) in blocks.iter().enumerate().skip(1) {
        assert_eq!(block.meta, RRPV_DISTANT, "way {way} aged to distant");
    }
}
