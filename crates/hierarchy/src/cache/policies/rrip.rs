//! Static 2-bit Re-Reference Interval Prediction (RRIP) replacement policy.
//!
//! Each block's `meta` field holds a 2-bit re-reference prediction value
//! (RRPV). A block predicted to be re-referenced soon has a low RRPV; a
//! block predicted distant is the eviction candidate. The static variant
//! always inserts new blocks with a long prediction and promotes hits to
//! immediate.
//!
//! Reference: Jaleel et al., "High Performance Cache Replacement Using
//! Re-Reference Interval Prediction (RRIP)", ISCA 2010.

use super::ReplacementPolicy;
use crate::cache::CacheBlock;

/// RRPV for a block expected to be re-referenced immediately.
pub const RRPV_IMMEDIATE: u32 = 0;

/// RRPV assigned to newly inserted blocks.
pub const RRPV_LONG: u32 = 2;

/// RRPV marking a block as a distant-future re-reference (the victim).
pub const RRPV_DISTANT: u32 = 3;

/// Static 2-bit RRIP policy. Stateless; the RRPVs live in the blocks.
#[derive(Debug, Default)]
pub struct RripPolicy;

impl RripPolicy {
    /// Creates a new RRIP policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for RripPolicy {
    fn initial_meta(&self, _way: usize) -> u32 {
        RRPV_LONG
    }

    /// A hit predicts an immediate re-reference.
    fn on_hit(&mut self, blocks: &mut [CacheBlock], way: usize) {
        blocks[way].meta = RRPV_IMMEDIATE;
    }

    /// New blocks are inserted with a long re-reference prediction.
    fn on_install(&mut self, blocks: &mut [CacheBlock], way: usize) {
        blocks[way].meta = RRPV_LONG;
    }

    /// Scans for a distant block, aging the whole set until one appears.
    ///
    /// Each aging pass raises every valid RRPV below the distant value by
    /// one, saturating at [`RRPV_DISTANT`]; with all ways valid the scan is
    /// guaranteed to find a victim within three passes.
    fn select_victim(&mut self, blocks: &mut [CacheBlock]) -> usize {
        loop {
            if let Some(way) = blocks.iter().position(|block| block.meta == RRPV_DISTANT) {
                return way;
            }
            for block in blocks.iter_mut() {
                if block.valid && block.meta < RRPV_DISTANT {
                    block.meta += 1;
                }
            }
        }
    }
}
