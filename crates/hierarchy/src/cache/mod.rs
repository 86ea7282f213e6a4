//! Set-associative cache array.
//!
//! This module implements the tag store of one cache level. It tracks
//! `(tag, valid, replacement metadata)` per way - no data bytes, since the
//! simulated quantity is latency - and supports hit/miss lookup plus victim
//! selection under a configurable replacement policy.

/// Cache replacement policy implementations (LRU, Random, RRIP).
pub mod policies;

use self::policies::{LruPolicy, RandomPolicy, ReplacementPolicy, RripPolicy};
use crate::common::addr::CacheGeometry;
use crate::common::error::HierarchyError;
use crate::config::{CacheConfig, ReplacementPolicy as PolicyKind};

/// One way of one set: a tag, a valid bit, and the policy's metadata word.
///
/// `meta` is the recency rank under LRU and the RRPV under RRIP; the Random
/// policy ignores it.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheBlock {
    /// High address bits identifying the block held in this way.
    pub tag: u32,
    /// Whether this way holds a block at all.
    pub valid: bool,
    /// Replacement metadata, interpreted by the active policy.
    pub meta: u32,
}

/// Outcome of a cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The block is present in the given way.
    Hit {
        /// The way that matched.
        way: usize,
    },
    /// The block is absent.
    Miss,
}

/// Tag store of one set-associative cache level.
///
/// Blocks are stored flat; set `s` occupies ways
/// `s * num_ways .. (s + 1) * num_ways`.
pub struct CacheArray {
    geometry: CacheGeometry,
    blocks: Vec<CacheBlock>,
    policy: Box<dyn ReplacementPolicy>,
}

impl std::fmt::Debug for CacheArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheArray")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl CacheArray {
    /// Creates a cache array from the given level configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotPowerOfTwo`] if the configured
    /// dimensions do not describe a valid geometry.
    pub fn new(config: &CacheConfig) -> Result<Self, HierarchyError> {
        let geometry = CacheGeometry::new(config.size_bytes, config.ways, config.block_bytes)?;

        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyKind::Lru => Box::new(LruPolicy::new()),
            PolicyKind::Random => Box::new(RandomPolicy::new()),
            PolicyKind::Rrip => Box::new(RripPolicy::new()),
        };

        let ways = geometry.num_ways() as usize;
        let total = geometry.num_sets() as usize * ways;
        let blocks = (0..total)
            .map(|i| CacheBlock {
                tag: 0,
                valid: false,
                meta: policy.initial_meta(i % ways),
            })
            .collect();

        Ok(Self {
            geometry,
            blocks,
            policy,
        })
    }

    /// This level's geometry.
    #[inline]
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Looks up `addr`, updating replacement metadata on a hit.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MisalignedAddress`] if `addr` is not word
    /// aligned.
    pub fn probe(&mut self, addr: u32) -> Result<ProbeOutcome, HierarchyError> {
        let parts = self.geometry.decompose(addr)?;
        let set = self.set_range(parts.set as usize);
        let blocks = &mut self.blocks[set];

        let hit = blocks
            .iter()
            .position(|block| block.valid && block.tag == parts.tag);
        match hit {
            Some(way) => {
                self.policy.on_hit(blocks, way);
                Ok(ProbeOutcome::Hit { way })
            }
            None => Ok(ProbeOutcome::Miss),
        }
    }

    /// Installs the block containing `addr`, evicting a victim if needed.
    ///
    /// Invalid ways are filled first (lowest index wins); once the set is
    /// full the replacement policy chooses the victim.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MisalignedAddress`] if `addr` is not word
    /// aligned.
    ///
    /// # Returns
    ///
    /// The way the block was installed into.
    pub fn install(&mut self, addr: u32) -> Result<usize, HierarchyError> {
        let parts = self.geometry.decompose(addr)?;
        let set = self.set_range(parts.set as usize);
        let blocks = &mut self.blocks[set];

        let way = match blocks.iter().position(|block| !block.valid) {
            Some(invalid) => invalid,
            None => self.policy.select_victim(blocks),
        };

        blocks[way].tag = parts.tag;
        blocks[way].valid = true;
        self.policy.on_install(blocks, way);
        Ok(way)
    }

    /// Whether the block containing `addr` is present. No metadata update.
    pub fn contains(&self, addr: u32) -> bool {
        self.geometry.decompose(addr).is_ok_and(|parts| {
            self.blocks[self.set_range(parts.set as usize)]
                .iter()
                .any(|block| block.valid && block.tag == parts.tag)
        })
    }

    /// Read-only view of one set's ways, for inspection and statistics.
    ///
    /// # Panics
    ///
    /// Panics if `set` is out of range.
    pub fn set_blocks(&self, set: usize) -> &[CacheBlock] {
        &self.blocks[self.set_range(set)]
    }

    /// The flat index range of one set's ways.
    const fn set_range(&self, set: usize) -> std::ops::Range<usize> {
        let ways = self.geometry.num_ways() as usize;
        set * ways..(set + 1) * ways
    }
}
