//! The memory hierarchy aggregate and the issuer-facing access pipeline.
//!
//! This module owns the two L1 caches, the unified L2, the MSHR file, and
//! the memory controller, and exposes the four operations the surrounding
//! core drives them with:
//! 1. [`MemoryHierarchy::l1_access`] - probe L1, and on a miss coalesce into
//!    an outstanding fill or probe L2 within the same cycle.
//! 2. [`MemoryHierarchy::fill_ready`] - poll whether a stalled access can
//!    complete.
//! 3. [`MemoryHierarchy::complete_fill`] - install the returned block into
//!    L1 and release its MSHR.
//! 4. [`MemoryHierarchy::tick`] - advance the memory controller one cycle.
//!
//! The issuer owns the cycle counter and passes it in; the hierarchy keeps
//! no clock of its own.

use tracing::trace;

use crate::cache::{CacheArray, ProbeOutcome};
use crate::common::error::HierarchyError;
use crate::config::HierarchyConfig;
use crate::mem::MemController;
use crate::mshr::{AccessSource, FillState, MshrFile};
use crate::stats::HierarchyStats;

/// What the issuer learns from an L1 access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    /// The word is in L1; no stall.
    Hit,
    /// The block is on its way; stall and poll [`MemoryHierarchy::fill_ready`].
    MissPending,
    /// Every MSHR is busy; the access could not even probe L2. Stall and
    /// retry next cycle.
    NoMshr,
}

/// Two L1 caches, a unified L2, the MSHR file, and the memory controller.
#[derive(Debug)]
pub struct MemoryHierarchy {
    icache: CacheArray,
    dcache: CacheArray,
    l2: CacheArray,
    l2_hit_latency: u64,
    mshrs: MshrFile,
    controller: MemController,
    stats: HierarchyStats,
}

impl MemoryHierarchy {
    /// Builds the hierarchy described by `config`, all caches cold and all
    /// banks closed.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotPowerOfTwo`] if any cache dimension is
    /// not a power of two.
    pub fn new(config: &HierarchyConfig) -> Result<Self, HierarchyError> {
        Ok(Self {
            icache: CacheArray::new(&config.l1_i)?,
            dcache: CacheArray::new(&config.l1_d)?,
            l2: CacheArray::new(&config.l2)?,
            l2_hit_latency: config.l2.latency,
            mshrs: MshrFile::new(config.memory.num_mshrs),
            controller: MemController::new(&config.memory),
            stats: HierarchyStats::default(),
        })
    }

    /// Presents one word access to the L1 serving `source`.
    ///
    /// On a hit the access completes within this cycle. On a miss the block
    /// either coalesces into an outstanding fill or claims an MSHR and
    /// probes L2 in the same cycle; an L2 hit schedules the fill at a fixed
    /// latency, an L2 miss leaves the MSHR for the memory controller to
    /// pick up on its next tick.
    ///
    /// # Arguments
    ///
    /// * `source` - Which side of the core is accessing.
    /// * `addr` - Word-aligned address.
    /// * `now` - The issuer's current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MisalignedAddress`] if `addr` is not word
    /// aligned; the issuer must treat that as fatal.
    pub fn l1_access(
        &mut self,
        source: AccessSource,
        addr: u32,
        now: u64,
    ) -> Result<AccessStatus, HierarchyError> {
        let cache = source.pick(&mut self.icache, &mut self.dcache);

        if let ProbeOutcome::Hit { way } = cache.probe(addr)? {
            trace!(?source, addr, way, "L1 hit");
            match source {
                AccessSource::Instruction => self.stats.icache_hits += 1,
                AccessSource::Data => self.stats.dcache_hits += 1,
            }
            return Ok(AccessStatus::Hit);
        }

        trace!(?source, addr, "L1 miss");
        match source {
            AccessSource::Instruction => self.stats.icache_misses += 1,
            AccessSource::Data => self.stats.dcache_misses += 1,
        }

        let block_addr = cache.geometry().block_base(addr);
        if self.mshrs.find(block_addr).is_some() {
            // A fill for this block is already in flight; ride along.
            self.stats.coalesced_misses += 1;
            trace!(block_addr, "miss coalesced into outstanding fill");
            return Ok(AccessStatus::MissPending);
        }

        let Some(slot) = self.mshrs.allocate(block_addr, source) else {
            return Ok(AccessStatus::NoMshr);
        };

        // L2 probe happens in the same cycle as the L1 miss.
        match self.l2.probe(addr)? {
            ProbeOutcome::Hit { .. } => {
                self.stats.l2_hits += 1;
                let ready_at = now + self.l2_hit_latency;
                if let Some(mshr) = self.mshrs.get_mut(slot) {
                    mshr.state = FillState::L2Fill { ready_at };
                }
                trace!(block_addr, ready_at, "L2 hit, fill scheduled");
            }
            ProbeOutcome::Miss => {
                // Stays WaitingForController; the memory controller queues
                // it on its next tick.
                self.stats.l2_misses += 1;
                trace!(block_addr, "L2 miss, deferred to memory controller");
            }
        }
        Ok(AccessStatus::MissPending)
    }

    /// Whether the fill for the block containing `addr` has arrived.
    ///
    /// The issuer polls this each cycle while stalled on
    /// [`AccessStatus::MissPending`].
    pub fn fill_ready(&self, source: AccessSource, addr: u32) -> bool {
        let cache = match source {
            AccessSource::Instruction => &self.icache,
            AccessSource::Data => &self.dcache,
        };
        let block_addr = cache.geometry().block_base(addr);
        self.mshrs
            .find(block_addr)
            .and_then(|slot| self.mshrs.get(slot))
            .is_some_and(|mshr| mshr.state == FillState::Ready)
    }

    /// Installs the returned block into the L1 serving `source` and
    /// releases its MSHR.
    ///
    /// Call once [`Self::fill_ready`] reports true; the stalled access hits
    /// on its replay the following cycle.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MisalignedAddress`] if `addr` is not word
    /// aligned.
    pub fn complete_fill(&mut self, source: AccessSource, addr: u32) -> Result<(), HierarchyError> {
        let cache = source.pick(&mut self.icache, &mut self.dcache);
        let way = cache.install(addr)?;
        let block_addr = cache.geometry().block_base(addr);
        if let Some(slot) = self.mshrs.find(block_addr) {
            self.mshrs.release(slot);
        }
        self.stats.l1_fills += 1;
        trace!(?source, addr, way, "L1 fill complete");
        Ok(())
    }

    /// Advances the memory controller by one cycle.
    ///
    /// The issuer calls this exactly once per global cycle, before its own
    /// pipeline work, so that probes within the cycle observe completed
    /// fills.
    ///
    /// # Errors
    ///
    /// Propagates [`HierarchyError`] from the controller's L2 install path.
    pub fn tick(&mut self, now: u64) -> Result<(), HierarchyError> {
        self.controller
            .tick(now, &mut self.mshrs, &mut self.l2, &mut self.stats)
    }

    /// The run's statistics so far.
    #[inline]
    pub const fn stats(&self) -> &HierarchyStats {
        &self.stats
    }

    /// The L1 instruction cache.
    #[inline]
    pub const fn icache(&self) -> &CacheArray {
        &self.icache
    }

    /// The L1 data cache.
    #[inline]
    pub const fn dcache(&self) -> &CacheArray {
        &self.dcache
    }

    /// The unified L2 cache.
    #[inline]
    pub const fn l2(&self) -> &CacheArray {
        &self.l2
    }

    /// The MSHR file.
    #[inline]
    pub const fn mshrs(&self) -> &MshrFile {
        &self.mshrs
    }

    /// The memory controller.
    #[inline]
    pub const fn controller(&self) -> &MemController {
        &self.controller
    }
}
