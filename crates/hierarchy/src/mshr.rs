//! Miss status holding registers.
//!
//! The MSHR file is a small table of outstanding L1 misses. Concurrent
//! requests to the same block coalesce onto one entry, so a block in flight
//! generates no duplicate L2 or DRAM traffic. Each entry walks an explicit
//! state machine from allocation through queueing and the fill in flight to
//! ready-for-L1; the slot is released when the L1 fill completes.

use crate::cache::CacheArray;

/// Which side of the core issued the access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessSource {
    /// Instruction fetch, served by the L1 instruction cache.
    Instruction,
    /// Load from the memory stage, served by the L1 data cache.
    Data,
}

impl AccessSource {
    /// The L1 cache serving this source.
    pub(crate) fn pick<'a>(
        self,
        icache: &'a mut CacheArray,
        dcache: &'a mut CacheArray,
    ) -> &'a mut CacheArray {
        match self {
            Self::Instruction => icache,
            Self::Data => dcache,
        }
    }
}

/// Progress of one outstanding fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillState {
    /// The L2 lookup missed; the controller has not yet queued the request.
    WaitingForController,
    /// Waiting in the controller's request queue for DRAM command issue.
    InQueue,
    /// The L2 lookup hit; the fill reaches L1 at `ready_at`.
    L2Fill {
        /// Cycle the fill notification arrives.
        ready_at: u64,
    },
    /// DRAM commands are in flight; the fill reaches L2 at `ready_at`.
    DramFill {
        /// Cycle the returning data reaches L2.
        ready_at: u64,
    },
    /// The fill has arrived; the block can be installed into L1.
    Ready,
}

/// One outstanding miss.
#[derive(Clone, Copy, Debug)]
pub struct Mshr {
    /// Block-aligned address of the missing block.
    pub block_addr: u32,
    /// Which side of the core is stalled on this block.
    pub source: AccessSource,
    /// Where the fill currently stands.
    pub state: FillState,
}

/// Fixed-size table of outstanding misses.
#[derive(Debug)]
pub struct MshrFile {
    entries: Vec<Option<Mshr>>,
}

impl MshrFile {
    /// Creates an empty file with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity],
        }
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of slots currently tracking a miss.
    pub fn in_use(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    /// Finds the entry tracking `block_addr`, if any.
    ///
    /// At most one valid entry exists per block address, so the first match
    /// is the only match.
    pub fn find(&self, block_addr: u32) -> Option<usize> {
        self.entries.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|mshr| mshr.block_addr == block_addr)
        })
    }

    /// Claims a free slot for a new miss.
    ///
    /// The entry starts in [`FillState::WaitingForController`]; the L2 probe
    /// path overwrites the state on an L2 hit.
    ///
    /// # Returns
    ///
    /// The claimed slot index, or `None` if every slot is in use.
    pub fn allocate(&mut self, block_addr: u32, source: AccessSource) -> Option<usize> {
        let free = self.entries.iter().position(|slot| slot.is_none())?;
        self.entries[free] = Some(Mshr {
            block_addr,
            source,
            state: FillState::WaitingForController,
        });
        Some(free)
    }

    /// The entry in `slot`, if occupied.
    pub fn get(&self, slot: usize) -> Option<&Mshr> {
        self.entries.get(slot).and_then(Option::as_ref)
    }

    /// Mutable access to the entry in `slot`, if occupied.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Mshr> {
        self.entries.get_mut(slot).and_then(Option::as_mut)
    }

    /// Releases `slot` after the L1 fill consumed it.
    pub fn release(&mut self, slot: usize) {
        self.entries[slot] = None;
    }

    /// Iterates over the occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Mshr)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|mshr| (i, mshr)))
    }

    /// Iterates mutably over the occupied slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Mshr)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|mshr| (i, mshr)))
    }
}
