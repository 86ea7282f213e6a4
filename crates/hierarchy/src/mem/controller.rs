//! FR-FCFS memory controller.
//!
//! The controller owns the DRAM request queue and the bank states. Once per
//! global cycle it:
//! 1. Marks fills whose deadline has arrived, installing returning DRAM
//!    data into L2 at that moment.
//! 2. Admits freshly missed L2 requests into the queue, stamped with the
//!    L2-to-memory wire delay.
//! 3. Picks at most one schedulable request under First-Ready FCFS (open-row
//!    hits first, then arrival order, then loads over fetches) and issues
//!    its DRAM commands.
//!
//! Scheduling honors three exclusions: one request per bank at a time, no
//! overlap on the shared command/address bus, and no overlap on the shared
//! data bus. All three are checked against the absolute timing windows of
//! requests already in flight.

use tracing::{debug, trace};

use super::bank::{Bank, RowBufferStatus};
use super::{bank_index, row_index};
use crate::cache::CacheArray;
use crate::common::error::HierarchyError;
use crate::config::MemoryConfig;
use crate::mshr::{AccessSource, FillState, MshrFile};
use crate::stats::HierarchyStats;

/// Which pipeline stage is waiting on a request. Loads outrank fetches when
/// everything else ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestSource {
    /// A load from the memory stage.
    MemStage,
    /// An instruction fetch.
    Fetch,
}

/// One queued DRAM read request.
#[derive(Clone, Copy, Debug)]
pub struct MemRequest {
    /// Block-aligned target address.
    pub addr: u32,
    /// Cycle the request becomes visible to the scheduler.
    pub arrival: u64,
    /// Issuing pipeline stage, for the final tie-break.
    pub source: RequestSource,
    /// Index of the MSHR tracking this miss.
    pub mshr: usize,
}

/// The banked-DRAM memory controller.
pub struct MemController {
    config: MemoryConfig,
    queue: Vec<MemRequest>,
    banks: Vec<Bank>,
}

impl std::fmt::Debug for MemController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemController")
            .field("queued", &self.queue.len())
            .field("banks", &self.banks)
            .finish_non_exhaustive()
    }
}

impl MemController {
    /// Creates a controller with all banks closed and an empty queue.
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            config: config.clone(),
            queue: Vec::with_capacity(config.num_mshrs),
            banks: vec![Bank::default(); config.num_banks],
        }
    }

    /// Read-only view of the bank states.
    #[inline]
    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Read-only view of the request queue.
    #[inline]
    pub fn queue(&self) -> &[MemRequest] {
        &self.queue
    }

    /// Advances the controller by one cycle.
    ///
    /// # Errors
    ///
    /// Propagates [`HierarchyError`] from the L2 install path; with
    /// block-aligned addresses in every MSHR this does not occur.
    pub fn tick(
        &mut self,
        now: u64,
        mshrs: &mut MshrFile,
        l2: &mut CacheArray,
        stats: &mut HierarchyStats,
    ) -> Result<(), HierarchyError> {
        Self::complete_fills(now, mshrs, l2)?;
        self.admit_misses(now, mshrs, stats);
        self.issue_one(now, mshrs, stats);
        Ok(())
    }

    /// Marks fills whose deadline has arrived.
    ///
    /// A DRAM fill also installs the returning block into L2 here: the data
    /// is on the wire back to L2 exactly when the deadline elapses.
    fn complete_fills(
        now: u64,
        mshrs: &mut MshrFile,
        l2: &mut CacheArray,
    ) -> Result<(), HierarchyError> {
        for (slot, mshr) in mshrs.iter_mut() {
            match mshr.state {
                FillState::L2Fill { ready_at } if ready_at <= now => {
                    mshr.state = FillState::Ready;
                    trace!(slot, addr = mshr.block_addr, "L2 fill ready");
                }
                FillState::DramFill { ready_at } if ready_at <= now => {
                    let _ = l2.install(mshr.block_addr)?;
                    mshr.state = FillState::Ready;
                    trace!(slot, addr = mshr.block_addr, "DRAM fill ready, installed into L2");
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Moves freshly missed L2 requests into the queue.
    ///
    /// The arrival stamp carries the L2-to-memory wire delay; the scheduler
    /// will not consider the request before that cycle.
    fn admit_misses(&mut self, now: u64, mshrs: &mut MshrFile, stats: &mut HierarchyStats) {
        for (slot, mshr) in mshrs.iter_mut() {
            if mshr.state != FillState::WaitingForController {
                continue;
            }
            let source = match mshr.source {
                AccessSource::Data => RequestSource::MemStage,
                AccessSource::Instruction => RequestSource::Fetch,
            };
            self.queue.push(MemRequest {
                addr: mshr.block_addr,
                arrival: now + self.config.l2_to_mem_latency,
                source,
                mshr: slot,
            });
            mshr.state = FillState::InQueue;
            stats.dram_requests += 1;
        }
        // Every queued request holds a distinct MSHR, so the queue can
        // never outgrow the MSHR file.
        assert!(
            self.queue.len() <= mshrs.capacity(),
            "request queue exceeded MSHR count"
        );
    }

    /// Selects and issues at most one request under FR-FCFS.
    fn issue_one(&mut self, now: u64, mshrs: &mut MshrFile, stats: &mut HierarchyStats) {
        let mut best: Option<usize> = None;
        for (i, &req) in self.queue.iter().enumerate() {
            if now < req.arrival || !self.schedulable(req, now) {
                continue;
            }
            best = match best {
                Some(incumbent) if !self.wins(req, self.queue[incumbent]) => Some(incumbent),
                _ => Some(i),
            };
        }
        let Some(chosen) = best else {
            return;
        };

        let req = self.queue.remove(chosen);
        let target = bank_index(req.addr, self.banks.len());
        let row = row_index(req.addr);
        let status = self.banks[target].row_status(row);
        match status {
            RowBufferStatus::Hit => stats.row_buffer_hits += 1,
            RowBufferStatus::Miss => stats.row_buffer_misses += 1,
            RowBufferStatus::Conflict => stats.row_buffer_conflicts += 1,
        }

        let commands = status.command_count();
        self.banks[target].begin_request(row, commands, now);

        let ready_at = now
            + commands * self.config.bank_busy_cycles
            + self.config.data_transfer_cycles
            + self.config.mem_to_l2_latency;
        if let Some(mshr) = mshrs.get_mut(req.mshr) {
            mshr.state = FillState::DramFill { ready_at };
        }
        debug!(
            addr = req.addr,
            bank = target,
            row,
            ?status,
            ready_at,
            "issued DRAM request"
        );
    }

    /// FR-FCFS ordering: does `challenger` outrank `incumbent`?
    ///
    /// Open-row hits first; then earlier arrival; then loads over fetches.
    fn wins(&self, challenger: MemRequest, incumbent: MemRequest) -> bool {
        let challenger_hit = self.is_open_row(challenger.addr);
        let incumbent_hit = self.is_open_row(incumbent.addr);
        if challenger_hit != incumbent_hit {
            return challenger_hit;
        }
        if challenger.arrival != incumbent.arrival {
            return challenger.arrival < incumbent.arrival;
        }
        challenger.source == RequestSource::MemStage && incumbent.source == RequestSource::Fetch
    }

    /// Whether `addr` targets the currently open row of its bank.
    fn is_open_row(&self, addr: u32) -> bool {
        let bank = &self.banks[bank_index(addr, self.banks.len())];
        bank.open_row == Some(row_index(addr))
    }

    /// Whether `req` can begin its command sequence at `now` without
    /// conflicting with any request already in flight.
    fn schedulable(&self, req: MemRequest, now: u64) -> bool {
        let target = bank_index(req.addr, self.banks.len());
        let row = row_index(req.addr);
        let commands = self.banks[target].row_status(row).command_count();
        let timing = &self.config;

        // Shared command/address bus: none of our command slots may overlap
        // a command slot of a request in flight on another bank.
        for k in 0..commands {
            let start = now + k * timing.bank_busy_cycles;
            let end = start + timing.command_cycles - 1;
            for (b, bank) in self.banks.iter().enumerate() {
                if b == target || bank.commands == 0 {
                    continue;
                }
                for j in 0..bank.commands {
                    let other_start = bank.busy_start + j * timing.bank_busy_cycles;
                    let other_end = other_start + timing.command_cycles - 1;
                    if start <= other_end && other_start <= end {
                        return false;
                    }
                }
            }
        }

        // Shared data bus: block transfers are contiguous and exclusive.
        let data_start = now + commands * timing.bank_busy_cycles;
        let data_end = data_start + timing.data_transfer_cycles - 1;
        for (b, bank) in self.banks.iter().enumerate() {
            if b == target || bank.commands == 0 {
                continue;
            }
            let other_start = bank.busy_start + bank.commands * timing.bank_busy_cycles;
            let other_end = other_start + timing.data_transfer_cycles - 1;
            if data_start <= other_end && other_start <= data_end {
                return false;
            }
        }

        // The target bank must have drained its previous request.
        let bank = &self.banks[target];
        if bank.commands != 0 {
            let busy_end = bank.busy_start + bank.commands * timing.bank_busy_cycles - 1;
            if now <= busy_end {
                return false;
            }
        }

        true
    }
}
