//! Configuration for the memory hierarchy simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (cache shapes, DRAM timing).
//! 2. **Structures:** Hierarchical config for the three cache levels and the
//!    memory controller.
//! 3. **Enums:** Replacement policy selection.
//!
//! Configuration is supplied as JSON by the embedding shell, or use
//! `HierarchyConfig::default()` for the baseline machine.

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden.
mod defaults {
    /// Block (cache line) size in bytes for every level.
    pub const BLOCK_BYTES: u32 = 32;

    /// L1 instruction cache capacity (8 KiB).
    pub const ICACHE_BYTES: u32 = 8 * 1024;

    /// L1 instruction cache associativity.
    pub const ICACHE_WAYS: u32 = 4;

    /// L1 data cache capacity (64 KiB).
    pub const DCACHE_BYTES: u32 = 64 * 1024;

    /// L1 data cache associativity.
    pub const DCACHE_WAYS: u32 = 8;

    /// Unified L2 cache capacity (256 KiB).
    pub const L2_BYTES: u32 = 256 * 1024;

    /// Unified L2 cache associativity.
    pub const L2_WAYS: u32 = 16;

    /// L1 access latency in cycles (hits resolve within the probe cycle).
    pub const L1_LATENCY: u64 = 0;

    /// Cycles from an L2 hit to the fill notification reaching L1.
    pub const L2_LATENCY: u64 = 15;

    /// Number of miss status holding registers.
    pub const NUM_MSHRS: usize = 16;

    /// Number of DRAM banks.
    pub const NUM_BANKS: usize = 8;

    /// Cycles the shared command/address bus is held per DRAM command.
    pub const COMMAND_CYCLES: u64 = 4;

    /// Cycles a bank is busy processing one DRAM command.
    pub const BANK_BUSY_CYCLES: u64 = 100;

    /// Cycles the shared data bus is held to transfer one block.
    pub const DATA_TRANSFER_CYCLES: u64 = 50;

    /// Wire delay from the L2 miss path into the controller queue.
    pub const L2_TO_MEM_LATENCY: u64 = 5;

    /// Wire delay from the DRAM data buffer back to L2.
    pub const MEM_TO_L2_LATENCY: u64 = 5;
}

/// Cache replacement policy algorithms.
///
/// Selects which block to evict when a new block must be installed in a
/// full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used: evict the block untouched for the longest time.
    #[default]
    #[serde(alias = "Lru")]
    Lru,

    /// Random: evict a pseudo-randomly chosen block.
    #[serde(alias = "Random")]
    Random,

    /// Static 2-bit Re-Reference Interval Prediction.
    ///
    /// Each block carries a 2-bit re-reference prediction value; hits
    /// promote to immediate re-reference, installs predict a long interval,
    /// and eviction searches for a distant-future block.
    #[serde(alias = "Rrip")]
    Rrip,
}

/// Shape and behavior of one cache level.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total capacity in bytes.
    pub size_bytes: u32,

    /// Associativity (number of ways).
    pub ways: u32,

    /// Block size in bytes.
    #[serde(default = "CacheConfig::default_block")]
    pub block_bytes: u32,

    /// Cycles from a hit at this level to the fill notification.
    #[serde(default)]
    pub latency: u64,

    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    /// Returns the default block size in bytes.
    fn default_block() -> u32 {
        defaults::BLOCK_BYTES
    }

    /// Baseline L1 instruction cache: 8 KiB, 4-way, 32 B blocks.
    pub fn l1_instruction() -> Self {
        Self {
            size_bytes: defaults::ICACHE_BYTES,
            ways: defaults::ICACHE_WAYS,
            block_bytes: defaults::BLOCK_BYTES,
            latency: defaults::L1_LATENCY,
            policy: ReplacementPolicy::default(),
        }
    }

    /// Baseline L1 data cache: 64 KiB, 8-way, 32 B blocks.
    pub fn l1_data() -> Self {
        Self {
            size_bytes: defaults::DCACHE_BYTES,
            ways: defaults::DCACHE_WAYS,
            block_bytes: defaults::BLOCK_BYTES,
            latency: defaults::L1_LATENCY,
            policy: ReplacementPolicy::default(),
        }
    }

    /// Baseline unified L2: 256 KiB, 16-way, 32 B blocks, 15-cycle hits.
    pub fn l2() -> Self {
        Self {
            size_bytes: defaults::L2_BYTES,
            ways: defaults::L2_WAYS,
            block_bytes: defaults::BLOCK_BYTES,
            latency: defaults::L2_LATENCY,
            policy: ReplacementPolicy::default(),
        }
    }
}

/// DRAM organization and timing.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Number of DRAM banks.
    #[serde(default = "MemoryConfig::default_banks")]
    pub num_banks: usize,

    /// Number of miss status holding registers.
    #[serde(default = "MemoryConfig::default_mshrs")]
    pub num_mshrs: usize,

    /// Cycles the command/address bus is held per DRAM command.
    #[serde(default = "MemoryConfig::default_command")]
    pub command_cycles: u64,

    /// Cycles a bank is busy per DRAM command.
    #[serde(default = "MemoryConfig::default_bank_busy")]
    pub bank_busy_cycles: u64,

    /// Cycles the data bus is held to transfer one block.
    #[serde(default = "MemoryConfig::default_data_transfer")]
    pub data_transfer_cycles: u64,

    /// Wire delay from L2 to the controller queue.
    #[serde(default = "MemoryConfig::default_l2_to_mem")]
    pub l2_to_mem_latency: u64,

    /// Wire delay from DRAM back to L2.
    #[serde(default = "MemoryConfig::default_mem_to_l2")]
    pub mem_to_l2_latency: u64,
}

impl MemoryConfig {
    /// Returns the default DRAM bank count.
    fn default_banks() -> usize {
        defaults::NUM_BANKS
    }

    /// Returns the default MSHR count.
    fn default_mshrs() -> usize {
        defaults::NUM_MSHRS
    }

    /// Returns the default per-command bus occupancy.
    fn default_command() -> u64 {
        defaults::COMMAND_CYCLES
    }

    /// Returns the default per-command bank busy time.
    fn default_bank_busy() -> u64 {
        defaults::BANK_BUSY_CYCLES
    }

    /// Returns the default data transfer time.
    fn default_data_transfer() -> u64 {
        defaults::DATA_TRANSFER_CYCLES
    }

    /// Returns the default L2-to-memory wire delay.
    fn default_l2_to_mem() -> u64 {
        defaults::L2_TO_MEM_LATENCY
    }

    /// Returns the default memory-to-L2 wire delay.
    fn default_mem_to_l2() -> u64 {
        defaults::MEM_TO_L2_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            num_banks: defaults::NUM_BANKS,
            num_mshrs: defaults::NUM_MSHRS,
            command_cycles: defaults::COMMAND_CYCLES,
            bank_busy_cycles: defaults::BANK_BUSY_CYCLES,
            data_transfer_cycles: defaults::DATA_TRANSFER_CYCLES,
            l2_to_mem_latency: defaults::L2_TO_MEM_LATENCY,
            mem_to_l2_latency: defaults::MEM_TO_L2_LATENCY,
        }
    }
}

/// Root configuration for the whole memory hierarchy.
///
/// # Examples
///
/// Overriding the data cache policy from JSON while keeping every other
/// default:
///
/// ```
/// use memsim_core::config::{HierarchyConfig, ReplacementPolicy};
///
/// let json = r#"{
///     "l1_d": {
///         "size_bytes": 65536,
///         "ways": 8,
///         "policy": "RRIP"
///     }
/// }"#;
///
/// let config: HierarchyConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.l1_d.policy, ReplacementPolicy::Rrip);
/// assert_eq!(config.l1_i.size_bytes, 8 * 1024);
/// assert_eq!(config.memory.bank_busy_cycles, 100);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyConfig {
    /// L1 instruction cache.
    #[serde(default = "CacheConfig::l1_instruction")]
    pub l1_i: CacheConfig,

    /// L1 data cache.
    #[serde(default = "CacheConfig::l1_data")]
    pub l1_d: CacheConfig,

    /// Unified L2 cache.
    #[serde(default = "CacheConfig::l2")]
    pub l2: CacheConfig,

    /// DRAM organization and timing.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            l1_i: CacheConfig::l1_instruction(),
            l1_d: CacheConfig::l1_data(),
            l2: CacheConfig::l2(),
            memory: MemoryConfig::default(),
        }
    }
}
