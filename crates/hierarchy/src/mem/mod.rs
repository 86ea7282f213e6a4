//! Banked DRAM model and the memory controller.
//!
//! This module provides:
//! 1. **Banks:** Per-bank row-buffer state and busy windows (`bank`).
//! 2. **Controller:** The per-cycle FR-FCFS command scheduler (`controller`).
//!
//! DRAM address mapping is fixed: bits `[7:5]` select one of the eight
//! banks (consecutive blocks interleave across banks) and bits `[31:13]`
//! select the row, giving 8 KiB rows.

/// DRAM bank row-buffer state.
pub mod bank;

/// FR-FCFS memory controller.
pub mod controller;

pub use bank::{Bank, RowBufferStatus};
pub use controller::{MemController, MemRequest, RequestSource};

/// Low bit of the bank index field.
pub const BANK_SHIFT: u32 = 5;

/// Low bit of the row index field.
pub const ROW_SHIFT: u32 = 13;

/// The bank an address maps to. `num_banks` must be a power of two.
#[inline]
pub const fn bank_index(addr: u32, num_banks: usize) -> usize {
    (addr >> BANK_SHIFT) as usize & (num_banks - 1)
}

/// The DRAM row an address maps to.
#[inline]
pub const fn row_index(addr: u32) -> u32 {
    addr >> ROW_SHIFT
}
