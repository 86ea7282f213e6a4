//! Cache geometry and address decomposition.
//!
//! Addresses are 32-bit and word aligned (the low two bits are always zero).
//! A [`CacheGeometry`] captures one cache level's shape and splits an address
//! into tag, set index, and block offset:
//!
//! ```text
//! | tag                      | set index | block offset |
//!   31 .. offset+set bits      set_bits    offset_bits
//! ```
//!
//! Decomposition and [`CacheGeometry::compose`] are exact inverses for every
//! word-aligned address, which the scheduler and the caches rely on when they
//! reconstruct block base addresses.

use super::error::HierarchyError;

/// The tag/set/offset split of one address under a given geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddrParts {
    /// High bits identifying the block within its set.
    pub tag: u32,
    /// Middle bits selecting the set.
    pub set: u32,
    /// Low bits locating the word inside the block.
    pub offset: u32,
}

/// Shape of one set-associative cache level.
///
/// All three dimensions are powers of two; `capacity = num_sets * num_ways *
/// block_bytes`. The shift amounts are derived once at construction so the
/// per-access decomposition is two shifts and a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheGeometry {
    num_sets: u32,
    num_ways: u32,
    block_bytes: u32,
    offset_bits: u32,
    set_bits: u32,
}

impl CacheGeometry {
    /// Derives a geometry from total capacity, associativity, and block size.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotPowerOfTwo`] if the block size, the way
    /// count, or the derived set count is not a power of two.
    pub fn new(
        capacity_bytes: u32,
        num_ways: u32,
        block_bytes: u32,
    ) -> Result<Self, HierarchyError> {
        if !block_bytes.is_power_of_two() {
            return Err(HierarchyError::NotPowerOfTwo {
                name: "block_bytes",
                value: block_bytes,
            });
        }
        if !num_ways.is_power_of_two() {
            return Err(HierarchyError::NotPowerOfTwo {
                name: "num_ways",
                value: num_ways,
            });
        }
        let num_sets = capacity_bytes / (block_bytes * num_ways);
        if !num_sets.is_power_of_two() {
            return Err(HierarchyError::NotPowerOfTwo {
                name: "num_sets",
                value: num_sets,
            });
        }
        Ok(Self {
            num_sets,
            num_ways,
            block_bytes,
            offset_bits: block_bytes.trailing_zeros(),
            set_bits: num_sets.trailing_zeros(),
        })
    }

    /// Number of sets.
    #[inline]
    pub const fn num_sets(&self) -> u32 {
        self.num_sets
    }

    /// Associativity (ways per set).
    #[inline]
    pub const fn num_ways(&self) -> u32 {
        self.num_ways
    }

    /// Block size in bytes.
    #[inline]
    pub const fn block_bytes(&self) -> u32 {
        self.block_bytes
    }

    /// Total capacity in bytes.
    #[inline]
    pub const fn capacity_bytes(&self) -> u32 {
        self.num_sets * self.num_ways * self.block_bytes
    }

    /// Splits a word-aligned address into tag, set, and offset.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MisalignedAddress`] if the low two bits of
    /// `addr` are nonzero.
    pub fn decompose(&self, addr: u32) -> Result<AddrParts, HierarchyError> {
        if addr & 0x3 != 0 {
            return Err(HierarchyError::MisalignedAddress(addr));
        }
        Ok(AddrParts {
            tag: addr >> (self.offset_bits + self.set_bits),
            set: (addr >> self.offset_bits) & ((1 << self.set_bits) - 1),
            offset: addr & (self.block_bytes - 1),
        })
    }

    /// Reassembles an address from its parts. Inverse of [`Self::decompose`].
    #[inline]
    pub const fn compose(&self, parts: AddrParts) -> u32 {
        (parts.tag << (self.offset_bits + self.set_bits))
            | (parts.set << self.offset_bits)
            | parts.offset
    }

    /// The base address of the block containing `addr`.
    #[inline]
    pub const fn block_base(&self, addr: u32) -> u32 {
        addr & !(self.block_bytes - 1)
    }
}
