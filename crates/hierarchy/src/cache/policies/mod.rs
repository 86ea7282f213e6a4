//! Cache replacement policies.
//!
//! Implements the victim-selection algorithms for set-associative caches.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Random`: Pseudo-random selection.
//! - `Rrip`: Static 2-bit Re-Reference Interval Prediction.
//!
//! Replacement metadata lives in each [`CacheBlock`]'s `meta` field; a policy
//! interprets that field its own way (recency rank for LRU, re-reference
//! prediction value for RRIP, unused for Random). Policies operate on one
//! set at a time, receiving the set's blocks as a slice.

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

/// Static 2-bit RRIP replacement policy.
pub mod rrip;

pub use lru::LruPolicy;
pub use random::RandomPolicy;
pub use rrip::RripPolicy;

use crate::cache::CacheBlock;

/// Trait for cache replacement policies.
///
/// The cache array resolves invalid ways itself; [`Self::select_victim`] is
/// only consulted when every way in the set holds a valid block.
pub trait ReplacementPolicy: Send + Sync {
    /// Metadata value for a way that has never held a block.
    ///
    /// # Arguments
    ///
    /// * `way` - The way index within the set.
    fn initial_meta(&self, way: usize) -> u32;

    /// Updates metadata after a lookup hit.
    ///
    /// # Arguments
    ///
    /// * `blocks` - The blocks of the accessed set.
    /// * `way` - The way that hit.
    fn on_hit(&mut self, blocks: &mut [CacheBlock], way: usize);

    /// Updates metadata after a block is installed.
    ///
    /// # Arguments
    ///
    /// * `blocks` - The blocks of the accessed set.
    /// * `way` - The way that received the new block.
    fn on_install(&mut self, blocks: &mut [CacheBlock], way: usize);

    /// Picks the way to evict from a fully valid set.
    ///
    /// # Arguments
    ///
    /// * `blocks` - The blocks of the accessed set; every entry is valid.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn select_victim(&mut self, blocks: &mut [CacheBlock]) -> usize;
}
