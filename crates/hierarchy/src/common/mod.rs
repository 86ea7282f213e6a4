//! Common types shared across the memory hierarchy.
//!
//! This module collects the leaf definitions every other module builds on:
//! 1. **Addressing:** Cache geometry and the tag/set/offset decomposition.
//! 2. **Errors:** The crate-wide error enum.

/// Cache geometry and address decomposition.
pub mod addr;

/// Crate-wide error definitions.
pub mod error;

pub use addr::{AddrParts, CacheGeometry};
pub use error::HierarchyError;
