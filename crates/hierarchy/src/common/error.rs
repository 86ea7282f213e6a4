//! Error definitions for the memory hierarchy.
//!
//! Only two conditions are errors: a misaligned word address (an issuer bug)
//! and an impossible cache geometry (a configuration bug). Everything else
//! the hierarchy can report (cache misses, row-buffer misses, busy buses)
//! is normal operation and shows up as latency, not as an error value.

use thiserror::Error;

/// Errors surfaced by the memory hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The issuer presented an address whose low two bits are nonzero.
    ///
    /// Every access is word-sized; the issuer must align addresses before
    /// presenting them. Treat this as fatal.
    #[error("address {0:#010x} is not word aligned")]
    MisalignedAddress(u32),

    /// A cache dimension that must be a power of two is not.
    ///
    /// Set count, way count, and block size all feed shift/mask indexing,
    /// which only works for power-of-two values.
    #[error("cache dimension {name} = {value} is not a power of two")]
    NotPowerOfTwo {
        /// Which dimension was rejected.
        name: &'static str,
        /// The offending value.
        value: u32,
    },
}
