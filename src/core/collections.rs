//! Optimized Collection Types
//!
//! This module provides type aliases for collections used throughout the crate,
//! chosen for performance in the combinatorial hot paths (skeleton walks and
//! cone enumeration).
//!
//! # Key Features
//!
//! - **Fast Hashing**: `FastHashMap`/`FastHashSet` use `rustc-hash` (FxHash),
//!   a fast non-cryptographic hash well suited to small integer keys such as
//!   (tetrahedron, facet) pairs.
//! - **Small Buffers**: `SmallBuffer` stores short sequences inline, avoiding
//!   heap allocation for the common cases (4 facets, 6 edges, a handful of
//!   face embeddings).
//!
//! # Examples
//!
//! ```rust
//! use trisurf::core::collections::{FastHashMap, SmallBuffer};
//!
//! let mut degrees: FastHashMap<usize, usize> = FastHashMap::default();
//! degrees.insert(0, 4);
//!
//! let mut facets: SmallBuffer<u8, 4> = SmallBuffer::new();
//! facets.extend_from_slice(&[0, 1, 2, 3]);
//! assert_eq!(facets.len(), 4);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Index of a tetrahedron within its triangulation (dense, 0-based).
pub type TetIndex = usize;

/// A facet number within a tetrahedron: 0, 1, 2 or 3.
pub type FacetNumber = u8;

/// Fast hash map for small integer-like keys.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast hash set for small integer-like keys.
pub type FastHashSet<K> = FxHashSet<K>;

/// Small buffer with inline storage for up to `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Maximum number of tetrahedra supported by the dehydration format.
pub const MAX_DEHYDRATION_SIZE: usize = 25;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffer_stays_inline_for_facets() {
        let mut buf: SmallBuffer<FacetNumber, 4> = SmallBuffer::new();
        buf.extend_from_slice(&[0, 1, 2, 3]);
        assert!(!buf.spilled(), "four facets should not hit the heap");
    }

    #[test]
    fn fast_hash_map_round_trip() {
        let mut map: FastHashMap<(TetIndex, FacetNumber), usize> = FastHashMap::default();
        map.insert((2, 3), 7);
        assert_eq!(map.get(&(2, 3)), Some(&7));
        assert_eq!(map.get(&(3, 2)), None);
    }
}
