//! Arbitrary-length bitmasks for tracking coordinate supports.
//!
//! Enumeration algorithms spend most of their time asking set questions
//! about which coordinates of a vector are non-zero: subset tests for
//! adjacency, intersection counts for admissibility.  [`Bitmask`] packs
//! these supports into `u64` blocks so every such test is a handful of
//! word operations.

use serde::{Deserialize, Serialize};

const BLOCK_BITS: usize = 64;

/// A fixed-length mask of bits, one per coordinate position.
///
/// # Examples
///
/// ```
/// use trisurf::enumerate::Bitmask;
///
/// let mut a = Bitmask::new(100);
/// a.set(3, true);
/// a.set(70, true);
/// let mut b = Bitmask::new(100);
/// b.set(3, true);
/// assert!(b.is_subset_of(&a));
/// assert_eq!(a.count_ones(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitmask {
    bits: usize,
    blocks: Vec<u64>,
}

impl Bitmask {
    /// Creates a mask of `bits` zero bits.
    pub fn new(bits: usize) -> Bitmask {
        Bitmask {
            bits,
            blocks: vec![0; bits.div_ceil(BLOCK_BITS)],
        }
    }

    /// The number of bit positions in this mask.
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Is this mask empty of set bits?
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| *b == 0)
    }

    /// Returns bit `i`.
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.bits);
        self.blocks[i / BLOCK_BITS] & (1u64 << (i % BLOCK_BITS)) != 0
    }

    /// Sets bit `i` to `value`.
    pub fn set(&mut self, i: usize, value: bool) {
        debug_assert!(i < self.bits);
        let block = &mut self.blocks[i / BLOCK_BITS];
        let bit = 1u64 << (i % BLOCK_BITS);
        if value {
            *block |= bit;
        } else {
            *block &= !bit;
        }
    }

    /// Replaces this mask with its union with `other`.
    pub fn union_with(&mut self, other: &Bitmask) {
        debug_assert_eq!(self.bits, other.bits);
        for (a, b) in self.blocks.iter_mut().zip(&other.blocks) {
            *a |= b;
        }
    }

    /// Replaces this mask with its intersection with `other`.
    pub fn intersect_with(&mut self, other: &Bitmask) {
        debug_assert_eq!(self.bits, other.bits);
        for (a, b) in self.blocks.iter_mut().zip(&other.blocks) {
            *a &= b;
        }
    }

    /// The union of two masks.
    pub fn union(&self, other: &Bitmask) -> Bitmask {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// The intersection of two masks.
    pub fn intersection(&self, other: &Bitmask) -> Bitmask {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    /// Is every set bit of this mask also set in `other`?
    pub fn is_subset_of(&self, other: &Bitmask) -> bool {
        debug_assert_eq!(self.bits, other.bits);
        self.blocks
            .iter()
            .zip(&other.blocks)
            .all(|(a, b)| a & !b == 0)
    }

    /// Do the two masks share no set bits?
    pub fn is_disjoint_from(&self, other: &Bitmask) -> bool {
        debug_assert_eq!(self.bits, other.bits);
        self.blocks.iter().zip(&other.blocks).all(|(a, b)| a & b == 0)
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// The number of set bits shared with `other`.
    pub fn count_common(&self, other: &Bitmask) -> usize {
        debug_assert_eq!(self.bits, other.bits);
        self.blocks
            .iter()
            .zip(&other.blocks)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Iterates over the indices of all set bits, in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.bits).filter(move |i| self.get(*i))
    }
}

/// A compiled set of "at most one of these coordinates" constraints.
///
/// Built once from the per-simplex admissibility groups, then queried with
/// support masks during enumeration.
#[derive(Clone, Debug)]
pub struct ConstraintMasks {
    masks: Vec<Bitmask>,
}

impl ConstraintMasks {
    /// Compiles constraint groups over a coordinate space of `bits`
    /// positions.
    pub fn new(bits: usize, groups: &[Vec<usize>]) -> ConstraintMasks {
        let masks = groups
            .iter()
            .map(|group| {
                let mut mask = Bitmask::new(bits);
                for &col in group {
                    mask.set(col, true);
                }
                mask
            })
            .collect();
        ConstraintMasks { masks }
    }

    /// A set with no constraints at all.
    pub fn none() -> ConstraintMasks {
        ConstraintMasks { masks: Vec::new() }
    }

    /// Does the given support satisfy every constraint?
    pub fn admits(&self, support: &Bitmask) -> bool {
        self.masks.iter().all(|m| m.count_common(support) <= 1)
    }

    /// The individual constraint masks.
    pub fn masks(&self) -> &[Bitmask] {
        &self.masks
    }

    /// The maximal admissible faces of the orthant in a space of `dim`
    /// coordinates: one coordinate chosen from each constraint group, with
    /// every unconstrained coordinate always allowed.
    pub fn maximal_faces(&self, dim: usize) -> Vec<Bitmask> {
        let mut base = Bitmask::new(dim);
        for i in 0..dim {
            base.set(i, true);
        }
        for group in &self.masks {
            for i in group.ones() {
                base.set(i, false);
            }
        }

        let mut faces = vec![base];
        for group in &self.masks {
            let mut next = Vec::with_capacity(faces.len() * group.count_ones());
            for face in &faces {
                for col in group.ones() {
                    let mut chosen = face.clone();
                    chosen.set(col, true);
                    next.push(chosen);
                }
            }
            faces = next;
        }
        faces
    }
}
