//! Fixed-Size Permutation Algebra
//!
//! This module provides the permutation types `Perm3`, `Perm4` and `Perm5`,
//! bijections on {0,…,k−1} for k ∈ {3, 4, 5}. These are the combinatorial
//! workhorses of the crate: facet gluings twist by a `Perm4`, face embeddings
//! carry canonical vertex permutations, and the isomorphism signature
//! canonicalisation minimises over all of S₄.
//!
//! # Key Features
//!
//! - **Group operations**: composition (via `*`), inverse, signed parity.
//! - **Dense indexing**: a bijection with [0, k!) in lexicographic order of
//!   image tuples, so the identity always has index 0.
//! - **Lifting**: `Perm3` embeds into `Perm4` (and `Perm4` into `Perm5`)
//!   fixing the new top element.
//! - **Const construction**: `raw` allows permutation tables to live in
//!   `const` context.
//!
//! All operations are total and constant-time.
//!
//! # Examples
//!
//! ```rust
//! use trisurf::core::perm::Perm4;
//!
//! let p = Perm4::raw([1, 0, 3, 2]);
//! let q = Perm4::swap(2, 3);
//! assert_eq!((p * q).apply(2), 2);
//! assert_eq!(p.inverse() * p, Perm4::IDENTITY);
//! assert_eq!(Perm4::IDENTITY.index(), 0);
//! assert_eq!(Perm4::from_index(p.index()).unwrap(), p);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for permutation construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PermError {
    /// The image table is not a bijection on {0,…,k−1}.
    #[error("Image table {images:?} is not a permutation of 0..{degree}")]
    NotABijection {
        /// The offending image table.
        images: Vec<u8>,
        /// The degree k of the permutation.
        degree: u8,
    },
    /// A dense index lies outside [0, k!).
    #[error("Permutation index {index} out of range for degree {degree} (max {max})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The degree k of the permutation.
        degree: u8,
        /// The exclusive upper bound k!.
        max: usize,
    },
}

// =============================================================================
// PERMUTATION TYPES
// =============================================================================

macro_rules! define_perm {
    ($(#[$doc:meta])* $name:ident, $n:literal, $fact:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
                 Serialize, Deserialize)]
        pub struct $name {
            images: [u8; $n],
        }

        impl $name {
            /// The degree k of this permutation family.
            pub const DEGREE: u8 = $n;

            /// The group order k!.
            pub const ORDER: usize = $fact;

            /// The identity permutation (dense index 0).
            pub const IDENTITY: Self = {
                let mut images = [0u8; $n];
                let mut i = 0;
                while i < $n {
                    images[i] = i as u8;
                    i += 1;
                }
                Self { images }
            };

            /// Builds a permutation from an image table without validation.
            ///
            /// Intended for `const` tables whose entries are bijections by
            /// inspection; use [`Self::new`] for untrusted input.
            #[must_use]
            pub const fn raw(images: [u8; $n]) -> Self {
                Self { images }
            }

            /// Builds a permutation from an image table, validating that it
            /// is a bijection on {0,…,k−1}.
            ///
            /// # Errors
            ///
            /// Returns [`PermError::NotABijection`] if any image repeats or
            /// exceeds k−1.
            pub fn new(images: [u8; $n]) -> Result<Self, PermError> {
                let mut seen = [false; $n];
                for &x in &images {
                    if usize::from(x) >= $n || seen[usize::from(x)] {
                        return Err(PermError::NotABijection {
                            images: images.to_vec(),
                            degree: $n,
                        });
                    }
                    seen[usize::from(x)] = true;
                }
                Ok(Self { images })
            }

            /// The transposition exchanging `a` and `b` (the identity when
            /// `a == b`).
            ///
            /// # Panics
            ///
            /// Panics if `a` or `b` is not less than k (const-evaluated when
            /// used in `const` context).
            #[must_use]
            pub const fn swap(a: u8, b: u8) -> Self {
                assert!((a as usize) < $n && (b as usize) < $n);
                let mut images = Self::IDENTITY.images;
                images[a as usize] = b;
                images[b as usize] = a;
                Self { images }
            }

            /// The image of `i` under this permutation.
            ///
            /// # Panics
            ///
            /// Panics if `i >= k`.
            #[must_use]
            pub const fn apply(&self, i: u8) -> u8 {
                self.images[i as usize]
            }

            /// The preimage of `i` under this permutation.
            #[must_use]
            pub fn pre(&self, i: u8) -> u8 {
                for (j, &x) in self.images.iter().enumerate() {
                    if x == i {
                        return j as u8;
                    }
                }
                unreachable!("image table is a bijection")
            }

            /// The inverse permutation.
            #[must_use]
            pub fn inverse(&self) -> Self {
                let mut images = [0u8; $n];
                for (i, &x) in self.images.iter().enumerate() {
                    images[usize::from(x)] = i as u8;
                }
                Self { images }
            }

            /// The sign of this permutation: +1 for even, −1 for odd.
            #[must_use]
            pub fn sign(&self) -> i8 {
                let mut inversions = 0;
                for i in 0..$n {
                    for j in (i + 1)..$n {
                        if self.images[i] > self.images[j] {
                            inversions += 1;
                        }
                    }
                }
                if inversions % 2 == 0 { 1 } else { -1 }
            }

            /// The dense index of this permutation in [0, k!), ordering all
            /// of Sₖ lexicographically by image tuple. The identity has
            /// index 0.
            #[must_use]
            pub fn index(&self) -> usize {
                let mut rank = 0usize;
                let mut factorial = 1usize;
                for i in (0..$n).rev() {
                    let mut smaller_later = 0usize;
                    for j in (i + 1)..$n {
                        if self.images[j] < self.images[i] {
                            smaller_later += 1;
                        }
                    }
                    rank += smaller_later * factorial;
                    factorial *= $n - i;
                }
                rank
            }

            /// The permutation with the given dense index, inverting
            /// [`Self::index`].
            ///
            /// # Errors
            ///
            /// Returns [`PermError::IndexOutOfRange`] if `index >= k!`.
            pub fn from_index(index: usize) -> Result<Self, PermError> {
                if index >= Self::ORDER {
                    return Err(PermError::IndexOutOfRange {
                        index,
                        degree: $n,
                        max: Self::ORDER,
                    });
                }
                let mut remaining: Vec<u8> = (0..$n).map(|i| i as u8).collect();
                let mut images = [0u8; $n];
                let mut rem = index;
                let mut factorial = Self::ORDER;
                for i in 0..$n {
                    factorial /= $n - i;
                    let pick = rem / factorial;
                    rem %= factorial;
                    images[i] = remaining.remove(pick);
                }
                Ok(Self { images })
            }

            /// The raw image table.
            #[must_use]
            pub const fn images(&self) -> [u8; $n] {
                self.images
            }

            /// Iterates over all k! permutations in dense-index order.
            pub fn all() -> impl Iterator<Item = Self> {
                (0..Self::ORDER).map(|i| {
                    Self::from_index(i).expect("index < ORDER")
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::IDENTITY
            }
        }

        impl core::ops::Mul for $name {
            type Output = Self;

            /// Composition: `(p * q)(i) = p(q(i))`.
            fn mul(self, rhs: Self) -> Self {
                let mut images = [0u8; $n];
                for i in 0..$n {
                    images[i] = self.images[usize::from(rhs.images[i])];
                }
                Self { images }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                for &x in &self.images {
                    write!(f, "{x}")?;
                }
                Ok(())
            }
        }
    };
}

define_perm!(
    /// A permutation of {0, 1, 2}.
    Perm3, 3, 6
);
define_perm!(
    /// A permutation of {0, 1, 2, 3}. Facet gluings and face embeddings
    /// are expressed with this type.
    Perm4, 4, 24
);
define_perm!(
    /// A permutation of {0, 1, 2, 3, 4}.
    Perm5, 5, 120
);

// =============================================================================
// LIFTING
// =============================================================================

impl Perm3 {
    /// Embeds this permutation into S₄, fixing the new element 3.
    #[must_use]
    pub fn lift(&self) -> Perm4 {
        let im = self.images();
        Perm4::raw([im[0], im[1], im[2], 3])
    }
}

impl Perm4 {
    /// Embeds this permutation into S₅, fixing the new element 4.
    #[must_use]
    pub fn lift(&self) -> Perm5 {
        let im = self.images();
        Perm5::raw([im[0], im[1], im[2], im[3], 4])
    }

    /// Restricts a permutation fixing 3 back down to S₃.
    ///
    /// Returns `None` if the permutation moves 3.
    #[must_use]
    pub fn restrict(&self) -> Option<Perm3> {
        let im = self.images();
        if im[3] != 3 {
            return None;
        }
        Some(Perm3::raw([im[0], im[1], im[2]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_index_zero() {
        assert_eq!(Perm3::IDENTITY.index(), 0);
        assert_eq!(Perm4::IDENTITY.index(), 0);
        assert_eq!(Perm5::IDENTITY.index(), 0);
    }

    #[test]
    fn index_round_trip_all_of_s4() {
        for i in 0..Perm4::ORDER {
            let p = Perm4::from_index(i).unwrap();
            assert_eq!(p.index(), i, "rank/unrank must agree at {i}");
        }
    }

    #[test]
    fn index_is_lexicographic() {
        // Index 1 must be the first non-identity tuple in lex order.
        assert_eq!(Perm4::from_index(1).unwrap(), Perm4::raw([0, 1, 3, 2]));
        assert_eq!(
            Perm4::from_index(Perm4::ORDER - 1).unwrap(),
            Perm4::raw([3, 2, 1, 0])
        );
    }

    #[test]
    fn composition_matches_definition() {
        let p = Perm4::raw([2, 0, 3, 1]);
        let q = Perm4::raw([1, 3, 0, 2]);
        let r = p * q;
        for i in 0..4 {
            assert_eq!(r.apply(i), p.apply(q.apply(i)));
        }
    }

    #[test]
    fn inverse_left_and_right() {
        for p in Perm4::all() {
            assert_eq!(p * p.inverse(), Perm4::IDENTITY);
            assert_eq!(p.inverse() * p, Perm4::IDENTITY);
        }
    }

    #[test]
    fn sign_is_a_homomorphism() {
        for p in Perm4::all() {
            for q in [Perm4::swap(0, 1), Perm4::raw([1, 2, 0, 3])] {
                assert_eq!((p * q).sign(), p.sign() * q.sign());
            }
        }
    }

    #[test]
    fn transposition_is_odd() {
        assert_eq!(Perm4::swap(1, 3).sign(), -1);
        assert_eq!(Perm4::swap(2, 2).sign(), 1);
    }

    #[test]
    fn lift_fixes_top_element_and_preserves_index_zero() {
        let p = Perm3::raw([2, 0, 1]);
        let lifted = p.lift();
        assert_eq!(lifted.apply(3), 3);
        assert_eq!(lifted.restrict(), Some(p));
        assert_eq!(Perm3::IDENTITY.lift(), Perm4::IDENTITY);
    }

    #[test]
    fn new_rejects_non_bijections() {
        assert!(Perm4::new([0, 1, 2, 2]).is_err());
        assert!(Perm4::new([0, 1, 2, 4]).is_err());
        assert!(Perm4::new([3, 1, 0, 2]).is_ok());
    }

    #[test]
    fn from_index_rejects_out_of_range() {
        assert!(matches!(
            Perm4::from_index(24),
            Err(PermError::IndexOutOfRange { index: 24, .. })
        ));
    }
}
