//! Dehydration Strings
//!
//! A dehydration string is a compact, purely lowercase encoding of a small
//! triangulation (at most 25 tetrahedra), suitable for embedding in census
//! files and tables. Unlike an isomorphism signature it is *not* canonical:
//! it records the gluing table exactly as labelled, so relabelling a
//! triangulation changes its dehydration. Rehydrating a dehydration always
//! reproduces the original labelling.
//!
//! # Format
//!
//! - The first letter encodes the number of tetrahedra `n` as `'a' + n`
//!   (so `n ≤ 25` keeps everything within `'a'…'z'`).
//! - Facet slots are visited in order (tetrahedron, then facet). A slot
//!   whose gluing was already recorded from its partner is skipped. A
//!   boundary slot contributes the single letter `z`; a gluing contributes
//!   the destination tetrahedron (`'a' + index`) followed by the gluing
//!   permutation (`'a' + lexicographic rank`).

use thiserror::Error;

use super::collections::{FacetNumber, MAX_DEHYDRATION_SIZE};
use super::perm::Perm4;
use super::triangulation::Triangulation;

/// Error type for dehydration and rehydration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DehydrationError {
    /// The triangulation is too large to dehydrate.
    #[error("Cannot dehydrate {size} tetrahedra (limit is {max})")]
    TooLarge {
        /// The triangulation size.
        size: usize,
        /// The dehydration limit.
        max: usize,
    },
    /// The empty triangulation has no dehydration.
    #[error("The empty triangulation cannot be dehydrated")]
    Empty,
    /// A character outside `'a'…'z'`.
    #[error("Invalid character {character:?} in dehydration string")]
    InvalidCharacter {
        /// The offending character.
        character: char,
    },
    /// The string ended before its encoded content did.
    #[error("Dehydration string is truncated")]
    Truncated,
    /// The encoded content is inconsistent.
    #[error("Dehydration string is malformed: {reason}")]
    Malformed {
        /// What went wrong.
        reason: &'static str,
    },
}

const BOUNDARY_MARK: u8 = 25;

/// Produces the dehydration string of a triangulation with at most
/// [`MAX_DEHYDRATION_SIZE`] tetrahedra.
///
/// # Errors
///
/// Fails with [`DehydrationError::TooLarge`] above the size limit and
/// [`DehydrationError::Empty`] for the empty triangulation.
pub fn dehydrate(tri: &Triangulation) -> Result<String, DehydrationError> {
    let n = tri.size();
    if n == 0 {
        return Err(DehydrationError::Empty);
    }
    if n > MAX_DEHYDRATION_SIZE {
        return Err(DehydrationError::TooLarge {
            size: n,
            max: MAX_DEHYDRATION_SIZE,
        });
    }
    let letter = |v: u8| (b'a' + v) as char;
    let mut out = String::new();
    out.push(letter(n as u8));
    for t in 0..n {
        for f in 0..4u8 {
            match tri.gluing(t, f) {
                None => out.push(letter(BOUNDARY_MARK)),
                Some(g) => {
                    let adj_facet = g.adj_facet(f);
                    // Skip slots recorded from the partner side.
                    if (g.adj, adj_facet) < (t, f) {
                        continue;
                    }
                    out.push(letter(g.adj as u8));
                    out.push(letter(g.perm.index() as u8));
                }
            }
        }
    }
    Ok(out)
}

/// Reconstructs a triangulation from a dehydration string, reproducing the
/// labelling it was dehydrated with.
///
/// # Errors
///
/// Returns a [`DehydrationError`] for characters outside `'a'…'z'`, for a
/// string that ends early, and for inconsistent gluing data.
pub fn rehydrate(text: &str) -> Result<Triangulation, DehydrationError> {
    let mut values = text.chars().map(|c| {
        if c.is_ascii_lowercase() {
            Ok(c as u8 - b'a')
        } else {
            Err(DehydrationError::InvalidCharacter { character: c })
        }
    });
    let mut next = |expected: &'static str| -> Result<u8, DehydrationError> {
        let _ = expected;
        values.next().ok_or(DehydrationError::Truncated)?
    };

    let n = usize::from(next("size")?);
    if n == 0 {
        return Err(DehydrationError::Malformed {
            reason: "size letter encodes zero tetrahedra",
        });
    }
    let mut tri = Triangulation::new();
    tri.new_tetrahedra(n);
    for t in 0..n {
        for f in 0..4u8 {
            if tri.gluing(t, f).is_some() {
                continue;
            }
            let dest = next("destination")?;
            if dest == BOUNDARY_MARK {
                continue;
            }
            if usize::from(dest) >= n {
                return Err(DehydrationError::Malformed {
                    reason: "destination tetrahedron out of range",
                });
            }
            let perm_rank = next("permutation")?;
            let perm = Perm4::from_index(usize::from(perm_rank)).map_err(|_| {
                DehydrationError::Malformed {
                    reason: "permutation rank out of range",
                }
            })?;
            let adj_facet: FacetNumber = perm.apply(f);
            if (usize::from(dest), adj_facet) < (t, f) {
                return Err(DehydrationError::Malformed {
                    reason: "gluing recorded from the wrong side",
                });
            }
            tri.glue(t, f, usize::from(dest), adj_facet, perm)
                .map_err(|_| DehydrationError::Malformed {
                    reason: "inconsistent gluing",
                })?;
        }
    }
    if values.next().is_some() {
        return Err(DehydrationError::Malformed {
            reason: "trailing characters",
        });
    }
    Ok(tri)
}
