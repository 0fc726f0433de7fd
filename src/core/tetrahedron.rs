//! Tetrahedra and Facet Gluings
//!
//! This module provides the `Tetrahedron` struct, a top-dimensional simplex of
//! a 3-manifold triangulation, together with the `Gluing` record describing
//! how one of its facets is identified with a facet of a (possibly equal)
//! tetrahedron.
//!
//! A tetrahedron has four vertices 0–3 and four facets 0–3, where facet `i`
//! is the triangle opposite vertex `i`. A gluing on facet `i` carries a
//! permutation `g ∈ S₄` mapping the vertices of this tetrahedron to the
//! vertices of the neighbour; `g(i)` is the facet number on the far side.
//!
//! # Fundamental Invariant
//!
//! **Gluings are involutive**: if facet `i` of tetrahedron `s` is glued to
//! facet `j` of tetrahedron `t` via `g`, then facet `j` of `t` is glued back
//! to facet `i` of `s` via `g⁻¹`. The owning [`Triangulation`] enforces this
//! on every mutation; a `Tetrahedron` never exists with a half-applied pair.
//!
//! [`Triangulation`]: crate::core::triangulation::Triangulation

use serde::{Deserialize, Serialize};

use super::collections::{FacetNumber, TetIndex};
use super::perm::Perm4;

// =============================================================================
// EDGE NUMBERING TABLES
// =============================================================================

/// The vertices of the six edges of a tetrahedron, in canonical order:
/// edge `e` joins `EDGE_VERTEX[e][0] < EDGE_VERTEX[e][1]`.
pub const EDGE_VERTEX: [[u8; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// The edge number spanned by two distinct vertices of a tetrahedron.
///
/// Inverse of [`EDGE_VERTEX`]; `edge_number(a, b) == edge_number(b, a)`.
///
/// # Panics
///
/// Panics if `a == b` or either exceeds 3.
#[must_use]
pub const fn edge_number(a: u8, b: u8) -> u8 {
    const TABLE: [[i8; 4]; 4] = [
        [-1, 0, 1, 2],
        [0, -1, 3, 4],
        [1, 3, -1, 5],
        [2, 4, 5, -1],
    ];
    let e = TABLE[a as usize][b as usize];
    assert!(e >= 0);
    e as u8
}

// =============================================================================
// GLUING
// =============================================================================

/// The identification of one facet of a tetrahedron with a facet of a
/// neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gluing {
    /// Index of the neighbouring tetrahedron (which may be this one).
    pub adj: TetIndex,
    /// Vertex permutation from this tetrahedron to the neighbour; the
    /// destination facet is `perm(facet)`.
    pub perm: Perm4,
}

impl Gluing {
    /// The facet of the neighbour glued to the given facet of this
    /// tetrahedron.
    #[must_use]
    pub fn adj_facet(&self, facet: FacetNumber) -> FacetNumber {
        self.perm.apply(facet)
    }
}

// =============================================================================
// TETRAHEDRON
// =============================================================================

/// A single tetrahedron of a triangulation: four facet slots, each either
/// boundary (`None`) or glued.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tetrahedron {
    gluings: [Option<Gluing>; 4],
}

impl Tetrahedron {
    /// A tetrahedron with all four facets on the boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The gluing on the given facet, or `None` for a boundary facet.
    #[must_use]
    pub fn gluing(&self, facet: FacetNumber) -> Option<Gluing> {
        self.gluings[usize::from(facet)]
    }

    /// Whether the given facet is unglued.
    #[must_use]
    pub fn is_boundary_facet(&self, facet: FacetNumber) -> bool {
        self.gluings[usize::from(facet)].is_none()
    }

    /// Number of glued facets.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.gluings.iter().flatten().count()
    }

    pub(crate) fn set_gluing(&mut self, facet: FacetNumber, gluing: Option<Gluing>) {
        self.gluings[usize::from(facet)] = gluing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_tables_are_mutually_inverse() {
        for (e, [a, b]) in EDGE_VERTEX.iter().enumerate() {
            assert_eq!(edge_number(*a, *b) as usize, e);
            assert_eq!(edge_number(*b, *a) as usize, e);
        }
    }

    #[test]
    fn opposite_edges_sum_to_five() {
        // Edge e and edge 5 - e span complementary vertex pairs.
        for e in 0..6usize {
            let mut all: Vec<u8> = EDGE_VERTEX[e].to_vec();
            all.extend_from_slice(&EDGE_VERTEX[5 - e]);
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn fresh_tetrahedron_is_all_boundary() {
        let tet = Tetrahedron::new();
        assert_eq!(tet.degree(), 0);
        assert!((0..4).all(|f| tet.is_boundary_facet(f)));
    }
}
