//! First Homology
//!
//! Computes H₁ of a triangulated 3-manifold from the dual spine: one
//! generator per internal triangle (a dual arc between two tetrahedra),
//! one relation per internal edge (walking once around the edge crosses a
//! cycle of dual arcs), and one relation per arc of a dual spanning
//! forest. The abelianisation of this presentation is read off from the
//! Smith normal form of the relation matrix.
//!
//! This recovers H₁ of the underlying manifold for closed, bounded and
//! ideal triangulations alike, since boundary triangles and boundary edges
//! contribute neither generators nor relations.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::FastHashMap;
use crate::core::triangulation::Triangulation;

use super::matrix::MatrixInt;

/// Error type for homology computations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HomologyError {
    /// The triangulation has an invalid edge or vertex.
    #[error("Homology requires a valid triangulation")]
    InvalidTriangulation,
}

/// A finitely generated abelian group in invariant factor form:
/// `Z^rank ⊕ Z_{d₁} ⊕ … ⊕ Z_{dₖ}` with `d₁ | d₂ | … | dₖ`, all `dᵢ > 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbelianGroup {
    rank: usize,
    invariants: Vec<BigInt>,
}

impl AbelianGroup {
    /// The trivial group.
    #[must_use]
    pub fn trivial() -> Self {
        Self {
            rank: 0,
            invariants: Vec::new(),
        }
    }

    /// A free abelian group of the given rank.
    #[must_use]
    pub fn free(rank: usize) -> Self {
        Self {
            rank,
            invariants: Vec::new(),
        }
    }

    /// The cyclic group `Z_n` (`n ≥ 2`), or `Z` for `n = 0`.
    #[must_use]
    pub fn cyclic(n: u64) -> Self {
        match n {
            0 => Self::free(1),
            1 => Self::trivial(),
            _ => Self {
                rank: 0,
                invariants: vec![BigInt::from(n)],
            },
        }
    }

    /// Builds a group from a presentation with `generators` generators and
    /// the rows of `relations` as relators.
    #[must_use]
    pub fn from_presentation(generators: usize, mut relations: MatrixInt) -> Self {
        let diagonal = relations.smith_normal_form();
        let rank = generators - diagonal.len();
        let invariants = diagonal
            .into_iter()
            .filter(|d| !d.is_one())
            .collect();
        Self { rank, invariants }
    }

    /// The free rank.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The invariant factors, each dividing the next.
    #[must_use]
    pub fn invariant_factors(&self) -> &[BigInt] {
        &self.invariants
    }

    /// Whether this is the trivial group.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.rank == 0 && self.invariants.is_empty()
    }

    /// Whether this is infinite cyclic.
    #[must_use]
    pub fn is_z(&self) -> bool {
        self.rank == 1 && self.invariants.is_empty()
    }

    /// Whether this is the finite cyclic group of order `n`.
    #[must_use]
    pub fn is_zn(&self, n: u64) -> bool {
        match n {
            0 => self.is_z(),
            1 => self.is_trivial(),
            _ => self.rank == 0 && self.invariants == [BigInt::from(n)],
        }
    }

    /// The number of invariant factors divisible by `p`: the rank of the
    /// `Z_p` part when `p` is prime.
    #[must_use]
    pub fn torsion_rank(&self, p: u64) -> usize {
        let p = BigInt::from(p);
        self.invariants
            .iter()
            .filter(|d| (*d % &p).is_zero())
            .count()
    }

    /// Direct sum with another group.
    #[must_use]
    pub fn direct_sum(&self, other: &AbelianGroup) -> AbelianGroup {
        // Renormalise the combined torsion to invariant factor form via a
        // diagonal presentation.
        let all: Vec<&BigInt> = self
            .invariants
            .iter()
            .chain(other.invariants.iter())
            .collect();
        let n = all.len();
        let mut relations = MatrixInt::zero(n, n);
        for (i, d) in all.into_iter().enumerate() {
            relations[(i, i)] = d.clone();
        }
        let mut sum = AbelianGroup::from_presentation(n, relations);
        sum.rank += self.rank + other.rank;
        sum
    }
}

impl fmt::Display for AbelianGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_trivial() {
            return f.write_str("0");
        }
        let mut first = true;
        let mut term = |f: &mut fmt::Formatter<'_>, text: String| -> fmt::Result {
            if !first {
                f.write_str(" + ")?;
            }
            first = false;
            f.write_str(&text)
        };
        match self.rank {
            0 => {}
            1 => term(f, "Z".to_string())?,
            r => term(f, format!("{r} Z"))?,
        }
        for d in &self.invariants {
            term(f, format!("Z_{d}"))?;
        }
        Ok(())
    }
}

/// Computes the first homology group of a triangulation.
///
/// # Errors
///
/// Fails with [`HomologyError::InvalidTriangulation`] if some edge or
/// vertex is invalid.
pub fn homology_h1(tri: &Triangulation) -> Result<AbelianGroup, HomologyError> {
    let skel = tri.skeleton();
    if !skel.is_valid() {
        return Err(HomologyError::InvalidTriangulation);
    }

    // Generators: internal triangles, as dual arcs.
    let mut generator: FastHashMap<usize, usize> = FastHashMap::default();
    for (i, t) in skel.triangles().iter().enumerate() {
        if !t.is_boundary() {
            let next = generator.len();
            generator.insert(i, next);
        }
    }
    let n_gen = generator.len();

    // Spanning forest of the dual graph: each forest arc is a relation.
    let mut forest_rows: Vec<Vec<(usize, i64)>> = Vec::new();
    let mut visited = vec![false; tri.size()];
    for start in 0..tri.size() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![start];
        while let Some(t) = stack.pop() {
            for f in 0..4u8 {
                if let Some(g) = tri.gluing(t, f) {
                    if !visited[g.adj] {
                        visited[g.adj] = true;
                        stack.push(g.adj);
                        let arc = generator[&skel.triangle_class(t, f)];
                        forest_rows.push(vec![(arc, 1)]);
                    }
                }
            }
        }
    }

    // One relation per internal valid edge: the dual arcs crossed walking
    // once around the edge, signed by crossing direction.
    let mut edge_rows: Vec<Vec<(usize, i64)>> = Vec::new();
    for e in skel.edges() {
        if e.is_boundary() {
            continue;
        }
        let mut row: FastHashMap<usize, i64> = FastHashMap::default();
        for emb in &e.embeddings {
            let exit = emb.vertices.apply(3);
            let tri_class = skel.triangle_class(emb.tet, exit);
            let arc = generator[&tri_class];
            // Crossing agrees with the arc's direction when we leave
            // through the triangle's first recorded embedding.
            let sign = if skel.triangles()[tri_class].embeddings[0] == (emb.tet, exit) {
                1
            } else {
                -1
            };
            *row.entry(arc).or_insert(0) += sign;
        }
        edge_rows.push(row.into_iter().collect());
    }

    let n_rows = forest_rows.len() + edge_rows.len();
    let mut relations = MatrixInt::zero(n_rows, n_gen);
    for (r, row) in forest_rows.iter().chain(edge_rows.iter()).enumerate() {
        for &(c, v) in row {
            relations[(r, c)] = BigInt::from(v);
        }
    }
    Ok(AbelianGroup::from_presentation(n_gen, relations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_has_trivial_h1() {
        let h1 = homology_h1(&Triangulation::sphere()).unwrap();
        assert!(h1.is_trivial());
        assert_eq!(h1.to_string(), "0");
    }

    #[test]
    fn ball_has_trivial_h1() {
        assert!(homology_h1(&Triangulation::ball()).unwrap().is_trivial());
    }

    #[test]
    fn lens_spaces_have_cyclic_h1() {
        for n in 2..=5u64 {
            let tri = Triangulation::layered_loop(n as usize, false);
            let h1 = homology_h1(&tri).unwrap();
            assert!(h1.is_zn(n), "C({n}) should have H1 = Z_{n}, got {h1}");
        }
    }

    #[test]
    fn sphere_bundles_have_h1_z() {
        assert!(homology_h1(&Triangulation::sphere_bundle()).unwrap().is_z());
        assert!(homology_h1(&Triangulation::twisted_sphere_bundle())
            .unwrap()
            .is_z());
    }

    #[test]
    fn figure_eight_complement_has_h1_z() {
        let tri = Triangulation::from_gluings(
            2,
            &[
                (0, 0, 1, 1, crate::core::perm::Perm4::raw([2, 1, 0, 3])),
                (0, 1, 1, 0, crate::core::perm::Perm4::raw([1, 0, 3, 2])),
                (0, 2, 1, 3, crate::core::perm::Perm4::raw([0, 3, 2, 1])),
                (0, 3, 1, 2, crate::core::perm::Perm4::raw([0, 3, 2, 1])),
            ],
        )
        .unwrap();
        assert!(homology_h1(&tri).unwrap().is_z());
    }

    #[test]
    fn direct_sum_renormalises_invariants() {
        let a = AbelianGroup::cyclic(2);
        let b = AbelianGroup::cyclic(3);
        let sum = a.direct_sum(&b);
        assert!(sum.is_zn(6));
        let c = AbelianGroup::cyclic(2).direct_sum(&AbelianGroup::cyclic(4));
        assert_eq!(
            c.invariant_factors(),
            &[BigInt::from(2), BigInt::from(4)]
        );
        assert_eq!(c.to_string(), "Z_2 + Z_4");
        assert_eq!(c.torsion_rank(2), 2);
        assert_eq!(c.torsion_rank(3), 0);
    }

    #[test]
    fn display_formats() {
        assert_eq!(AbelianGroup::free(1).to_string(), "Z");
        assert_eq!(AbelianGroup::free(3).to_string(), "3 Z");
        assert_eq!(
            AbelianGroup::free(1).direct_sum(&AbelianGroup::cyclic(5)).to_string(),
            "Z + Z_5"
        );
    }
}
