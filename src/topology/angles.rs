//! Angle structures on triangulations.
//!
//! An angle structure assigns a real angle to each edge pair of each
//! tetrahedron so that the three angles of every tetrahedron sum to pi
//! and the angles around every internal edge sum to 2 pi.  Solutions are
//! represented by integer vectors of length `3t + 1`: three angle
//! coordinates per tetrahedron plus a final scaling coordinate, with the
//! true angle being `vector[i] / scale * pi`.
//!
//! The solution polytope is projectivised into the cone
//! `{ x >= 0 : A x = 0 }` over the angle equations, and feasibility is
//! settled by enumerating the extremal rays of that cone.  A triangulation
//! with no angle structure at all reports [`AngleError::NoSolution`].

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algebra::MatrixInt;
use crate::core::triangulation::Triangulation;
use crate::enumerate::bitmask::ConstraintMasks;
use crate::enumerate::dd;
use crate::enumerate::progress::{Cancelled, NullProgress};

/// An error produced while solving for angle structures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AngleError {
    /// The triangulation has invalid edges, so the equations are not
    /// well defined.
    #[error("angle structures require a valid triangulation")]
    InvalidTriangulation,

    /// No solution of the requested kind exists.
    #[error("the triangulation admits no such angle structure")]
    NoSolution,

    /// The caller cancelled the enumeration.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Builds the angle structure equations for `tri`.
///
/// One column per angle coordinate plus a final scaling column; one row
/// per tetrahedron (the three angles sum to the scale, i.e. to pi) and
/// one row per internal edge (the angles around it sum to twice the
/// scale).
///
/// # Errors
///
/// Returns [`AngleError::InvalidTriangulation`] if some edge or vertex is
/// invalid.
pub fn angle_equations(tri: &Triangulation) -> Result<MatrixInt, AngleError> {
    let skeleton = tri.skeleton();
    if !skeleton.is_valid() {
        return Err(AngleError::InvalidTriangulation);
    }

    let n = tri.size();
    let scale = 3 * n;
    let internal: Vec<_> = skeleton
        .edges()
        .iter()
        .filter(|e| !e.is_boundary())
        .collect();

    let mut m = MatrixInt::zero(n + internal.len(), scale + 1);
    for tet in 0..n {
        for pair in 0..3 {
            m[(tet, 3 * tet + pair)] = BigInt::from(1);
        }
        m[(tet, scale)] = BigInt::from(-1);
    }
    for (r, edge) in internal.iter().enumerate() {
        let row = n + r;
        for emb in &edge.embeddings {
            let e = emb.edge();
            let pair = usize::from(if e < 3 { e } else { 5 - e });
            m[(row, 3 * emb.tet + pair)] += BigInt::from(1);
        }
        m[(row, scale)] = BigInt::from(-2);
    }
    Ok(m)
}

/// A single angle structure, in homogeneous integer coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleStructure {
    vector: Vec<BigInt>,
}

impl AngleStructure {
    /// The homogeneous coordinate vector, three angles per tetrahedron
    /// followed by the scaling coordinate.
    #[must_use]
    pub fn vector(&self) -> &[BigInt] {
        &self.vector
    }

    /// The numerator of the angle on edge pair `pair` of tetrahedron
    /// `tet`; the angle itself is this over [`Self::scale`], times pi.
    #[must_use]
    pub fn angle(&self, tet: usize, pair: usize) -> &BigInt {
        &self.vector[3 * tet + pair]
    }

    /// The common denominator of the angles.
    #[must_use]
    pub fn scale(&self) -> &BigInt {
        &self.vector[self.vector.len() - 1]
    }

    /// Are all angles strictly between 0 and pi?
    #[must_use]
    pub fn is_strict(&self) -> bool {
        let (angles, _) = self.vector.split_at(self.vector.len() - 1);
        angles.iter().all(|a| !a.is_zero())
    }

    /// Is every angle either 0 or pi?
    #[must_use]
    pub fn is_taut(&self) -> bool {
        let (angles, _) = self.vector.split_at(self.vector.len() - 1);
        angles.iter().all(|a| a.is_zero() || a == self.scale())
    }
}

/// Enumerates the vertex angle structures of `tri`: the extremal rays of
/// the projectivised solution polytope.
///
/// # Errors
///
/// Returns [`AngleError::InvalidTriangulation`] if the triangulation has
/// invalid faces.
pub fn vertex_angle_structures(
    tri: &Triangulation,
) -> Result<Vec<AngleStructure>, AngleError> {
    let equations = angle_equations(tri)?;
    let rays = dd::extremal_rays(&equations, &ConstraintMasks::none(), &NullProgress)?;
    Ok(rays
        .into_iter()
        .map(|vector| AngleStructure { vector })
        .collect())
}

impl Triangulation {
    /// Finds an angle structure on this triangulation, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`AngleError::NoSolution`] if the triangulation admits no
    /// angle structure, and [`AngleError::InvalidTriangulation`] if the
    /// equations cannot be built.
    pub fn angle_structure(&self) -> Result<AngleStructure, AngleError> {
        // Every non-zero ray has positive scale, since per tetrahedron
        // the scale equals a sum of non-negative angles.
        vertex_angle_structures(self)?
            .into_iter()
            .next()
            .ok_or(AngleError::NoSolution)
    }

    /// Finds a strict angle structure, with all angles in the open
    /// interval (0, pi), if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`AngleError::NoSolution`] if the triangulation admits no
    /// strict angle structure.
    pub fn strict_angle_structure(&self) -> Result<AngleStructure, AngleError> {
        let rays = vertex_angle_structures(self)?;

        // The sum of all extremal rays lies in the relative interior of
        // the solution cone, so it has maximal support: a strict
        // structure exists precisely when this sum is strict.
        let mut sum = match rays.first() {
            None => return Err(AngleError::NoSolution),
            Some(first) => vec![BigInt::zero(); first.vector.len()],
        };
        for ray in &rays {
            for (s, x) in sum.iter_mut().zip(&ray.vector) {
                *s += x;
            }
        }
        let candidate = AngleStructure { vector: sum };
        if candidate.is_strict() {
            Ok(candidate)
        } else {
            Err(AngleError::NoSolution)
        }
    }

    /// Does this triangulation admit any angle structure?
    #[must_use]
    pub fn has_angle_structure(&self) -> bool {
        self.angle_structure().is_ok()
    }

    /// Does this triangulation admit a strict angle structure?
    #[must_use]
    pub fn has_strict_angle_structure(&self) -> bool {
        self.strict_angle_structure().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::perm::Perm4;

    fn figure_eight() -> Triangulation {
        Triangulation::from_gluings(
            2,
            &[
                (0, 0, 1, 1, Perm4::raw([2, 1, 0, 3])),
                (0, 1, 1, 0, Perm4::raw([1, 0, 3, 2])),
                (0, 2, 1, 3, Perm4::raw([0, 3, 2, 1])),
                (0, 3, 1, 2, Perm4::raw([0, 3, 2, 1])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn the_empty_triangulation_has_one_vacuous_structure() {
        let list = vertex_angle_structures(&Triangulation::new()).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_strict());
        assert!(list[0].is_taut());
    }

    #[test]
    fn a_standalone_tetrahedron_has_three_taut_structures() {
        let mut tri = Triangulation::new();
        tri.new_tetrahedron();
        let list = vertex_angle_structures(&tri).unwrap();
        assert_eq!(list.len(), 3);
        for s in &list {
            assert!(s.is_taut());
            assert!(!s.is_strict());
        }
        assert!(tri.has_strict_angle_structure());
    }

    #[test]
    fn the_figure_eight_complement_spans_strict_structures() {
        let tri = figure_eight();
        let list = vertex_angle_structures(&tri).unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list.iter().filter(|s| s.is_taut()).count(), 3);
        let strict = tri.strict_angle_structure().unwrap();
        assert!(strict.is_strict());
    }

    #[test]
    fn a_closed_lens_space_admits_no_angle_structure() {
        let tri = Triangulation::layered_loop(2, false);
        assert_eq!(tri.angle_structure(), Err(AngleError::NoSolution));
        assert!(!tri.has_angle_structure());
        assert!(!tri.has_strict_angle_structure());
    }
}
