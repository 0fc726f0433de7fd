//! Connected sum decomposition and 3-sphere recognition.
//!
//! The decomposition repeatedly finds a non-trivial normal sphere or
//! projective plane in a vertex solution list, crushes it, and recurses
//! on the pieces.  Crushing strictly reduces the number of tetrahedra, so
//! the loop terminates; the pieces that survive with no non-trivial
//! sphere are 0-efficient and hence prime.  By Jaco and Rubinstein's
//! 0-efficiency results, a closed orientable 0-efficient triangulation
//! with more than one vertex is a 3-sphere, and a one-vertex one is a
//! 3-sphere exactly when it contains an almost normal sphere with a
//! single octagon (searched for in quadrilateral-octagon coordinates).
//!
//! Crushing can silently delete S²×S¹, ℝP³ and L(3,1) summands, so the
//! first homology of the pieces is compared against the input and the
//! missing summands are restored from standard triangulations.

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::Signed;
use thiserror::Error;

use crate::algebra::{homology_h1, AbelianGroup, HomologyError};
use crate::core::triangulation::Triangulation;
use crate::surface::coords::CoordSystem;
use crate::surface::list::{EnumerateError, NormalSurfaces};
use crate::surface::surface::NormalSurface;

/// An error produced by the decomposition routines.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecomposeError {
    /// The triangulation is not valid, closed, connected and orientable.
    #[error("connected sum decomposition requires a valid closed connected orientable triangulation")]
    FailedPrecondition,

    /// The manifold contains an embedded two-sided projective plane, so
    /// it has no unique prime decomposition.
    #[error("the manifold contains an embedded two-sided projective plane")]
    TwoSidedProjectivePlane,

    /// A surface enumeration failed or was cancelled.
    #[error(transparent)]
    Enumerate(#[from] EnumerateError),

    /// A homology computation failed.
    #[error(transparent)]
    Homology(#[from] HomologyError),
}

/// Finds a vertex normal surface of positive Euler characteristic that is
/// not a vertex link: a sphere or projective plane to crush.
fn non_trivial_sphere(
    tri: &Arc<Triangulation>,
) -> Result<Option<NormalSurface>, EnumerateError> {
    let list = NormalSurfaces::enumerate(
        Triangulation::clone(tri),
        CoordSystem::Standard,
    )?;
    for surface in &list {
        if !surface.is_compact() || surface.is_vertex_linking() {
            continue;
        }
        let chi = surface
            .euler_char()
            .expect("compact surfaces have an Euler characteristic");
        if chi.is_positive() && !surface.has_real_boundary() {
            return Ok(Some(surface.clone()));
        }
    }
    Ok(None)
}

/// Finds a vertex almost normal sphere with precisely one octagon, in
/// quadrilateral-octagon coordinates.
fn octagonal_almost_normal_sphere(
    tri: &Arc<Triangulation>,
) -> Result<Option<NormalSurface>, EnumerateError> {
    let list = NormalSurfaces::enumerate(
        Triangulation::clone(tri),
        CoordSystem::QuadOct,
    )?;
    for surface in &list {
        if !surface.is_compact() {
            continue;
        }
        let mut octs = BigInt::from(0);
        for tet in 0..tri.size() {
            for q in 0..3u8 {
                octs += surface
                    .octs(tet, q)
                    .finite()
                    .expect("compact surfaces have finite coordinates");
            }
        }
        if octs != BigInt::from(1) {
            continue;
        }
        if surface.euler_char() == Some(BigInt::from(2)) {
            return Ok(Some(surface.clone()));
        }
    }
    Ok(None)
}

/// The outcome of crushing one piece down to 0-efficient components.
enum Piece {
    /// The piece is a 3-sphere and contributes nothing.
    Sphere,
    /// The piece is prime and not a 3-sphere.
    Prime(Triangulation),
    /// The piece still contains a sphere to crush; recurse on these.
    Split(Vec<Triangulation>),
}

fn process_piece(mut piece: Triangulation) -> Result<Piece, DecomposeError> {
    piece.simplify();
    let arc = Arc::new(piece);

    if let Some(sphere) = non_trivial_sphere(&arc)? {
        let mut crushed = sphere
            .crush()
            .expect("compact surfaces crush to a triangulation");
        if !crushed.is_valid() {
            return Err(DecomposeError::TwoSidedProjectivePlane);
        }
        crushed.simplify();
        return Ok(Piece::Split(crushed.triangulate_components()));
    }

    // No non-trivial normal sphere: the piece is 0-efficient and prime.
    if arc.skeleton().vertices().len() > 1 {
        // A closed orientable 0-efficient triangulation with more than
        // one vertex is a 3-sphere.
        return Ok(Piece::Sphere);
    }
    if octagonal_almost_normal_sphere(&arc)?.is_some() {
        return Ok(Piece::Sphere);
    }
    Ok(Piece::Prime(Triangulation::clone(&arc)))
}

impl Triangulation {
    /// Decomposes this manifold into its prime connected summands.
    ///
    /// A 3-sphere yields an empty list.  The summands come back as
    /// independent triangulations in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::FailedPrecondition`] unless the
    /// triangulation is valid, closed, connected and orientable, and
    /// [`DecomposeError::TwoSidedProjectivePlane`] if a crushed sphere
    /// reveals an embedded two-sided projective plane.
    pub fn summands(&self) -> Result<Vec<Triangulation>, DecomposeError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if !(self.is_valid() && self.is_closed() && self.is_connected() && self.is_orientable())
        {
            return Err(DecomposeError::FailedPrecondition);
        }

        let mut working = self.clone();
        working.simplify();
        let initial = homology_h1(&working)?;

        let mut to_process = vec![working];
        let mut primes: Vec<Triangulation> = Vec::new();
        while let Some(piece) = to_process.pop() {
            match process_piece(piece)? {
                Piece::Sphere => {}
                Piece::Prime(prime) => primes.push(prime),
                Piece::Split(parts) => to_process.extend(parts),
            }
        }

        // Crushing may have deleted S2 x S1, RP3 or L(3,1) summands
        // outright; compare homology and put them back.
        let mut found = AbelianGroup::trivial();
        for prime in &primes {
            found = found.direct_sum(&homology_h1(prime)?);
        }
        for _ in found.rank()..initial.rank() {
            primes.push(Triangulation::sphere_bundle());
        }
        for _ in found.torsion_rank(2)..initial.torsion_rank(2) {
            primes.push(Triangulation::layered_loop(2, false));
        }
        for _ in found.torsion_rank(3)..initial.torsion_rank(3) {
            primes.push(Triangulation::layered_loop(3, false));
        }

        Ok(primes)
    }

    /// Is this triangulation a 3-sphere?
    ///
    /// Uses the crushing loop of [`Self::summands`]: the manifold is a
    /// 3-sphere exactly when it is valid, closed, orientable, connected
    /// and non-empty with trivial homology, and every piece crushes away.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::Enumerate`] if a surface enumeration
    /// fails.
    pub fn is_three_sphere(&self) -> Result<bool, DecomposeError> {
        if !(self.is_valid()
            && self.is_closed()
            && self.is_orientable()
            && self.is_connected()
            && !self.is_empty())
        {
            return Ok(false);
        }

        let mut working = self.clone();
        working.simplify();
        if !homology_h1(&working)?.is_trivial() {
            return Ok(false);
        }

        // Trivial homology rules out S2 x S1, RP3 and L(3,1) summands, so
        // nothing is lost in crushing and the count of primes is exact.
        let mut to_process = vec![working];
        while let Some(piece) = to_process.pop() {
            match process_piece(piece)? {
                Piece::Sphere => {}
                Piece::Prime(_) => return Ok(false),
                Piece::Split(parts) => to_process.extend(parts),
            }
        }
        Ok(true)
    }

    /// Is this triangulation a 3-ball?
    ///
    /// Cones the boundary to an ideal vertex and runs 3-sphere
    /// recognition on the result.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::Enumerate`] if a surface enumeration
    /// fails.
    pub fn is_ball(&self) -> Result<bool, DecomposeError> {
        if !(self.is_valid() && self.is_orientable() && self.is_connected()) {
            return Ok(false);
        }
        let skeleton = self.skeleton();
        let boundary = skeleton.boundary_components();
        if boundary.len() != 1
            || boundary[0].triangles.is_empty()
            || boundary[0].euler_char != 2
        {
            return Ok(false);
        }

        let mut working = self.clone();
        working.simplify();
        working.finite_to_ideal();
        working.simplify();
        working.is_three_sphere()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_sphere_has_no_summands() {
        assert!(Triangulation::sphere().summands().unwrap().is_empty());
        assert!(Triangulation::new().summands().unwrap().is_empty());
    }

    #[test]
    fn sphere_recognition_accepts_spheres() {
        assert_eq!(Triangulation::sphere().is_three_sphere(), Ok(true));
    }

    #[test]
    fn sphere_recognition_rejects_lens_spaces() {
        assert_eq!(
            Triangulation::layered_loop(2, false).is_three_sphere(),
            Ok(false)
        );
        assert_eq!(
            Triangulation::layered_loop(3, false).is_three_sphere(),
            Ok(false)
        );
    }

    #[test]
    fn real_projective_space_is_its_own_prime_summand() {
        let summands = Triangulation::layered_loop(2, false).summands().unwrap();
        assert_eq!(summands.len(), 1);
        assert!(homology_h1(&summands[0]).unwrap().is_zn(2));
    }

    #[test]
    fn a_sphere_bundle_is_restored_from_homology() {
        let summands = Triangulation::sphere_bundle().summands().unwrap();
        assert_eq!(summands.len(), 1);
        assert!(homology_h1(&summands[0]).unwrap().is_z());
    }

    #[test]
    fn non_orientable_and_bounded_input_is_rejected() {
        assert_eq!(
            Triangulation::twisted_sphere_bundle().summands(),
            Err(DecomposeError::FailedPrecondition)
        );
        assert_eq!(
            Triangulation::ball().summands(),
            Err(DecomposeError::FailedPrecondition)
        );
    }

    #[test]
    fn ball_recognition() {
        assert_eq!(Triangulation::ball().is_ball(), Ok(true));
        assert_eq!(Triangulation::sphere().is_ball(), Ok(false));
    }
}
