//! Integration tests for the topology algorithms: connected sum
//! decomposition, 3-sphere and 3-ball recognition, first homology, and
//! angle structures on the small census fixtures.

use trisurf::core::{from_isosig, Perm4, Triangulation};
use trisurf::prelude::*;
use trisurf::topology::vertex_angle_structures;

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

fn gieseking() -> Triangulation {
    Triangulation::from_gluings(
        1,
        &[
            (0, 0, 0, 1, Perm4::raw([1, 2, 0, 3])),
            (0, 2, 0, 3, Perm4::raw([0, 2, 3, 1])),
        ],
    )
    .unwrap()
}

// =============================================================================
// RECOGNITION
// =============================================================================

#[test]
fn sphere_and_ball_recognition() {
    let sphere = Triangulation::sphere();
    assert!(sphere.is_three_sphere().unwrap());
    assert!(!sphere.is_ball().unwrap());

    let ball = Triangulation::ball();
    assert!(ball.is_ball().unwrap());
    assert!(!ball.is_three_sphere().unwrap());
}

#[test]
fn lens_spaces_are_not_spheres() {
    for length in 2..5 {
        let lens = Triangulation::layered_loop(length, false);
        assert!(lens.is_closed() && lens.is_orientable());
        assert!(!lens.is_three_sphere().unwrap());
    }
}

// =============================================================================
// PRIME DECOMPOSITION
// =============================================================================

#[test]
fn spheres_have_no_summands() {
    assert!(Triangulation::sphere().summands().unwrap().is_empty());
    assert!(Triangulation::new().summands().unwrap().is_empty());
}

#[test]
fn lens_spaces_are_their_own_prime_summands() {
    for length in 2..6 {
        let lens = Triangulation::layered_loop(length, false);
        let expected = homology_h1(&lens).unwrap();
        assert!(expected.is_zn(length as u64));

        let summands = lens.summands().unwrap();
        assert_eq!(summands.len(), 1, "L({length},1) should be prime");
        assert_eq!(homology_h1(&summands[0]).unwrap(), expected);
    }
}

#[test]
fn the_poincare_homology_sphere_is_prime_but_not_a_sphere() {
    let tri = from_isosig("fvPQcdecedekrsnrs").unwrap();
    assert_eq!(tri.size(), 5);
    assert!(tri.is_valid() && tri.is_closed() && tri.is_orientable());
    assert!(homology_h1(&tri).unwrap().is_trivial());

    assert!(!tri.is_three_sphere().unwrap());

    let summands = tri.summands().unwrap();
    assert_eq!(summands.len(), 1);
    assert!(homology_h1(&summands[0]).unwrap().is_trivial());
}

#[test]
fn the_orientable_sphere_bundle_is_prime() {
    let bundle = Triangulation::sphere_bundle();
    let summands = bundle.summands().unwrap();
    assert_eq!(summands.len(), 1);
    assert!(homology_h1(&summands[0]).unwrap().is_z());
}

#[test]
fn decomposition_rejects_unsupported_inputs() {
    // Non-orientable.
    let twisted = Triangulation::twisted_sphere_bundle();
    assert_eq!(twisted.summands(), Err(DecomposeError::FailedPrecondition));

    // Has boundary.
    let ball = Triangulation::ball();
    assert_eq!(ball.summands(), Err(DecomposeError::FailedPrecondition));

    // Ideal, hence not closed.
    let ideal = figure_eight();
    assert_eq!(ideal.summands(), Err(DecomposeError::FailedPrecondition));
}

// =============================================================================
// ANGLE STRUCTURES
// =============================================================================

#[test]
fn cusped_hyperbolic_fixtures_admit_angle_structures() {
    let fig8 = figure_eight();
    assert!(fig8.has_angle_structure());
    assert!(fig8.has_strict_angle_structure());

    // The Gieseking manifold carries taut structures but no strict one.
    let gieseking = gieseking();
    let list = vertex_angle_structures(&gieseking).unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.iter().all(|s| s.is_taut()));
    assert!(!gieseking.has_strict_angle_structure());
}

#[test]
fn closed_fixtures_admit_no_angle_structures() {
    let lens = Triangulation::layered_loop(2, false);
    assert_eq!(lens.angle_structure(), Err(AngleError::NoSolution));
}
