//! Property-based tests for the triangulation text codecs.
//!
//! This module uses proptest to verify that isomorphism signatures are
//! genuine isomorphism invariants, that both codecs round-trip, and that
//! the skeletal counts a signature encodes survive the round trip.

use proptest::prelude::*;
use trisurf::core::{dehydrate, from_isosig, isosig, rehydrate, Perm4, Triangulation};

// =============================================================================
// STRATEGIES
// =============================================================================

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

/// Strategy over a spread of small fixture triangulations: closed and
/// bounded, orientable and not, ideal and finite.
fn fixture() -> impl Strategy<Value = Triangulation> {
    prop_oneof![
        Just(Triangulation::sphere()),
        Just(Triangulation::ball()),
        Just(Triangulation::sphere_bundle()),
        Just(Triangulation::twisted_sphere_bundle()),
        Just(figure_eight()),
        Just(gieseking()),
        (2usize..7, any::<bool>())
            .prop_map(|(length, twisted)| Triangulation::layered_loop(length, twisted)),
    ]
}

/// A fixture together with a random relabeling: a permutation of the
/// tetrahedra and a vertex permutation for each.
fn fixture_with_relabeling() -> impl Strategy<Value = (Triangulation, Vec<usize>, Vec<Perm4>)> {
    fixture().prop_flat_map(|tri| {
        let n = tri.size();
        (
            Just(tri),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(
                (0..24usize).prop_map(|i| Perm4::from_index(i).unwrap()),
                n,
            ),
        )
    })
}

/// Rebuilds `tri` with tetrahedron `t` renamed to `sigma[t]` and its
/// vertices relabeled by `rho[t]`.
fn relabel(tri: &Triangulation, sigma: &[usize], rho: &[Perm4]) -> Triangulation {
    let mut gluings = Vec::new();
    for t in 0..tri.size() {
        for f in 0..4u8 {
            let Some(g) = tri.gluing(t, f) else { continue };
            let perm = rho[g.adj] * g.perm * rho[t].inverse();
            let facet = rho[t].apply(f);
            gluings.push((sigma[t], facet, sigma[g.adj], perm.apply(facet), perm));
        }
    }
    Triangulation::from_gluings(tri.size(), &gluings).unwrap()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_isosig_is_an_isomorphism_invariant(
        (tri, sigma, rho) in fixture_with_relabeling()
    ) {
        let relabeled = relabel(&tri, &sigma, &rho);
        prop_assert_eq!(isosig(&relabeled), isosig(&tri));
    }

    #[test]
    fn prop_isosig_round_trips(tri in fixture()) {
        let sig = isosig(&tri);
        let back = from_isosig(&sig).unwrap();

        prop_assert_eq!(isosig(&back), sig);
        prop_assert_eq!(back.size(), tri.size());
        prop_assert_eq!(back.is_valid(), tri.is_valid());
        prop_assert_eq!(back.is_orientable(), tri.is_orientable());
        prop_assert_eq!(back.is_ideal(), tri.is_ideal());
        prop_assert_eq!(back.euler_char_tri(), tri.euler_char_tri());
    }

    #[test]
    fn prop_closed_triangulations_have_zero_euler_characteristic(tri in fixture()) {
        if tri.is_valid() && tri.is_closed() {
            prop_assert_eq!(tri.euler_char_tri(), 0);
        }
    }

    #[test]
    fn prop_rehydration_inverts_dehydration(tri in fixture()) {
        // Dehydration only handles connected triangulations without
        // boundary facets; skip the fixtures it rejects.
        if let Ok(text) = dehydrate(&tri) {
            let back = rehydrate(&text).unwrap();
            prop_assert_eq!(isosig(&back), isosig(&tri));
        }
    }

    #[test]
    fn prop_skeletal_counts_survive_the_round_trip(tri in fixture()) {
        let back = from_isosig(&isosig(&tri)).unwrap();
        let a = tri.skeleton();
        let b = back.skeleton();

        prop_assert_eq!(a.vertices().len(), b.vertices().len());
        prop_assert_eq!(a.edges().len(), b.edges().len());
        prop_assert_eq!(a.boundary_components().len(), b.boundary_components().len());
    }
}
