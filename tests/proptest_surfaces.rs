//! Property-based tests for normal surface arithmetic and analysis.
//!
//! This module uses proptest to verify invariants that every compact
//! embedded normal surface must satisfy: vertex links are connected,
//! two-sided spheres or discs; edge weights add under surface addition;
//! and scaling commutes with primitive reduction.

use std::sync::Arc;

use num_bigint::BigInt;
use proptest::prelude::*;
use trisurf::core::{Perm4, Triangulation};
use trisurf::prelude::*;
use trisurf::surface::vertex_link_surface;

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

fn fixture() -> impl Strategy<Value = Arc<Triangulation>> {
    prop_oneof![
        Just(Triangulation::sphere()),
        Just(Triangulation::ball()),
        Just(Triangulation::sphere_bundle()),
        Just(Triangulation::twisted_sphere_bundle()),
        Just(figure_eight()),
        (2usize..6, any::<bool>())
            .prop_map(|(length, twisted)| Triangulation::layered_loop(length, twisted)),
    ]
    .prop_map(Arc::new)
}

/// A fixture together with one of its vertex classes.
fn fixture_with_vertex() -> impl Strategy<Value = (Arc<Triangulation>, usize)> {
    fixture().prop_flat_map(|tri| {
        let vertices = tri.skeleton().vertices().len();
        (Just(tri), 0..vertices)
    })
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_vertex_links_are_connected_and_two_sided(
        (tri, vertex) in fixture_with_vertex()
    ) {
        let link = vertex_link_surface(&tri, vertex);

        prop_assert!(link.is_compact());
        prop_assert!(link.is_vertex_linking());
        prop_assert_eq!(link.vertex_link(), Some(vertex));
        prop_assert_eq!(link.is_connected(), Some(true));
        prop_assert_eq!(link.is_two_sided(), Some(true));
        prop_assert_eq!(link.components().unwrap().len(), 1);
    }

    #[test]
    fn prop_edge_weights_add_under_surface_addition(
        (tri, vertex) in fixture_with_vertex()
    ) {
        let link = vertex_link_surface(&tri, vertex);
        let doubled = &link + &link;

        for edge in 0..tri.skeleton().edges().len() {
            let single = link.edge_weight(edge);
            prop_assert_eq!(doubled.edge_weight(edge), single.clone() + single);
        }
    }

    #[test]
    fn prop_scaling_is_undone_by_primitive_reduction(
        (tri, vertex) in fixture_with_vertex(),
        factor in 1u32..6
    ) {
        let link = vertex_link_surface(&tri, vertex);
        let factor = BigInt::from(factor);

        let mut scaled = link.scaled(&factor);
        prop_assert_eq!(scaled.scale_down(), factor);
        prop_assert_eq!(scaled, link);
    }

    #[test]
    fn prop_euler_characteristic_is_additive(
        (tri, vertex) in fixture_with_vertex()
    ) {
        let link = vertex_link_surface(&tri, vertex);
        let doubled = &link + &link;

        let chi = link.euler_char().unwrap();
        prop_assert_eq!(doubled.euler_char(), Some(&chi + &chi));
    }
}
