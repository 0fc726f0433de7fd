//! Integration tests for the end-to-end normal surface workflow.
//!
//! These tests cover:
//! - Isomorphism signatures of degenerate inputs
//! - Spun normal surfaces in an ideal triangulation
//! - Connected components of surfaces in disconnected triangulations
//! - Quad vertex surfaces of a small closed manifold

use std::sync::Arc;

use num_bigint::BigInt;
use trisurf::core::{from_isosig, isosig};
use trisurf::prelude::*;
use trisurf::surface::vertex_link_surface;

// =============================================================================
// FIXTURES
// =============================================================================

/// The two-tetrahedron ideal triangulation of the figure eight knot
/// complement.
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

/// The one-tetrahedron Gieseking manifold: non-orientable, with a single
/// ideal vertex whose link is a Klein bottle.
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
// SIGNATURES
// =============================================================================

#[test]
fn the_empty_triangulation_has_the_one_letter_signature() {
    let empty = Triangulation::new();
    assert_eq!(isosig(&empty), "a");

    let back = from_isosig("a").unwrap();
    assert!(back.is_empty());
    assert_eq!(isosig(&back), "a");
}

// =============================================================================
// SPUN SURFACES
// =============================================================================

#[test]
fn the_figure_eight_complement_supports_only_spun_quad_surfaces() {
    let tri = figure_eight();
    assert!(tri.is_valid() && tri.is_ideal() && tri.is_orientable());

    let quads = NormalSurfaces::enumerate(tri.clone(), CoordSystem::Quad).unwrap();
    assert_eq!(quads.len(), 4);
    for s in &quads {
        assert!(!s.is_compact());
        assert_eq!(s.euler_char(), None);
        assert_eq!(s.is_connected(), None);
        assert_eq!(s.components(), None);
    }

    // In standard coordinates the only compact vertex surface is the
    // boundary torus, linking the lone ideal vertex.
    let standard = NormalSurfaces::enumerate_with(
        Arc::new(tri),
        CoordSystem::Standard,
        ListKind::Vertex,
        Embedding::EmbeddedOnly,
        Algorithm::DoubleDescription,
        &NullProgress,
    )
    .unwrap();
    assert_eq!(standard.len(), 1);
    assert!(standard[0].is_vertex_linking());
    assert_eq!(standard[0].euler_char(), Some(BigInt::from(0)));
}

// =============================================================================
// COMPONENTS ACROSS A DISJOINT UNION
// =============================================================================

#[test]
fn components_of_a_surface_in_a_disjoint_union_are_stable() {
    let mut tri = figure_eight();
    tri.insert_triangulation(&gieseking());
    assert!(!tri.is_connected());

    let tri = Arc::new(tri);
    let skeleton = tri.skeleton();

    // One ideal vertex in each connected component.
    let first = skeleton.vertices().iter().position(|v| v.component == 0).unwrap();
    let second = skeleton.vertices().iter().position(|v| v.component == 1).unwrap();

    let sum = &vertex_link_surface(&tri, first) + &vertex_link_surface(&tri, second);
    assert_eq!(sum.is_connected(), Some(false));

    let once = sum.components().unwrap();
    let again = sum.components().unwrap();
    assert_eq!(once, again);
    assert_eq!(once.len(), 2);
    for piece in &once {
        assert!(piece.is_vertex_linking());
        assert_eq!(piece.is_connected(), Some(true));
    }

    // A torus link and a Klein bottle link: one of each sidedness.
    let two_sided: Vec<_> = once.iter().map(|p| p.is_two_sided().unwrap()).collect();
    assert!(two_sided.contains(&true));
    let orientable: Vec<_> = once.iter().map(|p| p.is_orientable().unwrap()).collect();
    assert!(orientable.contains(&false));
}

// =============================================================================
// QUAD SURFACES OF A CLOSED MANIFOLD
// =============================================================================

#[test]
fn quad_vertex_surfaces_of_real_projective_space() {
    let tri = Triangulation::layered_loop(2, false);
    assert!(tri.is_closed() && tri.is_orientable());

    let list = NormalSurfaces::enumerate(tri, CoordSystem::Quad).unwrap();
    assert_eq!(list.len(), 3);

    let mut tori = 0;
    let mut projective_planes = 0;
    for s in &list {
        match s.euler_char().unwrap().try_into().unwrap() {
            0i32 => {
                tori += 1;
                assert_eq!(s.is_orientable(), Some(true));
                assert_eq!(s.is_two_sided(), Some(true));
                assert!(s.is_splitting());
                assert_eq!(s.is_central(), Some(2));
                let (first, second) = s.thin_edge_links();
                assert!(first.is_some() && second.is_some());
            }
            1i32 => {
                projective_planes += 1;
                assert_eq!(s.is_orientable(), Some(false));
                assert_eq!(s.is_two_sided(), Some(false));
            }
            chi => panic!("unexpected Euler characteristic {chi}"),
        }
    }
    assert_eq!(tori, 1);
    assert_eq!(projective_planes, 2);
}
