//! Matching equations and admissibility constraints.
//!
//! # Key Features
//!
//! - [`matching_equations`]: builds the integer matrix whose non-negative
//!   null space contains exactly the (embedded or immersed) normal surface
//!   vectors for a given triangulation and coordinate system.
//! - [`admissibility_groups`]: the per-tetrahedron "at most one non-zero"
//!   column groups that cut the solution cone down to embedded surfaces.
//!
//! # Row generation
//!
//! Standard systems produce three rows per internal triangle, one for each
//! arc type on that triangle: the discs cutting off a given vertex must
//! agree from both sides of the gluing.  Reduced systems produce one row
//! per internal valid edge: summing the arc equations around the edge
//! cancels the triangle coordinates and leaves a signed sum of
//! quadrilateral (and octagon) coordinates.
//!
//! Closed variants additionally force surfaces away from the ideal
//! vertices: for each torus cusp we emit holonomy rows around the cusp's
//! link graph, so that the triangle-coordinate extension cannot spin.

use num_bigint::BigInt;
use num_traits::Zero;
use thiserror::Error;

use crate::algebra::MatrixInt;
use crate::core::collections::FastHashMap;
use crate::core::triangulation::{facet_vertices, FacetInfo, Triangulation};
use crate::surface::coords::{CoordSystem, QUAD_SEPARATING};

/// An error produced while building matching equations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchingError {
    /// The coordinate system cannot be used with this triangulation.
    #[error("coordinate system {system} is not supported here: {reason}")]
    UnsupportedSystem {
        /// The offending coordinate system.
        system: CoordSystem,
        /// Why the combination is rejected.
        reason: String,
    },

    /// The triangulation has invalid edges or vertices, so matching
    /// equations are not well defined.
    #[error("matching equations require a valid triangulation")]
    InvalidTriangulation,
}

/// Builds the matching equation matrix for `tri` in the system `system`.
///
/// One column per coordinate of the system; a vector represents a normal
/// surface precisely when it is non-negative, satisfies every row, and
/// (for embedded surfaces) respects the admissibility groups.
///
/// # Errors
///
/// Returns [`MatchingError::InvalidTriangulation`] if the triangulation
/// has invalid faces, and [`MatchingError::UnsupportedSystem`] if a closed
/// variant is requested for a triangulation whose ideal vertices are not
/// all torus cusps.
///
/// # Examples
///
/// ```
/// use trisurf::core::Triangulation;
/// use trisurf::surface::{matching_equations, CoordSystem};
///
/// let tri = Triangulation::sphere();
/// let m = matching_equations(&tri, CoordSystem::Standard).unwrap();
/// assert_eq!(m.cols(), 7 * tri.size());
/// ```
pub fn matching_equations(
    tri: &Triangulation,
    system: CoordSystem,
) -> Result<MatrixInt, MatchingError> {
    let skeleton = tri.skeleton();
    if !skeleton.is_valid() {
        return Err(MatchingError::InvalidTriangulation);
    }

    let mut rows: Vec<Vec<BigInt>> = Vec::new();
    let cols = system.vector_len(tri.size());

    if system.stores_triangles() {
        standard_rows(tri, system, &mut rows);
    } else {
        reduced_rows(tri, system, &mut rows);
    }

    if system.is_closed_variant() {
        closed_rows(tri, system, &mut rows)?;
    }

    let mut m = MatrixInt::zero(rows.len(), cols);
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            m[(r, c)] = value;
        }
    }
    Ok(m)
}

/// Three rows per internal triangle: for each vertex of the triangle, the
/// discs cutting off that vertex agree from both sides.
fn standard_rows(tri: &Triangulation, system: CoordSystem, rows: &mut Vec<Vec<BigInt>>) {
    let cols = system.vector_len(tri.size());
    let skeleton = tri.skeleton();

    for triangle in skeleton.triangles() {
        if triangle.is_boundary() {
            continue;
        }
        let (t0, f0) = triangle.embeddings[0];
        let Ok(FacetInfo::Glued { adj: t1, adj_facet: f1, perm: g }) = tri.facet_info(t0, f0) else {
            continue;
        };

        for v in facet_vertices(f0) {
            let w = g.apply(v);
            let mut row = vec![BigInt::zero(); cols];
            arc_terms(system, &mut row, t0, v, f0, 1);
            arc_terms(system, &mut row, t1, w, f1, -1);
            if row.iter().any(|x| !x.is_zero()) {
                rows.push(row);
            }
        }
    }
}

/// Adds the coefficients of all disc types meeting facet `f` of `tet` in
/// an arc that cuts off vertex `v`, with the given sign.
fn arc_terms(system: CoordSystem, row: &mut [BigInt], tet: usize, v: u8, f: u8, sign: i64) {
    let s = BigInt::from(sign);
    row[system.triangle_column(tet, v as usize)] += &s;
    let sep = QUAD_SEPARATING[v as usize][f as usize];
    row[system.quad_column(tet, sep as usize)] += &s;
    if system.stores_octagons() {
        for o in 0..3u8 {
            if o != sep {
                row[system.oct_column(tet, o as usize)] += &s;
            }
        }
    }
}

/// One row per internal edge: the signed sum of upper and lower
/// quadrilaterals around the edge vanishes.
fn reduced_rows(tri: &Triangulation, system: CoordSystem, rows: &mut Vec<Vec<BigInt>>) {
    let cols = system.vector_len(tri.size());
    let skeleton = tri.skeleton();

    for edge in skeleton.edges() {
        if edge.is_boundary() {
            continue;
        }
        let mut row = vec![BigInt::zero(); cols];
        for emb in &edge.embeddings {
            let p = emb.vertices;
            let upper = QUAD_SEPARATING[p.apply(0) as usize][p.apply(2) as usize];
            let lower = QUAD_SEPARATING[p.apply(0) as usize][p.apply(3) as usize];
            row[system.quad_column(emb.tet, upper as usize)] += 1;
            row[system.quad_column(emb.tet, lower as usize)] -= 1;
            if system.stores_octagons() {
                // An octagon meets the edge like the two quadrilaterals of
                // the other types combined, which negates its coefficient.
                row[system.oct_column(emb.tet, upper as usize)] -= 1;
                row[system.oct_column(emb.tet, lower as usize)] += 1;
            }
        }
        if row.iter().any(|x| !x.is_zero()) {
            rows.push(row);
        }
    }
}

/// Holonomy rows around each ideal vertex link, forcing the canonical
/// triangle extension to stay finite.
///
/// The link graph has one node per corner embedding of the vertex and one
/// arc per facet crossing; the triangle coordinate changes across a
/// crossing by a difference of quadrilateral coordinates.  A surface
/// avoids the cusp precisely when every cycle carries zero total change,
/// so we emit one row per non-tree crossing of a spanning tree.
fn closed_rows(
    tri: &Triangulation,
    system: CoordSystem,
    rows: &mut Vec<Vec<BigInt>>,
) -> Result<(), MatchingError> {
    let cols = system.vector_len(tri.size());
    let skeleton = tri.skeleton();

    let mut found_cusp = false;
    for vertex in skeleton.vertices() {
        if !vertex.is_ideal() {
            continue;
        }
        if vertex.link_euler_char != 0 || !vertex.link_orientable {
            return Err(MatchingError::UnsupportedSystem {
                system,
                reason: "closed variants require all ideal vertices to be torus cusps".into(),
            });
        }
        found_cusp = true;

        // Potentials along a spanning tree of the link graph, as linear
        // expressions in the surface coordinates.
        let mut potential: FastHashMap<(usize, u8), Vec<BigInt>> = FastHashMap::default();
        for emb in &vertex.embeddings {
            let node = (emb.tet, emb.vertex);
            if potential.contains_key(&node) {
                continue;
            }
            potential.insert(node, vec![BigInt::zero(); cols]);
            let mut queue = vec![node];
            while let Some((t, c)) = queue.pop() {
                let base = potential[&(t, c)].clone();
                for f in 0..4u8 {
                    if f == c {
                        continue;
                    }
                    let Ok(FacetInfo::Glued { adj, adj_facet, perm }) = tri.facet_info(t, f) else {
                        continue;
                    };
                    let c2 = perm.apply(c);
                    let mut crossed = base.clone();
                    crossing_terms(system, &mut crossed, t, c, f, 1);
                    crossing_terms(system, &mut crossed, adj, c2, adj_facet, -1);
                    match potential.get(&(adj, c2)) {
                        None => {
                            potential.insert((adj, c2), crossed);
                            queue.push((adj, c2));
                        }
                        Some(existing) => {
                            let row: Vec<BigInt> = crossed
                                .iter()
                                .zip(existing)
                                .map(|(a, b)| a - b)
                                .collect();
                            if row.iter().any(|x| !x.is_zero()) {
                                rows.push(row);
                            }
                        }
                    }
                }
            }
        }
    }

    if !found_cusp && tri.skeleton().has_real_boundary() {
        return Err(MatchingError::UnsupportedSystem {
            system,
            reason: "closed variants require an ideal triangulation".into(),
        });
    }
    Ok(())
}

/// The change in the triangle coordinate at corner `c` when crossing facet
/// `f`: the quadrilateral-like discs whose arcs cut off `c` on `f`.
fn crossing_terms(system: CoordSystem, row: &mut [BigInt], tet: usize, c: u8, f: u8, sign: i64) {
    let s = BigInt::from(sign);
    let sep = QUAD_SEPARATING[c as usize][f as usize];
    row[system.quad_column(tet, sep as usize)] += &s;
    if system.stores_octagons() {
        for o in 0..3u8 {
            if o != sep {
                row[system.oct_column(tet, o as usize)] += &s;
            }
        }
    }
}

/// The per-tetrahedron admissibility groups for `system`: within each
/// group at most one coordinate of an embedded surface may be non-zero.
pub fn admissibility_groups(size: usize, system: CoordSystem) -> Vec<Vec<usize>> {
    let mut groups = Vec::with_capacity(size);
    for tet in 0..size {
        let mut group = Vec::with_capacity(system.quad_block_size());
        for q in 0..3 {
            group.push(system.quad_column(tet, q));
        }
        if system.stores_octagons() {
            for q in 0..3 {
                group.push(system.oct_column(tet, q));
            }
        }
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Perm4;

    fn figure_eight() -> Triangulation {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(2);
        tri.glue(0, 0, 1, 1, Perm4::raw([2, 1, 0, 3])).unwrap();
        tri.glue(0, 1, 1, 0, Perm4::raw([1, 0, 3, 2])).unwrap();
        tri.glue(0, 2, 1, 3, Perm4::raw([0, 3, 2, 1])).unwrap();
        tri.glue(0, 3, 1, 2, Perm4::raw([0, 3, 2, 1])).unwrap();
        tri
    }

    #[test]
    fn standard_rows_for_closed_manifold() {
        let tri = Triangulation::sphere();
        let m = matching_equations(&tri, CoordSystem::Standard).unwrap();
        assert_eq!(m.cols(), 14);
        // 4 internal triangles, 3 arc types each, no degenerate rows.
        assert_eq!(m.rows(), 12);
    }

    #[test]
    fn quad_rows_count_internal_edges() {
        let tri = figure_eight();
        let m = matching_equations(&tri, CoordSystem::Quad).unwrap();
        assert_eq!(m.cols(), 6);
        // Two edges, both internal.
        assert_eq!(m.rows(), 2);
    }

    #[test]
    fn vertex_link_satisfies_standard_equations() {
        let tri = figure_eight();
        let m = matching_equations(&tri, CoordSystem::Standard).unwrap();
        // The full vertex link: one triangle of each type, no quads.
        let mut v = vec![BigInt::zero(); 14];
        for tet in 0..2 {
            for corner in 0..4 {
                v[7 * tet + corner] = BigInt::from(1);
            }
        }
        for r in 0..m.rows() {
            let sum: BigInt = (0..14).map(|c| &m[(r, c)] * &v[c]).sum();
            assert_eq!(sum, BigInt::zero(), "row {r} not satisfied");
        }
    }

    #[test]
    fn boundary_facets_produce_no_rows() {
        let tri = Triangulation::ball();
        let m = matching_equations(&tri, CoordSystem::Standard).unwrap();
        assert_eq!(m.rows(), 0);
        assert_eq!(m.cols(), 7);
    }

    #[test]
    fn closed_variant_rejects_real_boundary() {
        let tri = Triangulation::ball();
        let err = matching_equations(&tri, CoordSystem::QuadClosed).unwrap_err();
        assert!(matches!(err, MatchingError::UnsupportedSystem { .. }));
    }

    #[test]
    fn closed_variant_adds_cusp_rows() {
        let tri = figure_eight();
        let base = matching_equations(&tri, CoordSystem::Quad).unwrap();
        let closed = matching_equations(&tri, CoordSystem::QuadClosed).unwrap();
        assert!(closed.rows() > base.rows());
    }

    #[test]
    fn admissibility_groups_per_tet() {
        let groups = admissibility_groups(2, CoordSystem::Quad);
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let groups = admissibility_groups(1, CoordSystem::QuadOct);
        assert_eq!(groups, vec![vec![0, 1, 2, 3, 4, 5]]);
    }
}
