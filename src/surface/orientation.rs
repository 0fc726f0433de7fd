//! Connectedness, orientability and sidedness of compact surfaces.
//!
//! These properties are read off the *disc graph*: one node per
//! individual normal disc, one edge per normal arc shared by two discs
//! across a face of the triangulation.  A breadth-first sweep labels each
//! disc with a component index, a surface orientation and a transverse
//! side; a relation that cannot be satisfied on some component witnesses
//! non-orientability or one-sidedness of that component.
//!
//! Discs are numbered within their tetrahedron following the usual
//! conventions: triangles outwards from their vertex, quadrilaterals and
//! octagons away from the side of the edge containing vertex 0.  Arcs of
//! a given type (a face of the tetrahedron plus the vertex the arc cuts
//! off) are numbered from the vertex outwards, and this numbering agrees
//! across a face gluing, which is what stitches the graph together.

use std::collections::VecDeque;
use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::algebra::LargeInt;
use crate::core::collections::{FacetNumber, TetIndex};
use crate::core::perm::Perm4;
use crate::surface::coords::quad_partner;
use crate::surface::surface::NormalSurface;

// =============================================================================
// DISC BOUNDARY CYCLES
// =============================================================================

// Each permutation [w, a, b, f] is a directed normal arc: it runs around
// vertex w, parallel to the directed edge from a to b, inside face f.
// Listing the boundary arcs of every disc type in consecutive order fixes
// a reference orientation for each disc.

/// Boundary arcs of the triangular disc at each vertex.
const TRI_ARCS: [[Perm4; 3]; 4] = [
    [
        Perm4::raw([0, 1, 2, 3]),
        Perm4::raw([0, 2, 3, 1]),
        Perm4::raw([0, 3, 1, 2]),
    ],
    [
        Perm4::raw([1, 0, 2, 3]),
        Perm4::raw([1, 2, 3, 0]),
        Perm4::raw([1, 3, 0, 2]),
    ],
    [
        Perm4::raw([2, 0, 1, 3]),
        Perm4::raw([2, 1, 3, 0]),
        Perm4::raw([2, 3, 0, 1]),
    ],
    [
        Perm4::raw([3, 0, 1, 2]),
        Perm4::raw([3, 1, 2, 0]),
        Perm4::raw([3, 2, 0, 1]),
    ],
];

/// Boundary arcs of each quadrilateral type, visiting the four corners of
/// the quadrilateral in order.
const QUAD_ARCS: [[Perm4; 4]; 3] = [
    [
        Perm4::raw([2, 0, 1, 3]),
        Perm4::raw([1, 2, 3, 0]),
        Perm4::raw([3, 1, 0, 2]),
        Perm4::raw([0, 3, 2, 1]),
    ],
    [
        Perm4::raw([1, 0, 2, 3]),
        Perm4::raw([2, 1, 3, 0]),
        Perm4::raw([3, 2, 0, 1]),
        Perm4::raw([0, 3, 1, 2]),
    ],
    [
        Perm4::raw([1, 0, 3, 2]),
        Perm4::raw([3, 1, 2, 0]),
        Perm4::raw([2, 3, 0, 1]),
        Perm4::raw([0, 2, 1, 3]),
    ],
];

/// Boundary arcs of each octagon type, visiting the eight corners of the
/// octagon in order.
const OCT_ARCS: [[Perm4; 8]; 3] = [
    [
        Perm4::raw([0, 2, 1, 3]),
        Perm4::raw([0, 1, 3, 2]),
        Perm4::raw([3, 0, 2, 1]),
        Perm4::raw([3, 2, 1, 0]),
        Perm4::raw([1, 3, 0, 2]),
        Perm4::raw([1, 0, 2, 3]),
        Perm4::raw([2, 1, 3, 0]),
        Perm4::raw([2, 3, 0, 1]),
    ],
    [
        Perm4::raw([0, 1, 2, 3]),
        Perm4::raw([0, 2, 3, 1]),
        Perm4::raw([3, 0, 1, 2]),
        Perm4::raw([3, 1, 2, 0]),
        Perm4::raw([2, 3, 0, 1]),
        Perm4::raw([2, 0, 1, 3]),
        Perm4::raw([1, 2, 3, 0]),
        Perm4::raw([1, 3, 0, 2]),
    ],
    [
        Perm4::raw([0, 1, 3, 2]),
        Perm4::raw([0, 3, 2, 1]),
        Perm4::raw([2, 0, 1, 3]),
        Perm4::raw([2, 1, 3, 0]),
        Perm4::raw([3, 2, 0, 1]),
        Perm4::raw([3, 0, 1, 2]),
        Perm4::raw([1, 3, 2, 0]),
        Perm4::raw([1, 2, 0, 3]),
    ],
];

/// The boundary arcs of the given disc type (0-3 triangles, 4-6
/// quadrilaterals, 7-9 octagons).
fn boundary_arcs(disc_type: u8) -> &'static [Perm4] {
    match disc_type {
        0..=3 => &TRI_ARCS[usize::from(disc_type)],
        4..=6 => &QUAD_ARCS[usize::from(disc_type - 4)],
        _ => &OCT_ARCS[usize::from(disc_type - 7)],
    }
}

/// Are discs of this type numbered away from the given vertex?
fn numbered_away_from(disc_type: u8, vertex: u8) -> bool {
    if disc_type < 4 {
        return vertex == disc_type;
    }
    let q = (disc_type - 4) % 3;
    vertex == 0 || vertex == q + 1
}

/// Does the reference transverse side of this disc type face the given
/// vertex near an arc around that vertex?
///
/// The reference side of a triangle faces its own vertex; the reference
/// side of a quadrilateral or octagon faces the edge containing vertex 0.
fn side_faces_vertex(disc_type: u8, vertex: u8) -> bool {
    if disc_type < 4 {
        return true;
    }
    let q = (disc_type - 4) % 3;
    vertex == 0 || vertex == q + 1
}

// =============================================================================
// DISC SETS
// =============================================================================

/// The individual discs of a compact embedded surface, with a flat index
/// for per-disc labels.
struct DiscSet {
    /// Disc counts per tetrahedron and disc type.
    counts: Vec<[usize; 10]>,
    /// Flat index of the first disc of each (tetrahedron, type).
    offsets: Vec<[usize; 10]>,
    total: usize,
}

impl DiscSet {
    fn new(surface: &NormalSurface) -> Option<DiscSet> {
        let n = surface.triangulation().size();
        let mut counts = Vec::with_capacity(n);
        let mut offsets = Vec::with_capacity(n);
        let mut total = 0;
        for tet in 0..n {
            let mut c = [0usize; 10];
            let mut o = [0usize; 10];
            for (t, slot) in c.iter_mut().enumerate() {
                let coord = match t {
                    0..=3 => surface.triangles(tet, t as u8),
                    4..=6 => surface.quads(tet, (t - 4) as u8),
                    _ => surface.octs(tet, (t - 7) as u8),
                };
                *slot = coord.finite()?.to_usize()?;
            }
            for (t, slot) in o.iter_mut().enumerate() {
                *slot = total;
                total += c[t];
            }
            counts.push(c);
            offsets.push(o);
        }
        Some(DiscSet {
            counts,
            offsets,
            total,
        })
    }

    fn index(&self, tet: TetIndex, disc_type: u8, number: usize) -> usize {
        self.offsets[tet][usize::from(disc_type)] + number
    }

    /// The number of the given disc's arc within the family of arcs
    /// around `vertex` in face `face`, counted from the vertex outwards.
    fn arc_from_disc(
        &self,
        tet: TetIndex,
        vertex: u8,
        disc_type: u8,
        number: usize,
    ) -> usize {
        if disc_type < 4 {
            return number;
        }
        let tris = self.counts[tet][usize::from(vertex)];
        let copies = self.counts[tet][usize::from(disc_type)];
        if numbered_away_from(disc_type, vertex) {
            tris + number
        } else {
            tris + copies - 1 - number
        }
    }

    /// The disc meeting the given arc, by the inverse of the numbering in
    /// [`Self::arc_from_disc`].
    fn disc_from_arc(
        &self,
        tet: TetIndex,
        face: FacetNumber,
        vertex: u8,
        arc: usize,
    ) -> (u8, usize) {
        let tris = self.counts[tet][usize::from(vertex)];
        if arc < tris {
            return (vertex, arc);
        }
        let k = arc - tris;
        for q in 0..3u8 {
            let disc_type = 4 + q;
            let copies = self.counts[tet][usize::from(disc_type)];
            if copies > 0 && quad_partner(q, face) == vertex {
                let number = if numbered_away_from(disc_type, vertex) {
                    k
                } else {
                    copies - 1 - k
                };
                return (disc_type, number);
            }
        }
        for q in 0..3u8 {
            let disc_type = 7 + q;
            let copies = self.counts[tet][usize::from(disc_type)];
            // Octagon arcs in a face run around the two vertices that the
            // octagon's quadrilateral type does not pair with the face.
            if copies > 0 && quad_partner(q, face) != vertex {
                let number = if numbered_away_from(disc_type, vertex) {
                    k
                } else {
                    copies - 1 - k
                };
                return (disc_type, number);
            }
        }
        unreachable!("matching equations pair every arc with a disc")
    }
}

// =============================================================================
// THE DISC GRAPH SWEEP
// =============================================================================

struct SweepResult {
    /// Component label per disc, in discovery order starting from 0.
    component: Vec<usize>,
    n_components: usize,
    /// Whether each component admits a consistent orientation.
    orientable: Vec<bool>,
    /// Whether each component admits a consistent transverse side.
    two_sided: Vec<bool>,
}

/// Labels every disc of a compact embedded surface with its component,
/// checking orientation and side relations along the way.
fn sweep(surface: &NormalSurface, discs: &DiscSet) -> SweepResult {
    let tri = surface.triangulation();
    let n = tri.size();

    // Reverse lookup from flat index to (tet, type, number).
    let mut spec = Vec::with_capacity(discs.total);
    for tet in 0..n {
        for t in 0..10u8 {
            for number in 0..discs.counts[tet][usize::from(t)] {
                spec.push((tet, t, number));
            }
        }
    }

    let mut component = vec![usize::MAX; discs.total];
    let mut orient = vec![0i8; discs.total];
    let mut side = vec![0i8; discs.total];
    let mut orientable = Vec::new();
    let mut two_sided = Vec::new();
    let mut n_components = 0;

    let mut queue = VecDeque::new();
    for start in 0..discs.total {
        if component[start] != usize::MAX {
            continue;
        }
        let label = n_components;
        n_components += 1;
        orientable.push(true);
        two_sided.push(true);

        component[start] = label;
        orient[start] = 1;
        side[start] = 1;
        queue.push_back(start);

        while let Some(disc) = queue.pop_front() {
            let (tet, disc_type, number) = spec[disc];
            for &arc in boundary_arcs(disc_type) {
                let face = arc.apply(3);
                let Some(gluing) = tri.gluing(tet, face) else {
                    continue;
                };

                let arc2 = gluing.perm * arc;
                let (tet2, face2, vertex2) = (gluing.adj, arc2.apply(3), arc2.apply(0));
                let arc_number =
                    discs.arc_from_disc(tet, arc.apply(0), disc_type, number);
                let (type2, number2) =
                    discs.disc_from_arc(tet2, face2, vertex2, arc_number);
                let neighbour = discs.index(tet2, type2, number2);

                // The neighbour's reference orientation either follows the
                // shared arc or runs against it; coherent orientations
                // must induce opposite directions on the arc.
                let follows = boundary_arcs(type2)
                    .iter()
                    .find(|p| p.apply(3) == face2 && p.apply(0) == vertex2)
                    .map(|p| p.apply(1) == arc2.apply(1))
                    .expect("every disc type has one arc per face it meets");
                let o2 = if follows { -orient[disc] } else { orient[disc] };

                // The transverse side facing the cut-off vertex continues
                // across the arc.
                let phi1 = side_faces_vertex(disc_type, arc.apply(0));
                let phi2 = side_faces_vertex(type2, vertex2);
                let s2 = if phi1 == phi2 {
                    side[disc]
                } else {
                    -side[disc]
                };

                if component[neighbour] == usize::MAX {
                    component[neighbour] = label;
                    orient[neighbour] = o2;
                    side[neighbour] = s2;
                    queue.push_back(neighbour);
                } else {
                    if orient[neighbour] != o2 {
                        orientable[label] = false;
                    }
                    if side[neighbour] != s2 {
                        two_sided[label] = false;
                    }
                }
            }
        }
    }

    SweepResult {
        component,
        n_components,
        orientable,
        two_sided,
    }
}

// =============================================================================
// SURFACE PROPERTIES
// =============================================================================

impl NormalSurface {
    fn disc_sweep(&self) -> Option<(DiscSet, SweepResult)> {
        if !self.is_compact() || !self.is_locally_embedded() {
            return None;
        }
        let discs = DiscSet::new(self)?;
        let result = sweep(self, &discs);
        Some((discs, result))
    }

    /// Is this surface connected?
    ///
    /// The empty surface is considered connected.  Returns `None` for
    /// surfaces that are not compact or not embedded.
    #[must_use]
    pub fn is_connected(&self) -> Option<bool> {
        let (_, sweep) = self.disc_sweep()?;
        Some(sweep.n_components <= 1)
    }

    /// Is this surface orientable?
    ///
    /// Returns `None` for surfaces that are not compact or not embedded.
    #[must_use]
    pub fn is_orientable(&self) -> Option<bool> {
        let (_, sweep) = self.disc_sweep()?;
        Some(sweep.orientable.iter().all(|&o| o))
    }

    /// Is this surface two-sided in the ambient triangulation?
    ///
    /// Returns `None` for surfaces that are not compact or not embedded.
    #[must_use]
    pub fn is_two_sided(&self) -> Option<bool> {
        let (_, sweep) = self.disc_sweep()?;
        Some(sweep.two_sided.iter().all(|&t| t))
    }

    /// Splits this surface into connected components.
    ///
    /// The components are rebuilt from scratch on every call and appear
    /// in a deterministic order (by their first disc in tetrahedron
    /// numbering).  Returns `None` for surfaces that are not compact or
    /// not embedded; the empty surface yields an empty list.
    #[must_use]
    pub fn components(&self) -> Option<Vec<NormalSurface>> {
        let (discs, sweep) = self.disc_sweep()?;
        let tri = self.triangulation();
        let n = tri.size();
        let block = self.encoding().block();

        let mut vectors =
            vec![vec![LargeInt::zero(); block * n]; sweep.n_components];

        let mut disc = 0;
        for tet in 0..n {
            for t in 0..10u8 {
                let column = match t {
                    0..=3 => Some(block * tet + usize::from(t)),
                    4..=6 => Some(block * tet + 4 + usize::from(t - 4)),
                    _ if self.encoding().stores_octagons() => {
                        Some(block * tet + 7 + usize::from(t - 7))
                    }
                    _ => None,
                };
                for _ in 0..discs.counts[tet][usize::from(t)] {
                    let label = sweep.component[disc];
                    let column = column.expect("octagons imply an octagon encoding");
                    vectors[label][column] += LargeInt::from(1i64);
                    disc += 1;
                }
            }
        }

        Some(
            vectors
                .into_iter()
                .map(|v| {
                    NormalSurface::from_encoded(
                        Arc::clone(tri),
                        self.encoding(),
                        v,
                    )
                })
                .collect(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::core::triangulation::Triangulation;
    use crate::surface::coords::CoordSystem;
    use crate::surface::links::vertex_link_surface;

    #[test]
    fn boundary_cycles_are_consecutive() {
        // Each consecutive pair of arcs must share a disc corner: the
        // edge holding the end of one arc holds the start of the next.
        for t in 0..10u8 {
            let arcs = boundary_arcs(t);
            for (i, arc) in arcs.iter().enumerate() {
                let next = arcs[(i + 1) % arcs.len()];
                let mut end = [arc.apply(0), arc.apply(2)];
                let mut start = [next.apply(0), next.apply(1)];
                end.sort_unstable();
                start.sort_unstable();
                assert_eq!(end, start, "disc type {t}, arc {i}");
            }
        }
    }

    #[test]
    fn vertex_links_are_connected_orientable_and_two_sided() {
        let tri = Arc::new(Triangulation::layered_loop(3, false));
        let link = vertex_link_surface(&tri, 0);
        assert_eq!(link.is_connected(), Some(true));
        assert_eq!(link.is_orientable(), Some(true));
        assert_eq!(link.is_two_sided(), Some(true));
    }

    #[test]
    fn a_doubled_link_splits_into_two_components() {
        let tri = Arc::new(Triangulation::layered_loop(3, false));
        let link = vertex_link_surface(&tri, 0);
        let doubled = link.scaled(&BigInt::from(2));

        assert_eq!(doubled.is_connected(), Some(false));
        let parts = doubled.components().unwrap();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert_eq!(part.vector(), link.vector());
        }

        // A second call must reproduce the same answer.
        let again = doubled.components().unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].vector(), parts[0].vector());
    }

    #[test]
    fn the_empty_surface_has_no_components() {
        let tri = Arc::new(Triangulation::sphere());
        let zeros = vec![BigInt::from(0); 14];
        let empty =
            NormalSurface::from_vector(tri, CoordSystem::Standard, zeros).unwrap();
        assert_eq!(empty.is_connected(), Some(true));
        assert_eq!(empty.components().unwrap().len(), 0);
    }

    #[test]
    fn an_edge_link_sphere_is_orientable_and_two_sided() {
        let tri = Arc::new(Triangulation::sphere());
        let mut coords = vec![BigInt::from(0); 6];
        coords[0] = BigInt::from(1);
        coords[3] = BigInt::from(1);
        let sphere =
            NormalSurface::from_vector(tri, CoordSystem::Quad, coords).unwrap();
        assert_eq!(sphere.is_connected(), Some(true));
        assert_eq!(sphere.is_orientable(), Some(true));
        assert_eq!(sphere.is_two_sided(), Some(true));
    }

    #[test]
    fn spun_surfaces_report_no_properties() {
        let tri = Arc::new(Triangulation::from_gluings(
            2,
            &[
                (0, 0, 1, 1, Perm4::raw([2, 1, 0, 3])),
                (0, 1, 1, 0, Perm4::raw([1, 0, 3, 2])),
                (0, 2, 1, 3, Perm4::raw([0, 3, 2, 1])),
                (0, 3, 1, 2, Perm4::raw([0, 3, 2, 1])),
            ],
        )
        .unwrap());
        // Any admissible quad solution here spins into the cusp.
        let m = crate::surface::matching::matching_equations(&tri, CoordSystem::Quad)
            .unwrap();
        let mut spun = None;
        'outer: for mask in 1u32..(1 << 6) {
            let coords: Vec<BigInt> = (0..6)
                .map(|k| BigInt::from(u32::from(mask & (1 << k) != 0)))
                .collect();
            for r in 0..m.rows() {
                let mut dot = BigInt::from(0);
                for c in 0..6 {
                    dot += &m[(r, c)] * &coords[c];
                }
                if dot != BigInt::from(0) {
                    continue 'outer;
                }
            }
            if (mask & 0b111).count_ones() <= 1 && (mask >> 3).count_ones() <= 1 {
                spun = Some(
                    NormalSurface::from_vector(
                        Arc::clone(&tri),
                        CoordSystem::Quad,
                        coords,
                    )
                    .unwrap(),
                );
                break;
            }
        }
        let spun = spun.unwrap();
        assert_eq!(spun.is_connected(), None);
        assert_eq!(spun.components(), None);
    }
}
