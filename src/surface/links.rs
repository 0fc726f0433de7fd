//! Face links as normal surfaces.
//!
//! # Key Features
//!
//! - [`vertex_link_surface`], [`edge_link_surface`] and
//!   [`triangle_link_surface`]: materialise the frontier of a regular
//!   neighbourhood of a face as a normal surface vector.
//! - [`NormalSurface::thin_edge_links`] and
//!   [`NormalSurface::thin_triangle_links`]: recognise a surface as a
//!   multiple of such a link.
//!
//! A vertex link is always normal.  For edges and triangles the frontier
//! of the neighbourhood need not be normal (its pieces can merge around a
//! shared face); when it is, the link is called *thin*, and the
//! constructors here return `None` in the remaining cases.
//!
//! Within a single tetrahedron the frontier contributes one disc per
//! maximal face of the linked complex: a triangle disc parallel to each
//! facet occurrence, a quadrilateral around each edge occurrence not lying
//! in such a facet, and a triangle disc at each corner occurrence not lying
//! on either.  Two such pieces sharing a face of the tetrahedron merge into
//! a non-normal disc, which is exactly when `None` is returned.

use std::sync::Arc;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::algebra::LargeInt;
use crate::core::collections::FastHashSet;
use crate::core::tetrahedron::edge_number;
use crate::core::triangulation::{facet_vertices, Triangulation};
use crate::surface::coords::{DiscEncoding, QUAD_DEFN, QUAD_SEPARATING};
use crate::surface::surface::NormalSurface;

// ===== LINK CONSTRUCTION =====

/// The link of a vertex class: one triangle disc at every corner of the
/// class.  Vertex links are always thin.
#[must_use]
pub fn vertex_link_surface(tri: &Arc<Triangulation>, vertex: usize) -> NormalSurface {
    let skeleton = tri.skeleton();
    let mut vector = vec![LargeInt::zero(); 7 * tri.size()];
    for emb in &skeleton.vertices()[vertex].embeddings {
        vector[7 * emb.tet + usize::from(emb.vertex)] += LargeInt::one();
    }
    NormalSurface::from_encoded(Arc::clone(tri), DiscEncoding::Standard, vector)
}

/// The thin link of an edge class, or `None` if the frontier of its
/// regular neighbourhood is not a normal surface.
#[must_use]
pub fn edge_link_surface(tri: &Arc<Triangulation>, edge: usize) -> Option<NormalSurface> {
    let skeleton = tri.skeleton();
    let ends = skeleton.edges()[edge].vertices;
    let mut vector = vec![LargeInt::zero(); 7 * tri.size()];
    let mut quad_type: Vec<Option<u8>> = vec![None; tri.size()];

    for emb in &skeleton.edges()[edge].embeddings {
        let a = emb.vertices.apply(0);
        let b = emb.vertices.apply(1);
        let q = QUAD_SEPARATING[usize::from(a)][usize::from(b)];
        match quad_type[emb.tet] {
            None => quad_type[emb.tet] = Some(q),
            Some(other) if other == q => {}
            // Two quadrilateral types in one tetrahedron: the tube
            // pieces intersect.
            Some(_) => return None,
        }
        vector[7 * emb.tet + 4 + usize::from(q)] += LargeInt::one();
    }

    // Balls around the endpoint vertex classes, except at corners the
    // tube already passes through.
    for tet in 0..tri.size() {
        for v in 0..4u8 {
            let class = skeleton.vertex_class(tet, v);
            if class != ends[0] && class != ends[1] {
                continue;
            }
            let touched = (0..4u8)
                .filter(|x| *x != v)
                .any(|x| skeleton.edge_class(tet, edge_number(v, x)) == edge);
            if !touched {
                vector[7 * tet + usize::from(v)] += LargeInt::one();
            }
        }
    }
    Some(NormalSurface::from_encoded(
        Arc::clone(tri),
        DiscEncoding::Standard,
        vector,
    ))
}

/// The thin link of a triangle class, or `None` if the frontier of its
/// regular neighbourhood is not a normal surface.
#[must_use]
pub fn triangle_link_surface(tri: &Arc<Triangulation>, triangle: usize) -> Option<NormalSurface> {
    let skeleton = tri.skeleton();
    let (t0, f0) = skeleton.triangles()[triangle].embeddings[0];
    let corners = facet_vertices(f0);

    let mut vertex_classes = [0usize; 3];
    let mut edge_classes = [0usize; 3];
    for i in 0..3 {
        vertex_classes[i] = skeleton.vertex_class(t0, corners[i]);
        let a = corners[i];
        let b = corners[(i + 1) % 3];
        edge_classes[i] = skeleton.edge_class(t0, edge_number(a, b));
    }

    let mut vector = vec![LargeInt::zero(); 7 * tri.size()];
    for tet in 0..tri.size() {
        let covered: Vec<u8> = (0..4u8)
            .filter(|f| skeleton.triangle_class(tet, *f) == triangle)
            .collect();
        if covered.len() >= 2 {
            return None;
        }

        if let [facet] = covered[..] {
            vector[7 * tet + usize::from(facet)] += LargeInt::one();
            // Every edge of the tetrahedron outside this facet touches
            // the slab, so it must not carry a tube of its own.
            for x in 0..4u8 {
                if x == facet {
                    continue;
                }
                let c = skeleton.edge_class(tet, edge_number(facet, x));
                if edge_classes.contains(&c) {
                    return None;
                }
            }
            // The opposite corner is the one face disjoint from the
            // slab; a ball there contributes a second parallel disc.
            if vertex_classes.contains(&skeleton.vertex_class(tet, facet)) {
                vector[7 * tet + usize::from(facet)] += LargeInt::one();
            }
            continue;
        }

        let mut quad_type: Option<u8> = None;
        let mut edge_hit = [false; 4];
        for a in 0..4u8 {
            for b in (a + 1)..4 {
                let c = skeleton.edge_class(tet, edge_number(a, b));
                if !edge_classes.contains(&c) {
                    continue;
                }
                let q = QUAD_SEPARATING[usize::from(a)][usize::from(b)];
                match quad_type {
                    None => quad_type = Some(q),
                    Some(other) if other == q => {}
                    Some(_) => return None,
                }
                vector[7 * tet + 4 + usize::from(q)] += LargeInt::one();
                edge_hit[usize::from(a)] = true;
                edge_hit[usize::from(b)] = true;
            }
        }
        for v in 0..4u8 {
            if edge_hit[usize::from(v)] {
                continue;
            }
            if vertex_classes.contains(&skeleton.vertex_class(tet, v)) {
                vector[7 * tet + usize::from(v)] += LargeInt::one();
            }
        }
    }
    Some(NormalSurface::from_encoded(
        Arc::clone(tri),
        DiscEncoding::Standard,
        vector,
    ))
}

// ===== LINK RECOGNITION =====

/// Whether `surface` is a positive integer multiple of `base`.
fn is_positive_multiple(surface: &NormalSurface, base: &NormalSurface) -> bool {
    let coord = |s: &NormalSurface, tet: usize, k: usize| -> BigInt {
        let c = match k {
            0..=3 => s.triangles(tet, k as u8),
            4..=6 => s.quads(tet, (k - 4) as u8),
            _ => s.octs(tet, (k - 7) as u8),
        };
        c.finite().cloned().unwrap_or_default()
    };

    let mut ratio: Option<BigInt> = None;
    for tet in 0..surface.triangulation().size() {
        for k in 0..10 {
            let b = coord(base, tet, k);
            let s = coord(surface, tet, k);
            if b.is_zero() {
                if !s.is_zero() {
                    return false;
                }
                continue;
            }
            match &ratio {
                None => {
                    let (q, r) = s.div_rem(&b);
                    if !r.is_zero() || !q.is_positive() {
                        return false;
                    }
                    ratio = Some(q);
                }
                Some(q) => {
                    if s != q * &b {
                        return false;
                    }
                }
            }
        }
    }
    ratio.is_some()
}

impl NormalSurface {
    /// The edge classes (at most two) of which this surface is a thin
    /// link, as a pair with trailing `None`s.
    ///
    /// Works directly from the coordinates: the quadrilaterals pin down
    /// the candidate edges and their multiplicity, and the triangle
    /// coordinates are then verified against the link of each candidate.
    #[must_use]
    pub fn thin_edge_links(&self) -> (Option<usize>, Option<usize>) {
        let skeleton = self.triangulation().skeleton();
        let size = self.triangulation().size();

        if self.encoding().stores_octagons() {
            for tet in 0..size {
                for q in 0..3u8 {
                    if !self.octs(tet, q).is_zero() {
                        return (None, None);
                    }
                }
            }
        }

        // Candidate edges from the quadrilateral coordinates.
        let mut not_ans: FastHashSet<usize> = FastHashSet::default();
        let mut found_quads = false;
        let mut ans: [Option<usize>; 2] = [None, None];
        let mut ans_mult_double = LargeInt::zero();
        let two = LargeInt::from(2);

        for tet in 0..size {
            for quad in 0..3u8 {
                let coord = self.quads(tet, quad);
                let d = QUAD_DEFN[usize::from(quad)];
                let class =
                    |a: u8, b: u8| skeleton.edge_class(tet, edge_number(a, b));
                // The two edges the quadrilateral links, then the four
                // edges it crosses.
                let e = [
                    class(d[0], d[1]),
                    class(d[2], d[3]),
                    class(d[0], d[2]),
                    class(d[0], d[3]),
                    class(d[1], d[2]),
                    class(d[1], d[3]),
                ];

                if coord.is_zero() {
                    if found_quads {
                        for slot in &mut ans {
                            if *slot == Some(e[0]) || *slot == Some(e[1]) {
                                *slot = None;
                            }
                        }
                    } else {
                        not_ans.insert(e[0]);
                        not_ans.insert(e[1]);
                    }
                } else {
                    if found_quads {
                        if e[0] == e[1] {
                            // The same edge on both sides: only one
                            // candidate can remain.
                            if Some(e[0]) == ans[0] {
                                ans[1] = None;
                            } else if Some(e[0]) == ans[1] {
                                ans[0] = ans[1];
                                ans[1] = None;
                            } else {
                                return (None, None);
                            }
                            if ans[0].is_none() || ans_mult_double != coord {
                                return (None, None);
                            }
                        } else {
                            for slot in &mut ans {
                                if *slot != Some(e[0]) && *slot != Some(e[1]) {
                                    *slot = None;
                                }
                            }
                            if ans_mult_double != coord.clone() * two.clone() {
                                return (None, None);
                            }
                        }
                    } else {
                        if e[0] == e[1] {
                            if not_ans.contains(&e[0]) {
                                return (None, None);
                            }
                            ans[0] = Some(e[0]);
                            ans[1] = None;
                            ans_mult_double = coord.clone();
                        } else {
                            for i in 0..2 {
                                if not_ans.contains(&e[i]) {
                                    ans[i] = None;
                                } else {
                                    ans[i] = Some(e[i]);
                                    ans_mult_double = coord.clone() * two.clone();
                                }
                            }
                        }
                        found_quads = true;
                    }

                    // The candidates must not meet the crossed edges.
                    for crossed in &e[2..6] {
                        for slot in &mut ans {
                            if *slot == Some(*crossed) {
                                *slot = None;
                            }
                        }
                    }
                }

                if found_quads && ans[0].is_none() && ans[1].is_none() {
                    return (None, None);
                }
            }
        }

        if !found_quads || (ans[0].is_none() && ans[1].is_none()) {
            return (None, None);
        }

        // Verify the triangle coordinates against each candidate.
        for tet in 0..size {
            for v in 0..4u8 {
                let coord = self.triangles(tet, v);
                let vclass = skeleton.vertex_class(tet, v);
                for slot in &mut ans {
                    let Some(candidate) = *slot else { continue };
                    let ends = skeleton.edges()[candidate].vertices;
                    let mut expect_zero = vclass != ends[0] && vclass != ends[1];
                    if !expect_zero {
                        // A triangle disc crossing the candidate edge
                        // cannot belong to its link.
                        for x in 0..4u8 {
                            if x != v
                                && skeleton.edge_class(tet, edge_number(v, x)) == candidate
                            {
                                expect_zero = true;
                                break;
                            }
                        }
                    }
                    if expect_zero {
                        if !coord.is_zero() {
                            *slot = None;
                        }
                    } else if ans_mult_double != coord.clone() * two.clone() {
                        *slot = None;
                    }
                }
                if ans[0].is_none() && ans[1].is_none() {
                    return (None, None);
                }
            }
        }

        if ans[0].is_some() {
            (ans[0], ans[1])
        } else {
            (ans[1], None)
        }
    }

    /// The triangle classes (at most two) of which this surface is a
    /// positive multiple of the thin link.
    #[must_use]
    pub fn thin_triangle_links(&self) -> (Option<usize>, Option<usize>) {
        if self.is_empty() || !self.is_compact() || self.octagon_position().is_some() {
            return (None, None);
        }
        let skeleton = self.triangulation().skeleton();
        let mut first = None;
        for t in 0..skeleton.triangles().len() {
            let Some(link) = triangle_link_surface(self.triangulation(), t) else {
                continue;
            };
            if is_positive_multiple(self, &link) {
                if first.is_none() {
                    first = Some(t);
                } else {
                    return (first, Some(t));
                }
            }
        }
        (first, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_links_are_vertex_linking() {
        let tri = Arc::new(Triangulation::layered_loop(2, false));
        let skeleton = tri.skeleton();
        for v in 0..skeleton.vertices().len() {
            let s = vertex_link_surface(&tri, v);
            assert_eq!(s.vertex_link(), Some(v));
            assert_eq!(s.thin_edge_links(), (None, None));
        }
    }

    #[test]
    fn edge_link_in_the_two_tetrahedron_sphere() {
        let tri = Arc::new(Triangulation::sphere());
        let skeleton = tri.skeleton();
        let e01 = skeleton.edge_class(0, edge_number(0, 1));
        let e23 = skeleton.edge_class(0, edge_number(2, 3));
        assert_ne!(e01, e23);

        let link = edge_link_surface(&tri, e01).expect("edge link is thin");
        // A tube around an unknotted arc.
        assert_eq!(link.euler_char(), Some(BigInt::from(2)));
        assert_eq!(link.quads(0, 0), LargeInt::one());
        assert_eq!(link.quads(1, 0), LargeInt::one());

        // Quad type 0 links edges 01 and 23 simultaneously, so this
        // surface is the thin link of both edges at once.
        let (a, b) = link.thin_edge_links();
        let mut found = [a.unwrap(), b.unwrap()];
        found.sort_unstable();
        let mut expected = [e01, e23];
        expected.sort_unstable();
        assert_eq!(found, expected);
    }

    #[test]
    fn doubled_edge_link_is_still_recognised() {
        let tri = Arc::new(Triangulation::sphere());
        let skeleton = tri.skeleton();
        let e01 = skeleton.edge_class(0, edge_number(0, 1));
        let link = edge_link_surface(&tri, e01).expect("edge link is thin");
        let double = &link + &link;
        let (a, _) = double.thin_edge_links();
        assert!(a.is_some());
    }

    #[test]
    fn triangle_link_in_the_two_tetrahedron_sphere() {
        let tri = Arc::new(Triangulation::sphere());
        let skeleton = tri.skeleton();
        let class = skeleton.triangle_class(0, 0);
        let link = triangle_link_surface(&tri, class).expect("triangle link is thin");
        // The link of an internal triangle here is a parallel sphere,
        // which is also the link of the opposite vertex.
        assert_eq!(link.euler_char(), Some(BigInt::from(2)));
        assert_eq!(link.vertex_link(), Some(skeleton.vertex_class(0, 0)));

        let (a, b) = link.thin_triangle_links();
        assert_eq!(a, Some(class));
        assert_eq!(b, None);
    }

    #[test]
    fn quad_surface_is_not_a_triangle_link() {
        let tri = Arc::new(Triangulation::sphere());
        let mut vector = vec![LargeInt::zero(); 7 * tri.size()];
        vector[4 + 1] += LargeInt::one();
        vector[7 + 4 + 1] += LargeInt::one();
        let s = NormalSurface::from_encoded(Arc::clone(&tri), DiscEncoding::Standard, vector);
        assert_eq!(s.thin_triangle_links(), (None, None));
    }
}
