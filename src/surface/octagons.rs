//! Conversion of almost normal surfaces to normal surfaces.
//!
//! An embedded almost normal surface can be isotoped to a genuine normal
//! surface after retriangulating: every tetrahedron carrying octagons is
//! split into three, so that each octagon becomes a quadrilateral of the
//! middle piece together with triangles of the outer pieces.

use std::sync::Arc;

use crate::algebra::LargeInt;
use crate::core::perm::Perm4;
use crate::core::tetrahedron::EDGE_VERTEX;
use crate::core::triangulation::Triangulation;
use crate::surface::coords::DiscEncoding;
use crate::surface::surface::NormalSurface;

impl NormalSurface {
    /// Rewrites this surface without octagon coordinates, retriangulating
    /// where necessary.
    ///
    /// Every tetrahedron containing octagons (necessarily of a single
    /// type, for an embedded surface) is replaced by a chain of three
    /// tetrahedra `A = B = C`, where `B` keeps the original index and
    /// `A`, `C` are appended at the end.  The returned surface is
    /// isotopic to this one inside the new triangulation and is stored
    /// in the standard (octagon-free) encoding.
    ///
    /// The surface must be embedded; in particular no tetrahedron may
    /// carry both quadrilaterals and octagons.
    #[must_use]
    pub fn remove_octagons(&self) -> NormalSurface {
        let tri = self.triangulation();
        let n = tri.size();

        let mut expand: Vec<(usize, u8)> = Vec::new();
        for i in 0..n {
            for j in 0..3u8 {
                if !self.octs(i, j).is_zero() {
                    expand.push((i, j));
                    break;
                }
            }
        }

        // Octagons are stored last, so the new blocks are prefixes of
        // the old ones.
        let block = DiscEncoding::Standard.block();
        let mut v = vec![LargeInt::zero(); (n + 2 * expand.len()) * block];
        for i in 0..n {
            for j in 0..block {
                v[block * i + j] = self.vector()[self.encoding().block() * i + j].clone();
            }
        }

        if expand.is_empty() {
            return NormalSurface::from_encoded(Arc::clone(tri), DiscEncoding::Standard, v);
        }

        let mut retri = (**tri).clone();

        for (i, &(b, oct)) in expand.iter().enumerate() {
            let a = retri.new_tetrahedron();
            let c = retri.new_tetrahedron();
            debug_assert_eq!(a, n + 2 * i);

            // The two facets on either side of edge `oct` keep tetrahedron
            // A company; those on either side of edge `5 - oct` go to C.
            let a_ext = EDGE_VERTEX[usize::from(5 - oct)];
            let c_ext = EDGE_VERTEX[usize::from(oct)];

            // Transfer the external gluings of B's split-off facets.
            for j in 0..2 {
                if let Some(g) = retri.gluing(b, a_ext[j]) {
                    retri.unglue(b, a_ext[j]).expect("gluing exists");
                    if g.adj == b {
                        if g.perm.apply(a_ext[j]) == a_ext[j ^ 1] {
                            retri.join(a, a_ext[j], a, g.perm).expect("split is valid");
                        } else {
                            retri.join(a, a_ext[j], c, g.perm).expect("split is valid");
                        }
                    } else {
                        retri.join(a, a_ext[j], g.adj, g.perm).expect("split is valid");
                    }
                }
            }
            for j in 0..2 {
                if let Some(g) = retri.gluing(b, c_ext[j]) {
                    retri.unglue(b, c_ext[j]).expect("gluing exists");
                    if g.adj == b {
                        if g.perm.apply(c_ext[j]) == c_ext[j ^ 1] {
                            retri.join(c, c_ext[j], c, g.perm).expect("split is valid");
                        } else {
                            retri.join(c, c_ext[j], a, g.perm).expect("split is valid");
                        }
                    } else {
                        retri.join(c, c_ext[j], g.adj, g.perm).expect("split is valid");
                    }
                }
            }

            // The internal gluings of the three-tetrahedron chain.
            let b_swap = Perm4::swap(a_ext[0], a_ext[1]);
            retri.join(b, c_ext[0], a, b_swap).expect("split is valid");
            retri.join(b, c_ext[1], a, b_swap).expect("split is valid");
            retri.join(b, a_ext[0], c, b_swap).expect("split is valid");
            retri.join(b, a_ext[1], c, b_swap).expect("split is valid");

            // Propagate the original triangle coordinates, then convert
            // the octagons: a quadrilateral of B plus triangles of A and C.
            let n_octs = self.octs(b, oct);
            for j in 0..4 {
                v[block * a + j] = v[block * b + j].clone();
                v[block * c + j] = v[block * b + j].clone();
            }
            v.swap(
                block * b + usize::from(a_ext[0]),
                block * b + usize::from(a_ext[1]),
            );

            v[block * b + 4 + usize::from(oct)] += n_octs.clone();
            v[block * a + usize::from(c_ext[0])] += n_octs.clone();
            v[block * a + usize::from(c_ext[1])] += n_octs.clone();
            v[block * c + usize::from(a_ext[0])] += n_octs.clone();
            v[block * c + usize::from(a_ext[1])] += n_octs;
        }

        NormalSurface::from_encoded(Arc::new(retri), DiscEncoding::Standard, v)
    }
}
