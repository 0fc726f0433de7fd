//! 3-Manifold Triangulations
//!
//! This module provides the `Triangulation` struct: an ordered arena of
//! tetrahedra (indexed 0…n−1) together with their facet-to-facet gluings.
//! All derived structure — vertices, edges, triangles, components, boundary
//! components — lives in the [`Skeleton`], a cache rebuilt on demand and
//! invalidated by every structural mutation.
//!
//! # Key Features
//!
//! - **Involutive gluings**: `glue`/`unglue` maintain both directions of each
//!   identification atomically; a half-applied gluing is unrepresentable.
//! - **Atomic bulk construction**: `from_gluings` validates an entire gluing
//!   table before touching any state.
//! - **Generation-checked skeleton cache**: the skeleton is stored behind an
//!   `ArcSwapOption` guarded by an atomic generation counter; any mutation
//!   bumps the generation, and `skeleton()` rebuilds lazily. Outstanding
//!   `Arc<Skeleton>` handles stay readable but describe the pre-mutation
//!   triangulation.
//! - **Editing operations**: barycentric subdivision, ideal-vertex
//!   truncation, boundary coning, and a heuristic simplifier built from
//!   3-2 and 2-0 Pachner moves.
//!
//! # Examples
//!
//! ```rust
//! use trisurf::core::perm::Perm4;
//! use trisurf::core::triangulation::Triangulation;
//!
//! // The double of a tetrahedron along its boundary: a two-tetrahedron
//! // 3-sphere.
//! let sphere = Triangulation::from_gluings(2, &[
//!     (0, 0, 1, 0, Perm4::IDENTITY),
//!     (0, 1, 1, 1, Perm4::IDENTITY),
//!     (0, 2, 1, 2, Perm4::IDENTITY),
//!     (0, 3, 1, 3, Perm4::IDENTITY),
//! ]).unwrap();
//! assert!(sphere.is_closed());
//! assert!(sphere.is_orientable());
//! assert_eq!(sphere.euler_char_tri(), 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collections::{FacetNumber, FastHashSet, TetIndex};
use super::perm::Perm4;
use super::skeleton::{Skeleton, VertexLinkType};
use super::tetrahedron::{edge_number, Gluing, Tetrahedron};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for structural mutations of a triangulation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GluingError {
    /// A tetrahedron index is out of range.
    #[error("Tetrahedron index {index} out of range (triangulation has {size} tetrahedra)")]
    TetOutOfRange {
        /// The offending index.
        index: TetIndex,
        /// The number of tetrahedra.
        size: usize,
    },
    /// A facet number is not in 0…3.
    #[error("Facet number {facet} out of range (must be 0..4)")]
    FacetOutOfRange {
        /// The offending facet number.
        facet: FacetNumber,
    },
    /// The gluing permutation does not map the source facet to the
    /// destination facet.
    #[error("Gluing permutation {perm} sends facet {facet} to {actual}, expected {expected}")]
    PermutationMismatch {
        /// The offending permutation.
        perm: Perm4,
        /// The source facet.
        facet: FacetNumber,
        /// Where the permutation actually sends the source facet.
        actual: FacetNumber,
        /// The requested destination facet.
        expected: FacetNumber,
    },
    /// A facet is glued to itself.
    #[error("Cannot glue facet {facet} of tetrahedron {tet} to itself")]
    SelfIdentification {
        /// The tetrahedron.
        tet: TetIndex,
        /// The facet.
        facet: FacetNumber,
    },
    /// A facet already participates in a gluing.
    #[error("Facet {facet} of tetrahedron {tet} is already glued")]
    AlreadyGlued {
        /// The tetrahedron.
        tet: TetIndex,
        /// The facet.
        facet: FacetNumber,
    },
    /// An unglue was requested on a boundary facet.
    #[error("Facet {facet} of tetrahedron {tet} is not glued")]
    NotGlued {
        /// The tetrahedron.
        tet: TetIndex,
        /// The facet.
        facet: FacetNumber,
    },
}

/// Error type for editing operations with topological preconditions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
    /// The operation requires a valid triangulation.
    #[error("Operation requires a valid triangulation: {reason}")]
    InvalidTriangulation {
        /// Which validity condition failed.
        reason: &'static str,
    },
}

// =============================================================================
// FACET INFO
// =============================================================================

/// The state of one facet of one tetrahedron, as reported by
/// [`Triangulation::facet_info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetInfo {
    /// The facet is unglued.
    Boundary,
    /// The facet is glued to `adj_facet` of tetrahedron `adj` via `perm`.
    Glued {
        /// The neighbouring tetrahedron.
        adj: TetIndex,
        /// The facet of the neighbour.
        adj_facet: FacetNumber,
        /// The vertex permutation of the identification.
        perm: Perm4,
    },
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// A triangulation of a (possibly empty, possibly disconnected, possibly
/// bounded or ideal) 3-manifold.
pub struct Triangulation {
    tets: Vec<Tetrahedron>,
    generation: AtomicU64,
    skeleton: ArcSwapOption<Skeleton>,
}

impl Triangulation {
    /// The empty triangulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tets: Vec::new(),
            generation: AtomicU64::new(0),
            skeleton: ArcSwapOption::empty(),
        }
    }

    /// Number of tetrahedra.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tets.len()
    }

    /// Whether this triangulation has no tetrahedra.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tets.is_empty()
    }

    /// The tetrahedra, in index order.
    #[must_use]
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tets
    }

    /// The gluing on the given facet, or `None` for a boundary facet.
    ///
    /// # Panics
    ///
    /// Panics if `tet` or `facet` is out of range; use [`Self::facet_info`]
    /// for a checked variant.
    #[must_use]
    pub fn gluing(&self, tet: TetIndex, facet: FacetNumber) -> Option<Gluing> {
        self.tets[tet].gluing(facet)
    }

    /// Checked facet lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GluingError::TetOutOfRange`] or
    /// [`GluingError::FacetOutOfRange`] on a bad address.
    pub fn facet_info(&self, tet: TetIndex, facet: FacetNumber) -> Result<FacetInfo, GluingError> {
        self.check_address(tet, facet)?;
        Ok(match self.tets[tet].gluing(facet) {
            None => FacetInfo::Boundary,
            Some(g) => FacetInfo::Glued {
                adj: g.adj,
                adj_facet: g.adj_facet(facet),
                perm: g.perm,
            },
        })
    }

    /// The current mutation generation. Bumped by every structural change.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Appends a new tetrahedron with all facets on the boundary, returning
    /// its index.
    pub fn new_tetrahedron(&mut self) -> TetIndex {
        self.invalidate();
        self.tets.push(Tetrahedron::new());
        self.tets.len() - 1
    }

    /// Appends `n` new tetrahedra, returning the index of the first.
    pub fn new_tetrahedra(&mut self, n: usize) -> TetIndex {
        self.invalidate();
        let first = self.tets.len();
        self.tets
            .extend(std::iter::repeat_with(Tetrahedron::new).take(n));
        first
    }

    /// Glues facet `facet` of tetrahedron `tet` to facet `adj_facet` of
    /// tetrahedron `adj` via `perm`, enforcing the involution invariant.
    ///
    /// # Errors
    ///
    /// Fails without modifying anything if either address is out of range,
    /// either facet is already glued, the two addresses coincide, or
    /// `perm(facet) != adj_facet`.
    pub fn glue(
        &mut self,
        tet: TetIndex,
        facet: FacetNumber,
        adj: TetIndex,
        adj_facet: FacetNumber,
        perm: Perm4,
    ) -> Result<(), GluingError> {
        self.check_address(tet, facet)?;
        self.check_address(adj, adj_facet)?;
        if perm.apply(facet) != adj_facet {
            return Err(GluingError::PermutationMismatch {
                perm,
                facet,
                actual: perm.apply(facet),
                expected: adj_facet,
            });
        }
        if tet == adj && facet == adj_facet {
            return Err(GluingError::SelfIdentification { tet, facet });
        }
        if !self.tets[tet].is_boundary_facet(facet) {
            return Err(GluingError::AlreadyGlued { tet, facet });
        }
        if !self.tets[adj].is_boundary_facet(adj_facet) {
            return Err(GluingError::AlreadyGlued {
                tet: adj,
                facet: adj_facet,
            });
        }
        self.invalidate();
        self.tets[tet].set_gluing(facet, Some(Gluing { adj, perm }));
        self.tets[adj].set_gluing(
            adj_facet,
            Some(Gluing {
                adj: tet,
                perm: perm.inverse(),
            }),
        );
        Ok(())
    }

    /// Convenience form of [`Self::glue`] where the destination facet is
    /// `perm(facet)`.
    ///
    /// # Errors
    ///
    /// As for [`Self::glue`].
    pub fn join(
        &mut self,
        tet: TetIndex,
        facet: FacetNumber,
        adj: TetIndex,
        perm: Perm4,
    ) -> Result<(), GluingError> {
        self.glue(tet, facet, adj, perm.apply(facet), perm)
    }

    /// Removes the gluing on the given facet (and its partner), returning
    /// the removed record.
    ///
    /// # Errors
    ///
    /// Fails if the address is out of range or the facet is boundary.
    pub fn unglue(&mut self, tet: TetIndex, facet: FacetNumber) -> Result<Gluing, GluingError> {
        self.check_address(tet, facet)?;
        let Some(g) = self.tets[tet].gluing(facet) else {
            return Err(GluingError::NotGlued { tet, facet });
        };
        self.invalidate();
        let adj_facet = g.adj_facet(facet);
        self.tets[tet].set_gluing(facet, None);
        self.tets[g.adj].set_gluing(adj_facet, None);
        Ok(g)
    }

    /// Removes a tetrahedron, ungluing all its facets first. Tetrahedra with
    /// larger indices shift down by one.
    ///
    /// # Errors
    ///
    /// Fails if `tet` is out of range.
    pub fn remove_tetrahedron(&mut self, tet: TetIndex) -> Result<(), GluingError> {
        self.check_address(tet, 0)?;
        self.invalidate();
        for facet in 0..4 {
            if self.tets[tet].gluing(facet).is_some() {
                // Cannot fail: address was just checked.
                let _ = self.unglue(tet, facet);
            }
        }
        self.tets.remove(tet);
        for t in &mut self.tets {
            for facet in 0..4 {
                if let Some(mut g) = t.gluing(facet) {
                    if g.adj > tet {
                        g.adj -= 1;
                        t.set_gluing(facet, Some(g));
                    }
                }
            }
        }
        Ok(())
    }

    /// Appends a full copy of `other`, returning the index offset applied to
    /// its tetrahedra (i.e. the size of `self` before insertion).
    pub fn insert_triangulation(&mut self, other: &Triangulation) -> TetIndex {
        self.invalidate();
        let offset = self.tets.len();
        for tet in &other.tets {
            let mut copy = Tetrahedron::new();
            for facet in 0..4 {
                if let Some(g) = tet.gluing(facet) {
                    copy.set_gluing(
                        facet,
                        Some(Gluing {
                            adj: g.adj + offset,
                            perm: g.perm,
                        }),
                    );
                }
            }
            self.tets.push(copy);
        }
        offset
    }

    /// Builds a triangulation with `n` tetrahedra from a gluing table,
    /// validating the whole list atomically: on error, no triangulation is
    /// produced.
    ///
    /// Each entry is `(tet, facet, adj, adj_facet, perm)`. Listing a gluing
    /// in both directions is allowed as long as the two entries are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Any violation of the gluing rules yields the corresponding
    /// [`GluingError`].
    pub fn from_gluings(
        n: usize,
        gluings: &[(TetIndex, FacetNumber, TetIndex, FacetNumber, Perm4)],
    ) -> Result<Self, GluingError> {
        let mut tri = Self::new();
        tri.tets = vec![Tetrahedron::new(); n];
        for &(tet, facet, adj, adj_facet, perm) in gluings {
            tri.check_address(tet, facet)?;
            tri.check_address(adj, adj_facet)?;
            // Tolerate a redundant mirror entry, but reject inconsistency.
            if let Some(existing) = tri.tets[tet].gluing(facet) {
                if existing.adj == adj && existing.perm == perm && perm.apply(facet) == adj_facet {
                    continue;
                }
                return Err(GluingError::AlreadyGlued { tet, facet });
            }
            tri.glue(tet, facet, adj, adj_facet, perm)?;
        }
        tri.generation = AtomicU64::new(0);
        Ok(tri)
    }

    // =========================================================================
    // SKELETON ACCESS
    // =========================================================================

    /// The skeleton of this triangulation, computing it if necessary.
    ///
    /// The returned handle describes the triangulation as of the current
    /// generation; it stays readable across later mutations but is never
    /// updated in place.
    #[must_use]
    pub fn skeleton(&self) -> Arc<Skeleton> {
        if let Some(existing) = self.skeleton.load_full() {
            return existing;
        }
        let built = Arc::new(Skeleton::build(self));
        self.skeleton.store(Some(Arc::clone(&built)));
        built
    }

    /// Whether every facet of every tetrahedron is glued.
    #[must_use]
    pub fn is_closed_graph(&self) -> bool {
        self.tets.iter().all(|t| t.degree() == 4)
    }

    /// Whether this triangulation has an unglued facet.
    #[must_use]
    pub fn has_boundary_facets(&self) -> bool {
        !self.is_closed_graph()
    }

    /// Whether this triangulation is valid: no edge is identified with
    /// itself in reverse and no triangle is identified with itself via a
    /// non-trivial symmetry.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.skeleton().is_valid()
    }

    /// Whether this triangulation is orientable.
    #[must_use]
    pub fn is_orientable(&self) -> bool {
        self.skeleton().is_orientable()
    }

    /// Whether this triangulation is connected (the empty triangulation
    /// counts as connected).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.skeleton().components().len() <= 1
    }

    /// Whether this triangulation is closed: no boundary facets and no
    /// ideal or invalid vertices.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.skeleton().boundary_components().is_empty()
    }

    /// Whether some vertex is ideal (its link is a closed surface other
    /// than the sphere).
    #[must_use]
    pub fn is_ideal(&self) -> bool {
        self.skeleton().is_ideal()
    }

    /// Euler characteristic of the triangulation as a cell complex:
    /// V − E + F − T.
    #[must_use]
    pub fn euler_char_tri(&self) -> i64 {
        let skel = self.skeleton();
        skel.vertices().len() as i64 - skel.edges().len() as i64 + skel.triangles().len() as i64
            - self.size() as i64
    }

    /// Euler characteristic of the underlying compact manifold, with ideal
    /// vertices truncated: each ideal or invalid vertex contributes its
    /// link's Euler characteristic instead of 1.
    #[must_use]
    pub fn euler_char_manifold(&self) -> i64 {
        let skel = self.skeleton();
        let mut chi = self.euler_char_tri();
        for v in skel.vertices() {
            if v.link != VertexLinkType::Sphere && v.link != VertexLinkType::Disc {
                chi += i64::from(v.link_euler_char) - 1;
            }
        }
        chi
    }

    /// Splits a disconnected triangulation into its connected components,
    /// each reindexed from zero in the order of its lowest original
    /// tetrahedron.
    #[must_use]
    pub fn triangulate_components(&self) -> Vec<Triangulation> {
        let skel = self.skeleton();
        let n_comp = skel.components().len();
        let mut pieces: Vec<Triangulation> = (0..n_comp).map(|_| Triangulation::new()).collect();
        // Map each tetrahedron to its index within its component.
        let mut local = vec![0usize; self.size()];
        for (i, &comp) in skel.tet_component().iter().enumerate() {
            local[i] = pieces[comp].new_tetrahedron();
        }
        for (i, tet) in self.tets.iter().enumerate() {
            let comp = skel.tet_component()[i];
            for facet in 0..4 {
                if let Some(g) = tet.gluing(facet) {
                    pieces[comp].tets[local[i]].set_gluing(
                        facet,
                        Some(Gluing {
                            adj: local[g.adj],
                            perm: g.perm,
                        }),
                    );
                }
            }
        }
        for p in &mut pieces {
            p.generation = AtomicU64::new(0);
        }
        pieces
    }

    // =========================================================================
    // EDITING OPERATIONS
    // =========================================================================

    /// Barycentric subdivision: each tetrahedron becomes 24, one per
    /// permutation `p` of its vertices, where vertex `j` of the small
    /// tetrahedron is the barycentre of vertices `{p(0), …, p(j)}` of the
    /// original.
    ///
    /// # Errors
    ///
    /// Refuses triangulations with invalid edges, since subdivision would
    /// silently change the underlying space there.
    pub fn subdivide(&mut self) -> Result<(), EditError> {
        if !self.skeleton().edges_valid() {
            return Err(EditError::InvalidTriangulation {
                reason: "subdivision requires all edges valid",
            });
        }
        let n = self.size();
        let mut result = Triangulation::new();
        result.tets = vec![Tetrahedron::new(); 24 * n];

        let child = |tet: TetIndex, p: Perm4| -> TetIndex { 24 * tet + p.index() };

        for tet in 0..n {
            for p in Perm4::all() {
                // Internal gluings: swapping chain positions i, i+1 changes
                // only the barycentre opposite facet i of the child.
                for i in 0..3u8 {
                    let q = p * Perm4::swap(i, i + 1);
                    let (a, b) = (child(tet, p), child(tet, q));
                    if result.tets[a].is_boundary_facet(i) {
                        result.tets[a].set_gluing(
                            i,
                            Some(Gluing {
                                adj: b,
                                perm: Perm4::IDENTITY,
                            }),
                        );
                        result.tets[b].set_gluing(
                            i,
                            Some(Gluing {
                                adj: a,
                                perm: Perm4::IDENTITY,
                            }),
                        );
                    }
                }
                // Facet 3 of the child lies inside facet p(3) of the
                // original tetrahedron.
                let outer_facet = p.apply(3);
                if let Some(g) = self.tets[tet].gluing(outer_facet) {
                    let q = g.perm * p;
                    let (a, b) = (child(tet, p), child(g.adj, q));
                    if result.tets[a].is_boundary_facet(3) {
                        result.tets[a].set_gluing(
                            3,
                            Some(Gluing {
                                adj: b,
                                perm: Perm4::IDENTITY,
                            }),
                        );
                        result.tets[b].set_gluing(
                            3,
                            Some(Gluing {
                                adj: a,
                                perm: Perm4::IDENTITY,
                            }),
                        );
                    }
                }
            }
        }
        self.replace_with(result);
        Ok(())
    }

    /// Truncates all ideal and invalid vertices, producing a triangulation
    /// of the same manifold with real boundary in their place. Returns
    /// `false` (without modifying anything) if there was nothing to
    /// truncate.
    ///
    /// # Errors
    ///
    /// As for [`Self::subdivide`].
    pub fn ideal_to_finite(&mut self) -> Result<bool, EditError> {
        let n = self.size();
        let drop_corner: Vec<[bool; 4]> = {
            let skel = self.skeleton();
            let doomed_vertex: Vec<bool> = skel
                .vertices()
                .iter()
                .map(|v| v.is_ideal() || !v.is_valid())
                .collect();
            if !doomed_vertex.iter().any(|&b| b) {
                return Ok(false);
            }
            (0..n)
                .map(|tet| {
                    [0u8, 1, 2, 3]
                        .map(|corner| doomed_vertex[skel.vertex_class(tet, corner)])
                })
                .collect()
        };
        self.subdivide()?;
        // Child 24*tet + p.index() touches original vertex p(0).
        let mut doomed: Vec<TetIndex> = Vec::new();
        for tet in 0..n {
            for p in Perm4::all() {
                if drop_corner[tet][usize::from(p.apply(0))] {
                    doomed.push(24 * tet + p.index());
                }
            }
        }
        // Removing from the top down keeps the remaining indices stable.
        for &tet in doomed.iter().rev() {
            let _ = self.remove_tetrahedron(tet);
        }
        Ok(true)
    }

    /// Cones off each boundary component with a new vertex, one cone
    /// tetrahedron per boundary facet. Returns `false` if the triangulation
    /// has no boundary facets.
    pub fn finite_to_ideal(&mut self) -> bool {
        let boundary: Vec<(TetIndex, FacetNumber)> = (0..self.size())
            .flat_map(|t| (0..4u8).map(move |f| (t, f)))
            .filter(|&(t, f)| self.tets[t].is_boundary_facet(f))
            .collect();
        if boundary.is_empty() {
            return false;
        }
        self.invalidate();

        let first_cone = self.tets.len();
        self.tets
            .extend(std::iter::repeat_with(Tetrahedron::new).take(boundary.len()));
        let cone_of: std::collections::BTreeMap<(TetIndex, FacetNumber), TetIndex> = boundary
            .iter()
            .enumerate()
            .map(|(i, &bf)| (bf, first_cone + i))
            .collect();

        for (i, &(tet, facet)) in boundary.iter().enumerate() {
            let cone = first_cone + i;
            // Base facet of the cone tetrahedron is facet 3; vertices 0,1,2
            // carry the boundary triangle in ascending order, 3 is the apex.
            let base_perm = cone_base_perm(facet);
            self.tets[cone].set_gluing(
                3,
                Some(Gluing {
                    adj: tet,
                    perm: base_perm,
                }),
            );
            self.tets[tet].set_gluing(
                facet,
                Some(Gluing {
                    adj: cone,
                    perm: base_perm.inverse(),
                }),
            );
        }

        // Glue cone side facets across each boundary edge. For boundary
        // facet `a` of tetrahedron t and pivot vertex b of its triangle,
        // rotate through the interior until another boundary facet appears.
        for &(tet, facet) in &boundary {
            for pivot in facet_vertices(facet) {
                let (mut s, mut a, mut b, mut walk) = (tet, facet, pivot, Perm4::IDENTITY);
                while let Some(g) = self.pre_cone_gluing(&boundary, s, b) {
                    let (na, nb) = (g.perm.apply(b), g.perm.apply(a));
                    walk = g.perm * walk;
                    s = g.adj;
                    a = na;
                    b = nb;
                }
                // Partner boundary facet is (s, b); within it, the pivot
                // role is played by a.
                let c0 = cone_of[&(tet, facet)];
                let c1 = cone_of[&(s, b)];
                let m0 = cone_base_perm(facet);
                let m1 = cone_base_perm(b);
                let side0 = m0.pre(pivot);
                if self.tets[c0].is_boundary_facet(side0) {
                    // Map cone 0 into its base tetrahedron, walk around the
                    // boundary edge, swap the facet/pivot roles, and pull
                    // back into cone 1.
                    let g = m1.inverse() * Perm4::swap(b, a) * walk * m0;
                    let side1 = g.apply(side0);
                    self.tets[c0].set_gluing(side0, Some(Gluing { adj: c1, perm: g }));
                    self.tets[c1].set_gluing(
                        side1,
                        Some(Gluing {
                            adj: c0,
                            perm: g.inverse(),
                        }),
                    );
                }
            }
        }
        true
    }

    // Looks up a gluing while treating facets that were boundary before the
    // coning as boundary (the cone tetrahedra are already attached).
    fn pre_cone_gluing(
        &self,
        boundary: &[(TetIndex, FacetNumber)],
        tet: TetIndex,
        facet: FacetNumber,
    ) -> Option<Gluing> {
        if boundary.contains(&(tet, facet)) {
            return None;
        }
        self.tets[tet].gluing(facet)
    }

    /// Heuristic simplification: repeatedly applies 3-2 moves on internal
    /// degree-3 edges and 2-0 moves on internal degree-2 edges until neither
    /// applies. Never changes the underlying manifold. Returns `true` if the
    /// triangulation changed.
    pub fn simplify(&mut self) -> bool {
        let mut changed = false;
        loop {
            let n_edges = self.skeleton().edges().len();
            let mut moved = false;
            for edge in 0..n_edges {
                if self.three_two_move(edge) || self.two_zero_move(edge) {
                    moved = true;
                    changed = true;
                    break;
                }
            }
            if !moved {
                return changed;
            }
        }
    }

    /// Attempts a 3-2 Pachner move about the given internal degree-3 edge.
    /// Returns `false` (leaving the triangulation unchanged) if the move is
    /// not legal.
    pub fn three_two_move(&mut self, edge: usize) -> bool {
        // Mapping from vertex roles (0,1,2) of each external facet of a new
        // tetrahedron to that tetrahedron's own vertices; entry i covers
        // facet i.
        const THREE_TWO: [Perm4; 3] = [
            Perm4::raw([3, 1, 2, 0]),
            Perm4::raw([3, 2, 0, 1]),
            Perm4::raw([3, 0, 1, 2]),
        ];
        const TWO_THREE: [Perm4; 2] = [Perm4::raw([1, 2, 3, 0]), Perm4::raw([0, 2, 3, 1])];

        let skel = self.skeleton();
        let e = &skel.edges()[edge];
        if e.boundary_component.is_some() || !e.valid || e.embeddings.len() != 3 {
            return false;
        }
        let mut old_tet = [0usize; 3];
        let mut old_perm = [Perm4::IDENTITY; 3];
        let mut seen: FastHashSet<TetIndex> = FastHashSet::default();
        for (i, emb) in e.embeddings.iter().enumerate() {
            old_tet[i] = emb.tet;
            old_perm[i] = emb.vertices;
            if !seen.insert(emb.tet) {
                return false;
            }
        }
        drop(skel);

        // Gluings from the vertex roles (0,1,2) of each new-tetrahedron
        // facet to the vertices of whatever lies beyond it.
        let mut gluings = [[Perm4::IDENTITY; 3]; 2];
        for o in 0..3 {
            for n in 0..2 {
                gluings[n][o] = old_perm[o] * TWO_THREE[n];
            }
        }

        #[derive(Clone, Copy)]
        enum Adj {
            None,
            Old(TetIndex),
            New(usize),
        }
        let mut adj = [[Adj::None; 3]; 2];
        let mut unjoin: Vec<(TetIndex, FacetNumber)> = Vec::new();
        for o in 0..3 {
            for n in 0..2 {
                let old_facet = old_perm[o].apply(n as u8);
                let Some(g) = self.tets[old_tet[o]].gluing(old_facet) else {
                    continue;
                };
                unjoin.push((old_tet[o], old_facet));
                let mut external = true;
                'scan: for o2 in 0..3 {
                    if g.adj == old_tet[o2] {
                        let adj_facet = g.adj_facet(old_facet);
                        for n2 in 0..2 {
                            if old_perm[o2].apply(n2 as u8) == adj_facet {
                                // This facet is glued to another doomed
                                // facet; record it once, from the smaller
                                // side.
                                if o2 < o || (o2 == o && n2 < n) {
                                    adj[n][o] = Adj::None;
                                } else {
                                    adj[n][o] = Adj::New(n2);
                                    gluings[n][o] = THREE_TWO[o2]
                                        * gluings[n2][o2].inverse()
                                        * g.perm
                                        * gluings[n][o];
                                }
                                external = false;
                                break 'scan;
                            }
                        }
                    }
                }
                if external {
                    adj[n][o] = Adj::Old(g.adj);
                    gluings[n][o] = g.perm * gluings[n][o];
                }
            }
        }

        self.invalidate();
        for (t, f) in unjoin {
            if self.tets[t].gluing(f).is_some() {
                let _ = self.unglue(t, f);
            }
        }
        // Remove the three old tetrahedra (highest index first) and track
        // how external neighbour indices shift.
        let mut sorted_old = old_tet;
        sorted_old.sort_unstable();
        for &t in sorted_old.iter().rev() {
            let _ = self.remove_tetrahedron(t);
        }
        let shift =
            |t: TetIndex| -> TetIndex { t - sorted_old.iter().filter(|&&o| o < t).count() };
        let new_tet = [self.new_tetrahedron(), self.new_tetrahedron()];

        for o in 0..3 {
            for n in 0..2 {
                let (target, target_gluing) = match adj[n][o] {
                    Adj::None => continue,
                    Adj::Old(t) => {
                        let perm = gluings[n][o] * THREE_TWO[o].inverse();
                        (shift(t), perm)
                    }
                    Adj::New(n2) => {
                        let perm = gluings[n][o] * THREE_TWO[o].inverse();
                        (new_tet[n2], perm)
                    }
                };
                let facet = o as u8;
                if self.tets[new_tet[n]].is_boundary_facet(facet)
                    && self.tets[target].is_boundary_facet(target_gluing.apply(facet))
                {
                    self.tets[new_tet[n]].set_gluing(
                        facet,
                        Some(Gluing {
                            adj: target,
                            perm: target_gluing,
                        }),
                    );
                    self.tets[target].set_gluing(
                        target_gluing.apply(facet),
                        Some(Gluing {
                            adj: new_tet[n],
                            perm: target_gluing.inverse(),
                        }),
                    );
                }
            }
        }
        self.tets[new_tet[0]].set_gluing(
            3,
            Some(Gluing {
                adj: new_tet[1],
                perm: Perm4::IDENTITY,
            }),
        );
        self.tets[new_tet[1]].set_gluing(
            3,
            Some(Gluing {
                adj: new_tet[0],
                perm: Perm4::IDENTITY,
            }),
        );
        true
    }

    /// Attempts a 2-0 move about the given internal degree-2 edge. Returns
    /// `false` (leaving the triangulation unchanged) if the move is not
    /// legal.
    pub fn two_zero_move(&mut self, edge: usize) -> bool {
        let skel = self.skeleton();
        let e = &skel.edges()[edge];
        if e.boundary_component.is_some() || !e.valid || e.embeddings.len() != 2 {
            return false;
        }
        let tet = [e.embeddings[0].tet, e.embeddings[1].tet];
        let perm = [e.embeddings[0].vertices, e.embeddings[1].vertices];
        if tet[0] == tet[1] {
            return false;
        }

        // Legality checks: the flattening must not force an edge, a
        // triangle, or a whole component onto itself.
        let cross_edge =
            |i: usize| skel.edge_class(tet[i], edge_number(perm[i].apply(2), perm[i].apply(3)));
        if cross_edge(0) == cross_edge(1) {
            return false;
        }
        let cross_boundary = |i: usize| skel.edges()[cross_edge(i)].boundary_component.is_some();
        if cross_boundary(0) && cross_boundary(1) {
            return false;
        }
        let face = |i: usize, j: u8| skel.triangle_class(tet[i], perm[i].apply(j));
        if face(0, 0) == face(1, 0) || face(0, 1) == face(1, 1) {
            return false;
        }
        let comp = skel.tet_component()[tet[0]];
        if skel.components()[comp].size == 2 {
            return false;
        }
        drop(skel);

        self.invalidate();
        let crossover = self.tets[tet[0]]
            .gluing(perm[0].apply(2))
            .expect("internal degree-2 edge has both side facets glued")
            .perm;
        for i in 0..2u8 {
            let top = self.tets[tet[0]].gluing(perm[0].apply(i));
            let bottom = self.tets[tet[1]].gluing(perm[1].apply(i));
            match (top, bottom) {
                (None, Some(_)) => {
                    let _ = self.unglue(tet[1], perm[1].apply(i));
                }
                (Some(_), None) => {
                    let _ = self.unglue(tet[0], perm[0].apply(i));
                }
                (Some(t), Some(b)) => {
                    let top_facet = t.adj_facet(perm[0].apply(i));
                    let gluing = b.perm * crossover * t.perm.inverse();
                    let _ = self.unglue(tet[0], perm[0].apply(i));
                    let _ = self.unglue(tet[1], perm[1].apply(i));
                    self.tets[t.adj].set_gluing(
                        top_facet,
                        Some(Gluing {
                            adj: b.adj,
                            perm: gluing,
                        }),
                    );
                    self.tets[b.adj].set_gluing(
                        gluing.apply(top_facet),
                        Some(Gluing {
                            adj: t.adj,
                            perm: gluing.inverse(),
                        }),
                    );
                }
                (None, None) => {}
            }
        }
        let mut doomed = tet;
        doomed.sort_unstable();
        let _ = self.remove_tetrahedron(doomed[1]);
        let _ = self.remove_tetrahedron(doomed[0]);
        true
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn check_address(&self, tet: TetIndex, facet: FacetNumber) -> Result<(), GluingError> {
        if tet >= self.tets.len() {
            return Err(GluingError::TetOutOfRange {
                index: tet,
                size: self.tets.len(),
            });
        }
        if facet >= 4 {
            return Err(GluingError::FacetOutOfRange { facet });
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.skeleton.store(None);
    }

    fn replace_with(&mut self, other: Triangulation) {
        self.invalidate();
        self.tets = other.tets;
    }
}

/// The three vertices of a facet, in ascending order.
#[must_use]
pub fn facet_vertices(facet: FacetNumber) -> [u8; 3] {
    let mut out = [0u8; 3];
    let mut i = 0;
    for v in 0..4u8 {
        if v != facet {
            out[i] = v;
            i += 1;
        }
    }
    out
}

// Maps cone-tetrahedron labels (0,1,2 base triangle, 3 apex) to the
// vertices of the tetrahedron that owns the boundary facet.
fn cone_base_perm(facet: FacetNumber) -> Perm4 {
    let tri = facet_vertices(facet);
    Perm4::raw([tri[0], tri[1], tri[2], facet])
}

// =============================================================================
// STANDARD TRAITS
// =============================================================================

impl Default for Triangulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Triangulation {
    fn clone(&self) -> Self {
        Self {
            tets: self.tets.clone(),
            generation: AtomicU64::new(0),
            skeleton: ArcSwapOption::empty(),
        }
    }
}

impl PartialEq for Triangulation {
    fn eq(&self, other: &Self) -> bool {
        self.tets == other.tets
    }
}

impl Eq for Triangulation {}

impl fmt::Debug for Triangulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Triangulation")
            .field("tets", &self.tets)
            .finish_non_exhaustive()
    }
}

impl Serialize for Triangulation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.tets.len()))?;
        for tet in &self.tets {
            seq.serialize_element(tet)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Triangulation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TetVisitor;
        impl<'de> Visitor<'de> for TetVisitor {
            type Value = Vec<Tetrahedron>;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of tetrahedra")
            }
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut tets = Vec::new();
                while let Some(t) = seq.next_element()? {
                    tets.push(t);
                }
                Ok(tets)
            }
        }
        let tets = deserializer.deserialize_seq(TetVisitor)?;
        let mut tri = Triangulation::new();
        tri.tets = tets;
        Ok(tri)
    }
}

// =============================================================================
// STANDARD MODELS
// =============================================================================

impl Triangulation {
    /// The double of a tetrahedron along its boundary: a two-tetrahedron,
    /// four-vertex 3-sphere.
    #[must_use]
    pub fn sphere() -> Self {
        Self::from_gluings(
            2,
            &[
                (0, 0, 1, 0, Perm4::IDENTITY),
                (0, 1, 1, 1, Perm4::IDENTITY),
                (0, 2, 1, 2, Perm4::IDENTITY),
                (0, 3, 1, 3, Perm4::IDENTITY),
            ],
        )
        .expect("static gluing table is valid")
    }

    /// A single tetrahedron: the 3-ball.
    #[must_use]
    pub fn ball() -> Self {
        let mut tri = Self::new();
        tri.new_tetrahedron();
        tri
    }

    /// The layered loop `C(length)`: a cyclic chain of tetrahedra in which
    /// each is layered onto the next across two facets, with hinge edges
    /// 01 and 23. Untwisted loops triangulate the lens space
    /// `L(length, 1)`; twisted loops close the chain with the hinge
    /// reversed.
    ///
    /// # Panics
    ///
    /// Panics if `length == 0`.
    #[must_use]
    pub fn layered_loop(length: usize, twisted: bool) -> Self {
        assert!(length > 0, "a layered loop needs at least one tetrahedron");
        let chain = Perm4::raw([3, 2, 0, 1]);
        let mut tri = Self::new();
        tri.new_tetrahedra(length);
        for i in 0..length {
            let next = (i + 1) % length;
            let perm = if twisted && next == 0 {
                // Reverse the hinge when closing up.
                Perm4::swap(0, 1) * chain
            } else {
                chain
            };
            tri.join(i, 0, next, perm).expect("chain gluing is valid");
            tri.join(i, 1, next, perm).expect("chain gluing is valid");
        }
        tri
    }

    /// The non-orientable sphere bundle over the circle, as a
    /// two-tetrahedron triangulation.
    #[must_use]
    pub fn twisted_sphere_bundle() -> Self {
        let mut tri = Self::new();
        tri.new_tetrahedra(2);
        tri.join(0, 0, 1, Perm4::raw([0, 1, 3, 2])).expect("valid");
        tri.join(0, 1, 1, Perm4::raw([0, 1, 3, 2])).expect("valid");
        tri.join(0, 2, 1, Perm4::raw([1, 3, 2, 0])).expect("valid");
        tri.join(0, 3, 1, Perm4::raw([2, 0, 1, 3])).expect("valid");
        tri
    }

    /// The orientable sphere bundle over the circle.
    ///
    /// Built by removing two disjoint small tetrahedra from a barycentric
    /// subdivision of the 3-sphere (leaving a product region between two
    /// boundary spheres) and identifying those spheres; the identification
    /// is corrected at run time so the result is orientable.
    #[must_use]
    pub fn sphere_bundle() -> Self {
        for reflect in [false, true] {
            let mut tri = Self::sphere();
            tri.subdivide().expect("sphere is valid");
            // One hole in each original tetrahedron, far apart in the
            // subdivision so the two link spheres share nothing.
            let a = 0;
            let b = 24 + (Perm4::ORDER - 1);
            let hole_a: Vec<Gluing> = (0..4).map(|f| tri.gluing(a, f).expect("closed")).collect();
            let hole_b: Vec<Gluing> = (0..4).map(|f| tri.gluing(b, f).expect("closed")).collect();
            let model = if reflect {
                Perm4::swap(0, 1)
            } else {
                Perm4::IDENTITY
            };
            for f in 0..4u8 {
                let ga = hole_a[usize::from(f)];
                let gb = hole_b[usize::from(model.apply(f))];
                let a_facet = ga.adj_facet(f);
                let b_facet = gb.adj_facet(model.apply(f));
                let _ = tri.unglue(ga.adj, a_facet);
                if tri.gluing(gb.adj, b_facet).is_some() {
                    let _ = tri.unglue(gb.adj, b_facet);
                }
                // Identify the two link spheres as if the removed
                // tetrahedra were one model tetrahedron (up to `model`).
                let perm = gb.perm * model * ga.perm.inverse();
                tri.glue(ga.adj, a_facet, gb.adj, b_facet, perm)
                    .expect("sphere-bundle regluing is valid");
            }
            let _ = tri.remove_tetrahedron(b);
            let _ = tri.remove_tetrahedron(a);
            if tri.is_orientable() {
                return tri;
            }
        }
        unreachable!("one of the two identifications is orientation-coherent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glue_enforces_involution() {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(2);
        let p = Perm4::raw([1, 0, 2, 3]);
        tri.glue(0, 0, 1, 1, p).unwrap();
        assert_eq!(
            tri.facet_info(1, 1).unwrap(),
            FacetInfo::Glued {
                adj: 0,
                adj_facet: 0,
                perm: p.inverse()
            }
        );
    }

    #[test]
    fn glue_rejects_mismatched_permutation() {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(2);
        let err = tri.glue(0, 0, 1, 1, Perm4::IDENTITY).unwrap_err();
        assert!(matches!(err, GluingError::PermutationMismatch { .. }));
    }

    #[test]
    fn glue_rejects_double_gluing() {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(3);
        tri.glue(0, 0, 1, 0, Perm4::IDENTITY).unwrap();
        let err = tri.glue(0, 0, 2, 0, Perm4::IDENTITY).unwrap_err();
        assert_eq!(err, GluingError::AlreadyGlued { tet: 0, facet: 0 });
    }

    #[test]
    fn remove_tetrahedron_reindexes_neighbours() {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(3);
        tri.glue(1, 0, 2, 0, Perm4::IDENTITY).unwrap();
        tri.remove_tetrahedron(0).unwrap();
        assert_eq!(tri.size(), 2);
        assert_eq!(
            tri.facet_info(0, 0).unwrap(),
            FacetInfo::Glued {
                adj: 1,
                adj_facet: 0,
                perm: Perm4::IDENTITY
            }
        );
    }

    #[test]
    fn mutation_bumps_generation() {
        let mut tri = Triangulation::new();
        let g0 = tri.generation();
        tri.new_tetrahedron();
        assert!(tri.generation() > g0);
    }

    #[test]
    fn sphere_model_is_closed_orientable() {
        let tri = Triangulation::sphere();
        assert!(tri.is_closed());
        assert!(tri.is_valid());
        assert!(tri.is_orientable());
        assert!(tri.is_connected());
        assert_eq!(tri.euler_char_tri(), 0);
        assert_eq!(tri.skeleton().vertices().len(), 4);
    }

    #[test]
    fn layered_loop_counts() {
        let c2 = Triangulation::layered_loop(2, false);
        assert!(c2.is_closed());
        assert!(c2.is_valid());
        assert!(c2.is_orientable());
        let skel = c2.skeleton();
        assert_eq!(skel.vertices().len(), 2);
        assert_eq!(skel.edges().len(), 4);
        assert_eq!(c2.euler_char_tri(), 0);
    }

    #[test]
    fn twisted_sphere_bundle_is_closed_non_orientable() {
        let tri = Triangulation::twisted_sphere_bundle();
        assert!(tri.is_closed());
        assert!(tri.is_valid());
        assert!(!tri.is_orientable());
        assert_eq!(tri.euler_char_tri(), 0);
    }

    #[test]
    fn subdivision_multiplies_size_and_preserves_euler() {
        let mut tri = Triangulation::sphere();
        tri.subdivide().unwrap();
        assert_eq!(tri.size(), 48);
        assert!(tri.is_closed());
        assert!(tri.is_valid());
        assert_eq!(tri.euler_char_tri(), 0);
    }

    #[test]
    fn cone_on_ball_boundary_closes_it() {
        let mut tri = Triangulation::ball();
        assert!(tri.finite_to_ideal());
        assert!(!tri.has_boundary_facets());
        // One cone tetrahedron per boundary facet.
        assert_eq!(tri.size(), 5);
    }

    #[test]
    fn components_split_and_reassemble() {
        let mut tri = Triangulation::sphere();
        tri.insert_triangulation(&Triangulation::ball());
        let pieces = tri.triangulate_components();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].size(), 2);
        assert_eq!(pieces[1].size(), 1);
    }

    #[test]
    fn from_gluings_is_atomic() {
        // Second entry contradicts the first; nothing should be produced.
        let result = Triangulation::from_gluings(
            2,
            &[
                (0, 0, 1, 0, Perm4::IDENTITY),
                (0, 0, 1, 1, Perm4::raw([1, 0, 2, 3])),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn serde_round_trip() {
        let tri = Triangulation::layered_loop(3, true);
        let json = serde_json::to_string(&tri).unwrap();
        let back: Triangulation = serde_json::from_str(&json).unwrap();
        assert_eq!(tri, back);
    }

    #[test]
    fn sphere_bundle_is_closed_orientable() {
        let tri = Triangulation::sphere_bundle();
        assert!(tri.is_closed());
        assert!(tri.is_valid());
        assert!(tri.is_orientable());
        assert_eq!(tri.euler_char_tri(), 0);
    }
}
