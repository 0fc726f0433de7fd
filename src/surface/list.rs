//! Normal surface lists: the enumeration entry point.
//!
//! [`NormalSurfaces`] runs a complete enumeration of the vertex or
//! fundamental normal surfaces of a triangulation in a chosen coordinate
//! system, and stores the results together with the request that produced
//! them.
//!
//! # Key Features
//!
//! - Vertex enumeration (extremal rays of the solution cone) and
//!   fundamental enumeration (Hilbert basis of the solution monoid).
//! - A choice of engines: double description, tree traversal, conversion
//!   from a reduced system, and primal / dual / Contejean-Devie Hilbert
//!   basis algorithms.  The list records the engine actually used, which
//!   may differ from the one requested when the request does not apply.
//! - Cooperative progress reporting and cancellation through
//!   [`ProgressTracker`].
//!
//! ```
//! use trisurf::core::Triangulation;
//! use trisurf::surface::{CoordSystem, NormalSurfaces};
//!
//! let tri = Triangulation::sphere();
//! let list = NormalSurfaces::enumerate(tri, CoordSystem::Standard).unwrap();
//! assert!(list.iter().all(|s| s.is_compact()));
//! ```

use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::triangulation::Triangulation;
use crate::enumerate::bitmask::ConstraintMasks;
use crate::enumerate::progress::{Cancelled, NullProgress, ProgressTracker};
use crate::enumerate::{dd, hilbert_cd, hilbert_dual, hilbert_primal, tree};
use crate::surface::coords::CoordSystem;
use crate::surface::matching::{admissibility_groups, matching_equations, MatchingError};
use crate::surface::quad_to_std::build_standard_from_reduced;
use crate::surface::surface::NormalSurface;

// =============================================================================
// REQUEST FLAGS
// =============================================================================

/// Which solutions a list contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    /// Extremal rays of the rational solution cone, as primitive integer
    /// vectors.
    Vertex,
    /// A Hilbert basis of the monoid of non-negative integer solutions.
    Fundamental,
}

/// Whether the admissibility constraints are enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Embedding {
    /// Keep only vectors with at most one non-zero quadrilateral or
    /// octagon type per tetrahedron.
    EmbeddedOnly,
    /// Keep every solution of the matching equations.
    ImmersedSingular,
}

/// The enumeration engine to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Algorithm {
    /// Let the engine choose from the other options.
    Default,
    /// Incremental double description over the requested system.
    DoubleDescription,
    /// Enumerate in the corresponding reduced system, then rebuild the
    /// triangle coordinates.  Vertex enumeration in standard systems only.
    ViaReduced,
    /// Branch over quadrilateral types, solving one cone face per leaf.
    /// Vertex enumeration with admissibility constraints only.
    TreeTraversal,
    /// Primal Hilbert basis computation by maximal-face decomposition.
    HilbertPrimal,
    /// Dual Hilbert basis computation, one hyperplane at a time.
    HilbertDual,
    /// Contejean-Devie completion.  A slow fallback for small inputs.
    ContejeanDevie,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Algorithm::Default => "default",
            Algorithm::DoubleDescription => "double description",
            Algorithm::ViaReduced => "via reduced",
            Algorithm::TreeTraversal => "tree traversal",
            Algorithm::HilbertPrimal => "primal Hilbert basis",
            Algorithm::HilbertDual => "dual Hilbert basis",
            Algorithm::ContejeanDevie => "Contejean-Devie",
        };
        f.write_str(name)
    }
}

/// An error produced while enumerating normal surfaces.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnumerateError {
    /// The matching equations could not be built.
    #[error(transparent)]
    Matching(#[from] MatchingError),

    /// The caller cancelled the enumeration.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

// =============================================================================
// THE LIST
// =============================================================================

/// A complete list of vertex or fundamental normal surfaces.
#[derive(Clone, Debug)]
pub struct NormalSurfaces {
    tri: Arc<Triangulation>,
    system: CoordSystem,
    kind: ListKind,
    embedding: Embedding,
    algorithm: Algorithm,
    surfaces: Vec<NormalSurface>,
}

impl NormalSurfaces {
    /// Enumerates the embedded vertex normal surfaces of `tri` in the
    /// given system, with the default engine and no progress tracking.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerateError::Matching`] if the matching equations
    /// cannot be built for this triangulation and system.
    pub fn enumerate(
        tri: Triangulation,
        system: CoordSystem,
    ) -> Result<NormalSurfaces, EnumerateError> {
        NormalSurfaces::enumerate_with(
            Arc::new(tri),
            system,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::Default,
            &NullProgress,
        )
    }

    /// Enumerates normal surfaces with full control over the request.
    ///
    /// The engine honours `algorithm` when it applies to the request and
    /// otherwise substitutes an applicable one; [`Self::algorithm`]
    /// reports the engine actually used.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerateError::Matching`] if the matching equations
    /// cannot be built, and [`EnumerateError::Cancelled`] if the tracker
    /// requests cancellation; a cancelled run yields no partial results.
    pub fn enumerate_with(
        tri: Arc<Triangulation>,
        system: CoordSystem,
        kind: ListKind,
        embedding: Embedding,
        algorithm: Algorithm,
        tracker: &dyn ProgressTracker,
    ) -> Result<NormalSurfaces, EnumerateError> {
        let algorithm = select_algorithm(&tri, system, kind, embedding, algorithm);

        let mut surfaces = match algorithm {
            Algorithm::ViaReduced => {
                enumerate_via_reduced(&tri, system, tracker)?
            }
            other => {
                let matrix = matching_equations(&tri, system)?;
                let constraints = match embedding {
                    Embedding::EmbeddedOnly => ConstraintMasks::new(
                        system.vector_len(tri.size()),
                        &admissibility_groups(tri.size(), system),
                    ),
                    Embedding::ImmersedSingular => ConstraintMasks::none(),
                };
                let rays = match other {
                    Algorithm::DoubleDescription => {
                        dd::extremal_rays(&matrix, &constraints, tracker)?
                    }
                    Algorithm::TreeTraversal => {
                        tree::vertex_rays(&matrix, &constraints, tracker)?
                    }
                    Algorithm::HilbertDual => {
                        hilbert_dual::hilbert_basis(&matrix, &constraints, tracker)?
                    }
                    Algorithm::HilbertPrimal => {
                        hilbert_primal::hilbert_basis(&matrix, &constraints, tracker)?
                    }
                    Algorithm::ContejeanDevie => {
                        hilbert_cd::hilbert_basis(&matrix, &constraints, tracker)?
                    }
                    Algorithm::ViaReduced | Algorithm::Default => {
                        unreachable!("selection resolves these")
                    }
                };
                rays.into_iter()
                    .map(|ray| {
                        NormalSurface::from_vector(Arc::clone(&tri), system, ray)
                            .expect("enumerated rays are non-negative solutions")
                    })
                    .collect()
            }
        };

        surfaces.sort();
        tracker.finish();

        Ok(NormalSurfaces {
            tri,
            system,
            kind,
            embedding,
            algorithm,
            surfaces,
        })
    }

    /// The triangulation the surfaces live in.
    #[must_use]
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.tri
    }

    /// The coordinate system of the enumeration.
    #[must_use]
    pub fn system(&self) -> CoordSystem {
        self.system
    }

    /// Whether this list holds vertex or fundamental solutions.
    #[must_use]
    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Whether admissibility constraints were enforced.
    #[must_use]
    pub fn embedding(&self) -> Embedding {
        self.embedding
    }

    /// The engine that actually produced this list.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The number of surfaces in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Is the list empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// The surfaces, in a deterministic sorted order.
    #[must_use]
    pub fn surfaces(&self) -> &[NormalSurface] {
        &self.surfaces
    }

    /// Iterates over the surfaces.
    pub fn iter(&self) -> std::slice::Iter<'_, NormalSurface> {
        self.surfaces.iter()
    }
}

impl Index<usize> for NormalSurfaces {
    type Output = NormalSurface;

    fn index(&self, i: usize) -> &NormalSurface {
        &self.surfaces[i]
    }
}

impl<'a> IntoIterator for &'a NormalSurfaces {
    type Item = &'a NormalSurface;
    type IntoIter = std::slice::Iter<'a, NormalSurface>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}

// =============================================================================
// ALGORITHM SELECTION
// =============================================================================

/// Resolves the requested engine to one that applies to the request.
fn select_algorithm(
    tri: &Triangulation,
    system: CoordSystem,
    kind: ListKind,
    embedding: Embedding,
    requested: Algorithm,
) -> Algorithm {
    match kind {
        ListKind::Fundamental => match requested {
            Algorithm::HilbertPrimal | Algorithm::ContejeanDevie => requested,
            _ => Algorithm::HilbertDual,
        },
        ListKind::Vertex => {
            // Rebuilding from the reduced system needs every reduced
            // solution to be compact and embedded.
            let can_reduce = system.stores_triangles()
                && embedding == Embedding::EmbeddedOnly
                && tri.is_valid()
                && !tri.is_ideal();
            // Branching fixes one quadrilateral type per tetrahedron, so
            // it enumerates embedded solutions only.
            let can_branch = embedding == Embedding::EmbeddedOnly;
            match requested {
                Algorithm::ViaReduced if can_reduce => Algorithm::ViaReduced,
                Algorithm::TreeTraversal if can_branch => Algorithm::TreeTraversal,
                Algorithm::DoubleDescription => Algorithm::DoubleDescription,
                _ if can_reduce => Algorithm::ViaReduced,
                _ if system.is_reduced() && can_branch => Algorithm::TreeTraversal,
                _ => Algorithm::DoubleDescription,
            }
        }
    }
}

/// Vertex enumeration in the reduced system, followed by triangle
/// reconstruction.
fn enumerate_via_reduced(
    tri: &Arc<Triangulation>,
    system: CoordSystem,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<NormalSurface>, EnumerateError> {
    let reduced_system = if system.stores_octagons() {
        CoordSystem::QuadOct
    } else {
        CoordSystem::Quad
    };

    let matrix = matching_equations(tri, reduced_system)?;
    let constraints = ConstraintMasks::new(
        reduced_system.vector_len(tri.size()),
        &admissibility_groups(tri.size(), reduced_system),
    );
    let rays = tree::vertex_rays(&matrix, &constraints, tracker)?;
    let reduced: Vec<NormalSurface> = rays
        .into_iter()
        .map(|ray| {
            NormalSurface::from_vector(Arc::clone(tri), reduced_system, ray)
                .expect("enumerated rays are non-negative solutions")
        })
        .collect();

    Ok(build_standard_from_reduced(tri, system, &reduced, tracker)?)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::core::perm::Perm4;
    use crate::enumerate::progress::ProgressMeter;

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

    fn vectors(list: &NormalSurfaces) -> Vec<Vec<crate::algebra::LargeInt>> {
        list.iter().map(|s| s.vector().to_vec()).collect()
    }

    #[test]
    fn the_empty_triangulation_has_no_surfaces() {
        let list =
            NormalSurfaces::enumerate(Triangulation::new(), CoordSystem::Standard)
                .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn the_figure_eight_complement_has_four_spun_quad_vertex_surfaces() {
        let list =
            NormalSurfaces::enumerate(figure_eight(), CoordSystem::Quad).unwrap();
        assert_eq!(list.len(), 4);
        for surface in &list {
            assert!(!surface.is_compact());
        }
    }

    #[test]
    fn the_figure_eight_complement_has_one_standard_vertex_surface() {
        let list =
            NormalSurfaces::enumerate(figure_eight(), CoordSystem::Standard).unwrap();
        // An ideal triangulation cannot go via the reduced system.
        assert_eq!(list.algorithm(), Algorithm::DoubleDescription);
        assert_eq!(list.len(), 1);
        assert!(list[0].is_vertex_linking());
        assert_eq!(list[0].euler_char(), Some(BigInt::from(0)));
    }

    #[test]
    fn tree_traversal_agrees_with_double_description() {
        let tri = Arc::new(Triangulation::layered_loop(3, false));
        let by_tree = NormalSurfaces::enumerate_with(
            Arc::clone(&tri),
            CoordSystem::Quad,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::TreeTraversal,
            &NullProgress,
        )
        .unwrap();
        let by_dd = NormalSurfaces::enumerate_with(
            tri,
            CoordSystem::Quad,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::DoubleDescription,
            &NullProgress,
        )
        .unwrap();
        assert_eq!(by_tree.algorithm(), Algorithm::TreeTraversal);
        assert_eq!(by_dd.algorithm(), Algorithm::DoubleDescription);
        assert_eq!(vectors(&by_tree), vectors(&by_dd));
    }

    #[test]
    fn standard_conversion_agrees_with_direct_enumeration() {
        let tri = Arc::new(Triangulation::sphere());
        let converted = NormalSurfaces::enumerate_with(
            Arc::clone(&tri),
            CoordSystem::Standard,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::Default,
            &NullProgress,
        )
        .unwrap();
        let direct = NormalSurfaces::enumerate_with(
            tri,
            CoordSystem::Standard,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::DoubleDescription,
            &NullProgress,
        )
        .unwrap();
        assert_eq!(converted.algorithm(), Algorithm::ViaReduced);
        assert_eq!(vectors(&converted), vectors(&direct));
    }

    #[test]
    fn primal_and_dual_hilbert_bases_agree() {
        let tri = Arc::new(Triangulation::sphere());
        let dual = NormalSurfaces::enumerate_with(
            Arc::clone(&tri),
            CoordSystem::Quad,
            ListKind::Fundamental,
            Embedding::EmbeddedOnly,
            Algorithm::Default,
            &NullProgress,
        )
        .unwrap();
        let primal = NormalSurfaces::enumerate_with(
            tri,
            CoordSystem::Quad,
            ListKind::Fundamental,
            Embedding::EmbeddedOnly,
            Algorithm::HilbertPrimal,
            &NullProgress,
        )
        .unwrap();
        assert_eq!(dual.algorithm(), Algorithm::HilbertDual);
        assert_eq!(primal.algorithm(), Algorithm::HilbertPrimal);
        assert_eq!(vectors(&dual), vectors(&primal));
    }

    #[test]
    fn a_cancelled_enumeration_reports_cancellation() {
        let meter = ProgressMeter::new();
        meter.cancel();
        let result = NormalSurfaces::enumerate_with(
            Arc::new(Triangulation::sphere()),
            CoordSystem::Standard,
            ListKind::Vertex,
            Embedding::EmbeddedOnly,
            Algorithm::DoubleDescription,
            &meter,
        );
        assert_eq!(result.err(), Some(EnumerateError::Cancelled(Cancelled)));
    }
}
