//! # trisurf
//!
//! A library for normal surface theory in triangulated 3-manifolds:
//! triangulations built from tetrahedra with facet gluings, normal and
//! almost normal surfaces in a family of coordinate systems, and the
//! vertex and fundamental enumeration machinery that drives decomposition
//! algorithms such as connected sum decomposition and 3-sphere
//! recognition.
//!
//! # Key Features
//!
//! - Generalised triangulations: tetrahedra glued along facets, with a
//!   computed skeleton of vertex, edge and triangle classes, boundary
//!   components, orientability and validity.
//! - Text codecs: isomorphism signatures (a canonical string per
//!   combinatorial isomorphism class) and the older dehydration format.
//! - Normal surfaces in standard, quad, and almost normal coordinate
//!   systems, with exact arithmetic throughout (fixed-width words that
//!   overflow into big integers).
//! - Enumeration of vertex surfaces by the double description method or
//!   by tree traversal, and of fundamental surfaces by primal and dual
//!   Hilbert basis algorithms.
//! - Surface analysis: Euler characteristic, connectedness,
//!   orientability, one- or two-sidedness, connected components, thin
//!   edge links, splitting and central surfaces.
//! - Topology algorithms built on the above: cutting along a surface,
//!   crushing, connected sum decomposition, 3-sphere and 3-ball
//!   recognition, angle structures.
//! - First homology of a triangulation as a finitely generated abelian
//!   group in Smith normal form.
//!
//! # Basic Usage
//!
//! Build the figure eight knot complement from explicit gluings and
//! enumerate its vertex normal surfaces in quad coordinates:
//!
//! ```rust
//! use trisurf::prelude::*;
//!
//! let tri = Triangulation::from_gluings(
//!     2,
//!     &[
//!         (0, 0, 1, 1, Perm4::raw([2, 1, 0, 3])),
//!         (0, 1, 1, 0, Perm4::raw([1, 0, 3, 2])),
//!         (0, 2, 1, 3, Perm4::raw([0, 3, 2, 1])),
//!         (0, 3, 1, 2, Perm4::raw([0, 3, 2, 1])),
//!     ],
//! )
//! .unwrap();
//! assert!(tri.is_valid() && tri.is_ideal());
//!
//! let list = NormalSurfaces::enumerate(tri, CoordSystem::Quad).unwrap();
//! assert_eq!(list.len(), 4);
//! assert!(list.iter().all(|s| !s.is_compact()));
//! ```
//!
//! Triangulations round-trip through isomorphism signatures, and closed
//! orientable ones decompose into prime summands:
//!
//! ```rust
//! use trisurf::core::{from_isosig, isosig, Triangulation};
//!
//! let sphere = Triangulation::sphere();
//! let copy = from_isosig(&isosig(&sphere)).unwrap();
//! assert_eq!(isosig(&copy), isosig(&sphere));
//!
//! assert!(sphere.is_three_sphere().unwrap());
//! assert!(sphere.summands().unwrap().is_empty());
//! ```

#![forbid(unsafe_code)]

/// Triangulations and their combinatorics: permutations, tetrahedra and
/// gluings, the derived skeleton, and the text codecs.
pub mod core {
    /// Hash maps and small buffers tuned for skeletal computations.
    pub mod collections;
    pub mod dehydration;
    pub mod isosig;
    pub mod perm;
    pub mod skeleton;
    pub mod tetrahedron;
    pub mod triangulation;

    pub use dehydration::{dehydrate, rehydrate, DehydrationError};
    pub use isosig::{from_isosig, isosig, IsoSigError};
    pub use perm::Perm4;
    pub use skeleton::Skeleton;
    pub use tetrahedron::Gluing;
    pub use triangulation::{EditError, GluingError, Triangulation};
}

/// Exact arithmetic: overflow-checked integer words, dense integer
/// matrices, and finitely generated abelian groups.
pub mod algebra {
    pub mod homology;
    pub mod integer;
    pub mod matrix;

    pub use homology::{homology_h1, AbelianGroup, HomologyError};
    pub use integer::LargeInt;
    pub use matrix::MatrixInt;
}

/// Normal and almost normal surfaces: coordinate systems, matching
/// equations, the surface type itself and its analyses, and enumerated
/// surface lists.
pub mod surface {
    pub mod coords;
    pub mod cut;
    pub mod links;
    pub mod list;
    pub mod matching;
    pub mod octagons;
    pub mod orientation;
    pub(crate) mod quad_to_std;
    #[allow(clippy::module_inception)]
    pub mod surface;

    pub use coords::{CoordSystem, DiscEncoding};
    pub use cut::CutError;
    pub use links::{edge_link_surface, triangle_link_surface, vertex_link_surface};
    pub use list::{Algorithm, Embedding, EnumerateError, ListKind, NormalSurfaces};
    pub use matching::{admissibility_groups, matching_equations, MatchingError};
    pub use surface::{NormalSurface, SurfaceError};
}

/// Enumeration engines over the admissible cone of a matching equation
/// system, plus the progress and cancellation plumbing they share.
pub mod enumerate {
    pub mod bitmask;
    pub mod dd;
    pub mod hilbert_cd;
    pub mod hilbert_dual;
    pub mod hilbert_primal;
    pub mod progress;
    pub mod tree;

    pub use bitmask::{Bitmask, ConstraintMasks};
    pub use progress::{Cancelled, NullProgress, ProgressMeter, ProgressTracker};
}

/// Topology algorithms layered on surface enumeration: connected sum
/// decomposition, sphere and ball recognition, and angle structures.
pub mod topology {
    pub mod angles;
    pub mod decompose;

    pub use angles::{angle_equations, vertex_angle_structures, AngleError, AngleStructure};
    pub use decompose::DecomposeError;
}

/// Re-exports of the most commonly used types and functions.
pub mod prelude {
    pub use crate::algebra::{homology_h1, AbelianGroup, LargeInt, MatrixInt};
    pub use crate::core::{
        dehydrate, from_isosig, isosig, rehydrate, Perm4, Skeleton, Triangulation,
    };
    pub use crate::enumerate::{Cancelled, NullProgress, ProgressMeter, ProgressTracker};
    pub use crate::surface::{
        matching_equations, Algorithm, CoordSystem, Embedding, ListKind, NormalSurface,
        NormalSurfaces,
    };
    pub use crate::topology::{AngleError, AngleStructure, DecomposeError};
}

/// Checks that structs implement `auto` traits. Traits are checked at
/// compile time, so this function is only used for testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use crate::is_normal;
    use crate::prelude::*;

    #[test]
    fn normal_types() {
        assert!(is_normal::<Triangulation>());
        assert!(is_normal::<Perm4>());
        assert!(is_normal::<LargeInt>());
        assert!(is_normal::<MatrixInt>());
        assert!(is_normal::<NormalSurface>());
        assert!(is_normal::<NormalSurfaces>());
        assert!(is_normal::<AbelianGroup>());
        assert!(is_normal::<AngleStructure>());
    }

    #[test]
    fn prelude_exports_cover_the_common_workflow() {
        let tri = Triangulation::sphere();
        let equations = matching_equations(&tri, CoordSystem::Standard).unwrap();
        assert_eq!(equations.cols(), CoordSystem::Standard.vector_len(tri.size()));

        let list = NormalSurfaces::enumerate(tri, CoordSystem::Standard).unwrap();
        assert!(!list.is_empty());
        assert_eq!(list.kind(), ListKind::Vertex);
    }
}
