//! Normal surface coordinate systems and disc type conventions.
//!
//! # Key Features
//!
//! - [`CoordSystem`]: the coordinate systems in which surfaces can be
//!   enumerated, together with their per-tetrahedron block layouts.
//! - [`DiscEncoding`]: the internal storage layout for surface vectors
//!   (triangle coordinates are always materialised in storage, even when
//!   enumeration ran in a reduced system).
//! - Quadrilateral conventions: [`QUAD_SEPARATING`], [`QUAD_MEETING`] and
//!   [`QUAD_DEFN`] fix once and for all which quadrilateral type separates
//!   which pair of vertices.
//!
//! # Disc types
//!
//! Within a single tetrahedron a normal surface can meet the interior in
//! seven disc types: four triangles (one cutting off each vertex) and three
//! quadrilaterals (one separating each pair of opposite edges).  Almost
//! normal surfaces add three octagon types, numbered like the quadrilaterals
//! they are parallel to.
//!
//! Quadrilateral type `q` separates vertices `{0, q+1}` from the remaining
//! pair.  Copies of a quadrilateral or octagon within a tetrahedron are
//! numbered starting from the side of the pair containing vertex 0.

use serde::{Deserialize, Serialize};

// ===== QUAD CONVENTIONS =====

/// The four vertices of each quadrilateral type, listed so that the first
/// two vertices form the separated pair containing vertex 0.
pub const QUAD_DEFN: [[u8; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

/// `QUAD_SEPARATING[a][b]` is the quadrilateral type separating vertices
/// `a` and `b` from the opposite pair.  The diagonal entries are unused.
pub const QUAD_SEPARATING: [[u8; 4]; 4] = [
    [0, 0, 1, 2],
    [0, 0, 2, 1],
    [1, 2, 0, 0],
    [2, 1, 0, 0],
];

/// `QUAD_MEETING[a][b]` lists the two quadrilateral types that meet the
/// edge joining vertices `a` and `b`.  The diagonal entries are unused.
pub const QUAD_MEETING: [[[u8; 2]; 4]; 4] = [
    [[0, 0], [1, 2], [0, 2], [0, 1]],
    [[1, 2], [0, 0], [0, 1], [0, 2]],
    [[0, 2], [0, 1], [0, 0], [1, 2]],
    [[0, 1], [0, 2], [1, 2], [0, 0]],
];

/// Returns the vertex paired with `v` by quadrilateral type `q`.
///
/// Quadrilateral `q` separates the tetrahedron vertices into two pairs;
/// this returns the other member of the pair containing `v`.
pub const fn quad_partner(q: u8, v: u8) -> u8 {
    let d = QUAD_DEFN[q as usize];
    if d[0] == v {
        d[1]
    } else if d[1] == v {
        d[0]
    } else if d[2] == v {
        d[3]
    } else {
        d[2]
    }
}

// ===== COORDINATE SYSTEMS =====

/// A coordinate system for enumerating normal (or almost normal) surfaces.
///
/// The *standard* systems carry explicit triangle coordinates; the
/// *reduced* systems (quadrilateral and quadrilateral-octagon) drop them
/// and recover triangles afterwards by the canonical extension.  The
/// closed variants additionally constrain surfaces to avoid the boundary.
///
/// # Examples
///
/// ```
/// use trisurf::surface::CoordSystem;
///
/// assert_eq!(CoordSystem::Standard.block_size(), 7);
/// assert_eq!(CoordSystem::Quad.block_size(), 3);
/// assert!(CoordSystem::QuadOct.stores_octagons());
/// assert!(CoordSystem::QuadClosed.is_reduced());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoordSystem {
    /// Standard triangle-quadrilateral coordinates: 7 per tetrahedron.
    Standard,
    /// Quadrilateral coordinates only: 3 per tetrahedron.
    Quad,
    /// Standard almost normal coordinates, with octagons: 10 per
    /// tetrahedron.
    AlmostNormal,
    /// Quadrilateral-octagon coordinates: 6 per tetrahedron.
    QuadOct,
    /// Quadrilateral coordinates restricted to closed surfaces.
    QuadClosed,
    /// Quadrilateral-octagon coordinates restricted to closed surfaces.
    QuadOctClosed,
}

impl CoordSystem {
    /// The number of coordinates per tetrahedron in this system.
    pub const fn block_size(self) -> usize {
        match self {
            CoordSystem::Standard => 7,
            CoordSystem::Quad | CoordSystem::QuadClosed => 3,
            CoordSystem::AlmostNormal => 10,
            CoordSystem::QuadOct | CoordSystem::QuadOctClosed => 6,
        }
    }

    /// The total vector length for a triangulation with `size` tetrahedra.
    pub const fn vector_len(self, size: usize) -> usize {
        self.block_size() * size
    }

    /// Does this system carry explicit triangle coordinates?
    pub const fn stores_triangles(self) -> bool {
        matches!(self, CoordSystem::Standard | CoordSystem::AlmostNormal)
    }

    /// Does this system carry octagon coordinates?
    pub const fn stores_octagons(self) -> bool {
        matches!(
            self,
            CoordSystem::AlmostNormal | CoordSystem::QuadOct | CoordSystem::QuadOctClosed
        )
    }

    /// Is this a reduced system, without explicit triangle coordinates?
    pub const fn is_reduced(self) -> bool {
        !self.stores_triangles()
    }

    /// Is this a closed variant, constraining surfaces away from the
    /// boundary?
    pub const fn is_closed_variant(self) -> bool {
        matches!(self, CoordSystem::QuadClosed | CoordSystem::QuadOctClosed)
    }

    /// The underlying unconstrained system of a closed variant, or `self`
    /// for the ordinary systems.
    pub const fn base(self) -> CoordSystem {
        match self {
            CoordSystem::QuadClosed => CoordSystem::Quad,
            CoordSystem::QuadOctClosed => CoordSystem::QuadOct,
            other => other,
        }
    }

    /// The number of quadrilateral-like coordinates per tetrahedron
    /// (quadrilaterals plus octagons).
    pub const fn quad_block_size(self) -> usize {
        if self.stores_octagons() {
            6
        } else {
            3
        }
    }

    /// The column of the quadrilateral coordinate of type `q` in
    /// tetrahedron `tet`, for vectors laid out in this system.
    pub const fn quad_column(self, tet: usize, q: usize) -> usize {
        let skip = if self.stores_triangles() { 4 } else { 0 };
        self.block_size() * tet + skip + q
    }

    /// The column of the octagon coordinate of type `q` in tetrahedron
    /// `tet`.  Only meaningful for systems with octagons.
    pub const fn oct_column(self, tet: usize, q: usize) -> usize {
        let skip = if self.stores_triangles() { 7 } else { 3 };
        self.block_size() * tet + skip + q
    }

    /// The column of the triangle coordinate at vertex `v` of tetrahedron
    /// `tet`.  Only meaningful for standard systems.
    pub const fn triangle_column(self, tet: usize, v: usize) -> usize {
        self.block_size() * tet + v
    }
}

impl std::fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoordSystem::Standard => "standard",
            CoordSystem::Quad => "quad",
            CoordSystem::AlmostNormal => "almost-normal",
            CoordSystem::QuadOct => "quad-oct",
            CoordSystem::QuadClosed => "quad-closed",
            CoordSystem::QuadOctClosed => "quad-oct-closed",
        };
        f.write_str(name)
    }
}

// ===== STORAGE ENCODINGS =====

/// The block layout used to *store* a surface vector.
///
/// Surfaces are always stored with explicit triangle coordinates, so the
/// only choice is whether octagons are present: `Standard` stores blocks
/// of 7 and `AlmostNormal` blocks of 10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscEncoding {
    /// Blocks of 7: four triangles then three quadrilaterals.
    Standard,
    /// Blocks of 10: triangles, quadrilaterals, then three octagons.
    AlmostNormal,
}

impl DiscEncoding {
    /// The storage encoding matching a given enumeration system.
    pub const fn for_system(system: CoordSystem) -> DiscEncoding {
        if system.stores_octagons() {
            DiscEncoding::AlmostNormal
        } else {
            DiscEncoding::Standard
        }
    }

    /// The number of stored coordinates per tetrahedron.
    pub const fn block(self) -> usize {
        match self {
            DiscEncoding::Standard => 7,
            DiscEncoding::AlmostNormal => 10,
        }
    }

    /// Does this encoding store octagon coordinates?
    pub const fn stores_octagons(self) -> bool {
        matches!(self, DiscEncoding::AlmostNormal)
    }

    /// The encoding of a sum of two surfaces with these encodings.
    pub const fn join(self, other: DiscEncoding) -> DiscEncoding {
        if self.stores_octagons() || other.stores_octagons() {
            DiscEncoding::AlmostNormal
        } else {
            DiscEncoding::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_tables_are_consistent() {
        for a in 0..4u8 {
            for b in 0..4u8 {
                if a == b {
                    continue;
                }
                let sep = QUAD_SEPARATING[a as usize][b as usize];
                // The separating quad pairs a with b.
                assert_eq!(quad_partner(sep, a), b);
                assert_eq!(quad_partner(sep, b), a);
                // The meeting quads are exactly the other two types.
                let meet = QUAD_MEETING[a as usize][b as usize];
                assert_ne!(meet[0], sep);
                assert_ne!(meet[1], sep);
                assert_ne!(meet[0], meet[1]);
            }
        }
    }

    #[test]
    fn quad_defn_matches_separating_table() {
        for q in 0..3usize {
            let d = QUAD_DEFN[q];
            assert_eq!(QUAD_SEPARATING[d[0] as usize][d[1] as usize], q as u8);
            assert_eq!(QUAD_SEPARATING[d[2] as usize][d[3] as usize], q as u8);
        }
    }

    #[test]
    fn block_sizes() {
        assert_eq!(CoordSystem::Standard.block_size(), 7);
        assert_eq!(CoordSystem::Quad.block_size(), 3);
        assert_eq!(CoordSystem::AlmostNormal.block_size(), 10);
        assert_eq!(CoordSystem::QuadOct.block_size(), 6);
        assert_eq!(CoordSystem::QuadClosed.block_size(), 3);
        assert_eq!(CoordSystem::QuadOctClosed.block_size(), 6);
    }

    #[test]
    fn closed_variants_reduce_to_their_bases() {
        assert_eq!(CoordSystem::QuadClosed.base(), CoordSystem::Quad);
        assert_eq!(CoordSystem::QuadOctClosed.base(), CoordSystem::QuadOct);
        assert_eq!(CoordSystem::Standard.base(), CoordSystem::Standard);
        assert!(CoordSystem::QuadClosed.is_closed_variant());
        assert!(!CoordSystem::Quad.is_closed_variant());
    }

    #[test]
    fn column_layout() {
        let s = CoordSystem::Standard;
        assert_eq!(s.triangle_column(2, 3), 17);
        assert_eq!(s.quad_column(2, 0), 18);
        let q = CoordSystem::Quad;
        assert_eq!(q.quad_column(2, 1), 7);
        let a = CoordSystem::AlmostNormal;
        assert_eq!(a.oct_column(1, 2), 19);
        let qo = CoordSystem::QuadOct;
        assert_eq!(qo.oct_column(1, 0), 9);
    }
}
