//! Cutting a triangulation open along a normal surface, and crushing.
//!
//! Cutting retriangulates the complement of the surface: each tetrahedron
//! is partitioned by its discs into triangular prisms, quadrilateral
//! prisms and (truncated) corner pieces, every piece is triangulated by a
//! fixed template, and the pieces are glued across the faces of the
//! original triangulation.  Adjacent templates do not always present the
//! same triangulated quadrilateral or hexagon on their shared boundary, so
//! gluings may insert flip layerings.
//!
//! Crushing is the destructive alternative: every tetrahedron containing a
//! quadrilateral is discarded and the survivors are reglued directly.  The
//! result is not in general homeomorphic to the complement, but for the
//! spheres arising in connected sum decomposition its effect on the
//! manifold is completely understood and it never increases the number of
//! tetrahedra.

use num_traits::ToPrimitive;
use thiserror::Error;

use crate::algebra::LargeInt;
use crate::core::collections::{FacetNumber, TetIndex};
use crate::core::perm::Perm4;
use crate::core::tetrahedron::EDGE_VERTEX;
use crate::core::triangulation::Triangulation;
use crate::surface::coords::{quad_partner, QUAD_DEFN, QUAD_SEPARATING};
use crate::surface::surface::NormalSurface;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from [`NormalSurface::cut_along`] and [`NormalSurface::crush`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CutError {
    /// The surface has infinitely many triangles and so does not bound a
    /// triangulable complement.
    #[error("cannot cut or crush along a non-compact surface")]
    NonCompact,

    /// A disc count does not fit in the native word size.
    #[error("disc count exceeds the addressable range")]
    Overflow,
}

fn disc_count(coord: &LargeInt) -> Result<usize, CutError> {
    let value = coord.finite().ok_or(CutError::NonCompact)?;
    value.to_usize().ok_or(CutError::Overflow)
}

// =============================================================================
// BLOCK BOUNDARIES
// =============================================================================

/// A triangulated quadrilateral on the boundary of a block, sitting inside
/// a face of the block's outer tetrahedron.
///
/// `outer_vertices` maps the vertices 0, 1, 2 of the quadrilateral to
/// vertices of the outer tetrahedron, and maps 3 to the face of the outer
/// tetrahedron containing this quadrilateral.  `inner_tet[i]` and
/// `inner_vertices[i]` locate the two triangles of the quadrilateral:
/// `inner_vertices[i]` sends the vertex numbers of the quadrilateral to
/// vertices of `inner_tet[i]`, with 3 mapping to the vertex opposite the
/// triangle.
#[derive(Clone)]
struct BdryQuad {
    outer_vertices: Perm4,
    inner_tet: [TetIndex; 2],
    inner_vertices: [Perm4; 2],
}

/// A triangulated hexagon on the boundary of a block, with the same vertex
/// conventions as [`BdryQuad`] plus a central triangle in slot 3.
#[derive(Clone)]
struct BdryHex {
    outer_vertices: Perm4,
    inner_tet: [TetIndex; 4],
    inner_vertices: [Perm4; 4],
}

#[derive(Clone)]
enum Bdry {
    Quad(BdryQuad),
    Hex(BdryHex),
}

impl BdryQuad {
    /// Reflects this quadrilateral by layering a tetrahedron over its
    /// internal diagonal, so that it presents the opposite diagonal.
    fn reflect(&mut self, out: &mut Triangulation) {
        let layering = out.new_tetrahedron();
        out.join(
            layering,
            0,
            self.inner_tet[1],
            self.inner_vertices[1] * Perm4::raw([3, 2, 1, 0]),
        )
        .expect("layering faces are free");
        out.join(
            layering,
            2,
            self.inner_tet[0],
            self.inner_vertices[0] * Perm4::raw([1, 0, 3, 2]),
        )
        .expect("layering faces are free");

        self.inner_tet = [layering, layering];
        self.inner_vertices = [Perm4::IDENTITY, Perm4::raw([2, 3, 0, 1])];
        self.outer_vertices = self.outer_vertices * Perm4::swap(1, 2);
    }

    /// Glues this quadrilateral to `dest`, where `gluing` is the face
    /// gluing of the outer tetrahedra.  `dest` is reflected first if the
    /// two triangulated quadrilaterals disagree.
    fn join(self, mut dest: BdryQuad, gluing: Perm4, out: &mut Triangulation) {
        let dest_map = gluing * self.outer_vertices;
        if dest_map != dest.outer_vertices {
            dest.reflect(out);
            debug_assert_eq!(dest_map, dest.outer_vertices);
        }

        for i in 0..2 {
            out.join(
                self.inner_tet[i],
                self.inner_vertices[i].apply(3),
                dest.inner_tet[i],
                dest.inner_vertices[i] * self.inner_vertices[i].inverse(),
            )
            .expect("block boundaries are free");
        }
    }
}

impl BdryHex {
    /// Reflects this hexagon by layering four tetrahedra over its three
    /// internal edges.
    fn reflect(&mut self, out: &mut Triangulation) {
        let l0 = out.new_tetrahedron();
        let l1 = out.new_tetrahedron();
        let l2 = out.new_tetrahedron();
        let l3 = out.new_tetrahedron();

        let join = |out: &mut Triangulation, tet, face, adj, perm| {
            out.join(tet, face, adj, perm)
                .expect("layering faces are free");
        };
        join(out, l0, 1, self.inner_tet[3], self.inner_vertices[3] * Perm4::swap(1, 3));
        join(out, l0, 2, self.inner_tet[2], self.inner_vertices[2] * Perm4::swap(2, 3));
        join(out, l1, 3, l0, Perm4::IDENTITY);
        join(out, l1, 1, self.inner_tet[1], self.inner_vertices[1] * Perm4::raw([2, 3, 0, 1]));
        join(out, l2, 0, l0, Perm4::IDENTITY);
        join(out, l2, 1, self.inner_tet[0], self.inner_vertices[0] * Perm4::raw([1, 3, 2, 0]));
        join(out, l3, 0, l1, Perm4::IDENTITY);
        join(out, l3, 3, l2, Perm4::IDENTITY);

        self.inner_tet = [l2, l1, l3, l3];
        self.inner_vertices = [
            Perm4::raw([0, 3, 1, 2]),
            Perm4::raw([1, 0, 3, 2]),
            Perm4::raw([3, 2, 0, 1]),
            Perm4::raw([3, 0, 1, 2]),
        ];
        self.outer_vertices = self.outer_vertices * Perm4::swap(1, 2);
    }

    /// Rotates the labelling of this hexagon one step; the triangulated
    /// hexagon itself is symmetric under this rotation.
    fn rotate(&mut self) {
        self.inner_tet.swap(0, 1);
        self.inner_tet.swap(1, 2);
        self.inner_vertices.swap(0, 1);
        self.inner_vertices.swap(1, 2);
        self.inner_vertices[3] = self.inner_vertices[3] * Perm4::raw([1, 2, 0, 3]);
        self.outer_vertices = self.outer_vertices * Perm4::raw([1, 2, 0, 3]);
    }

    /// Glues this hexagon to `dest`, reflecting and rotating `dest` as
    /// needed until the triangulated hexagons agree.
    fn join(self, mut dest: BdryHex, gluing: Perm4, out: &mut Triangulation) {
        let dest_map = gluing * self.outer_vertices;
        if dest_map.sign() != dest.outer_vertices.sign() {
            dest.reflect(out);
        }
        while dest_map != dest.outer_vertices {
            dest.rotate();
        }

        for i in 0..4 {
            out.join(
                self.inner_tet[i],
                self.inner_vertices[i].apply(3),
                dest.inner_tet[i],
                dest.inner_vertices[i] * self.inner_vertices[i].inverse(),
            )
            .expect("block boundaries are free");
        }
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// One triangulated piece of a cut-open tetrahedron.
///
/// `bdry[f]` is the boundary quadrilateral or hexagon of this block lying
/// in face `f` of the outer tetrahedron, if any.  `link[v]` locates the
/// triangle of this block that faces vertex `v` of the outer tetrahedron
/// from the far side, as an inner tetrahedron together with the map from
/// its vertices to outer vertices; the small tetrahedron reinstated at the
/// vertex is glued there.
struct Block {
    bdry: [Option<Bdry>; 4],
    link: [Option<(TetIndex, Perm4)>; 4],
}

type BlockId = usize;

impl Block {
    fn attach_vertex_nbd(&self, nbd: TetIndex, vertex: u8, out: &mut Triangulation) {
        let (tet, map) = self.link[usize::from(vertex)]
            .expect("block has a triangle facing this vertex");
        out.join(tet, map.pre(vertex), nbd, map)
            .expect("vertex neighbourhood faces are free");
    }
}

/// Glues two blocks across an internal face of the source triangulation.
/// Both boundary records are consumed; each is used in exactly one gluing.
fn join_blocks(
    blocks: &mut [Block],
    out: &mut Triangulation,
    gluing: Perm4,
    from: BlockId,
    face: FacetNumber,
    to: BlockId,
    to_face: FacetNumber,
) {
    let mine = blocks[from].bdry[usize::from(face)]
        .take()
        .expect("block meets this face");
    let dest = blocks[to].bdry[usize::from(to_face)]
        .take()
        .expect("block meets the partner face");
    match (mine, dest) {
        (Bdry::Quad(a), Bdry::Quad(b)) => a.join(b, gluing, out),
        (Bdry::Hex(a), Bdry::Hex(b)) => a.join(b, gluing, out),
        _ => unreachable!("matched boundaries have the same shape"),
    }
}

fn new_inner<const N: usize>(out: &mut Triangulation) -> [TetIndex; N] {
    std::array::from_fn(|_| out.new_tetrahedron())
}

fn internal_join(out: &mut Triangulation, tet: TetIndex, face: FacetNumber, adj: TetIndex) {
    out.join(tet, face, adj, Perm4::IDENTITY)
        .expect("template faces are free");
}

/// A triangular prism containing one triangular disc parallel to vertex
/// `vertex` of the outer tetrahedron.  Three inner tetrahedra.
fn tri_prism(vertex: u8, out: &mut Triangulation) -> Block {
    let t: [TetIndex; 3] = new_inner(out);
    internal_join(out, t[1], 1, t[0]);
    internal_join(out, t[1], 3, t[2]);

    let vertices = Perm4::swap(0, vertex);

    let mut bdry: [Option<Bdry>; 4] = [None, None, None, None];
    bdry[usize::from(vertices.apply(1))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([0, 2, 3, 1]),
        inner_tet: [t[1], t[2]],
        inner_vertices: [Perm4::raw([2, 3, 1, 0]), Perm4::raw([1, 3, 2, 0])],
    }));
    bdry[usize::from(vertices.apply(2))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::swap(2, 3),
        inner_tet: [t[0], t[2]],
        inner_vertices: [Perm4::raw([2, 1, 0, 3]), Perm4::raw([0, 3, 2, 1])],
    }));
    bdry[usize::from(vertices.apply(3))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices,
        inner_tet: [t[0], t[1]],
        inner_vertices: [Perm4::raw([3, 1, 0, 2]), Perm4::raw([0, 1, 3, 2])],
    }));

    let mut link = [None; 4];
    link[usize::from(vertices.apply(0))] = Some((t[0], vertices * Perm4::raw([0, 1, 3, 2])));

    Block { bdry, link }
}

/// A quadrilateral prism lying between two quadrilateral discs of the
/// given type.  Five inner tetrahedra around a central one.
fn quad_prism(quad_type: u8, out: &mut Triangulation) -> Block {
    let t: [TetIndex; 5] = new_inner(out);
    internal_join(out, t[4], 2, t[0]);
    internal_join(out, t[4], 3, t[1]);
    internal_join(out, t[4], 0, t[2]);
    internal_join(out, t[4], 1, t[3]);

    let q = QUAD_DEFN[usize::from(quad_type)];
    let vertices = Perm4::raw([q[0], q[2], q[1], q[3]]);

    let mut bdry: [Option<Bdry>; 4] = [None, None, None, None];
    bdry[usize::from(vertices.apply(0))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([2, 3, 1, 0]),
        inner_tet: [t[2], t[1]],
        inner_vertices: [Perm4::raw([1, 0, 2, 3]), Perm4::raw([2, 3, 1, 0])],
    }));
    bdry[usize::from(vertices.apply(1))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([3, 0, 2, 1]),
        inner_tet: [t[3], t[2]],
        inner_vertices: [Perm4::raw([2, 1, 3, 0]), Perm4::raw([3, 0, 2, 1])],
    }));
    bdry[usize::from(vertices.apply(2))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([0, 1, 3, 2]),
        inner_tet: [t[0], t[3]],
        inner_vertices: [Perm4::raw([3, 2, 0, 1]), Perm4::raw([0, 1, 3, 2])],
    }));
    bdry[usize::from(vertices.apply(3))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([1, 2, 0, 3]),
        inner_tet: [t[1], t[0]],
        inner_vertices: [Perm4::raw([0, 3, 1, 2]), Perm4::raw([1, 2, 0, 3])],
    }));

    Block { bdry, link: [None; 4] }
}

/// Half a truncated tetrahedron: the piece between a quadrilateral disc
/// and the edge of the given number, with the two corners at that edge
/// truncated.  Eight inner tetrahedra.
fn trunc_half_tet(edge: u8, out: &mut Triangulation) -> Block {
    let t: [TetIndex; 8] = new_inner(out);
    internal_join(out, t[1], 2, t[0]);
    internal_join(out, t[1], 1, t[2]);
    internal_join(out, t[1], 0, t[3]);
    internal_join(out, t[2], 0, t[4]);
    internal_join(out, t[3], 1, t[4]);
    internal_join(out, t[3], 3, t[5]);
    internal_join(out, t[5], 2, t[6]);
    internal_join(out, t[4], 2, t[7]);

    let near = EDGE_VERTEX[usize::from(edge)];
    let far = EDGE_VERTEX[usize::from(5 - edge)];
    let vertices = Perm4::raw([near[0], near[1], far[0], far[1]]);

    let mut bdry: [Option<Bdry>; 4] = [None, None, None, None];
    bdry[usize::from(vertices.apply(0))] = Some(Bdry::Hex(BdryHex {
        outer_vertices: vertices * Perm4::raw([1, 3, 2, 0]),
        inner_tet: [t[2], t[7], t[5], t[4]],
        inner_vertices: [
            Perm4::raw([2, 0, 1, 3]),
            Perm4::raw([1, 2, 0, 3]),
            Perm4::raw([0, 3, 2, 1]),
            Perm4::raw([0, 2, 1, 3]),
        ],
    }));
    bdry[usize::from(vertices.apply(1))] = Some(Bdry::Hex(BdryHex {
        outer_vertices: vertices * Perm4::raw([0, 3, 2, 1]),
        inner_tet: [t[0], t[7], t[6], t[3]],
        inner_vertices: [
            Perm4::raw([1, 2, 3, 0]),
            Perm4::raw([3, 2, 0, 1]),
            Perm4::raw([0, 2, 1, 3]),
            Perm4::raw([0, 1, 3, 2]),
        ],
    }));
    bdry[usize::from(vertices.apply(2))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([3, 1, 0, 2]),
        inner_tet: [t[2], t[0]],
        inner_vertices: [Perm4::raw([3, 1, 0, 2]), Perm4::raw([0, 2, 3, 1])],
    }));
    bdry[usize::from(vertices.apply(3))] = Some(Bdry::Quad(BdryQuad {
        outer_vertices: vertices * Perm4::raw([2, 0, 1, 3]),
        inner_tet: [t[6], t[5]],
        inner_vertices: [Perm4::raw([3, 2, 1, 0]), Perm4::raw([1, 2, 3, 0])],
    }));

    let mut link = [None; 4];
    link[usize::from(vertices.apply(2))] = Some((t[6], vertices * Perm4::raw([3, 2, 0, 1])));
    link[usize::from(vertices.apply(3))] = Some((t[7], vertices * Perm4::raw([3, 1, 2, 0])));

    Block { bdry, link }
}

/// A tetrahedron with all four corners truncated; used when the outer
/// tetrahedron contains no quadrilaterals.  Eleven inner tetrahedra.
fn trunc_tet(out: &mut Triangulation) -> Block {
    let t: [TetIndex; 11] = new_inner(out);
    internal_join(out, t[0], 2, t[4]);
    internal_join(out, t[1], 3, t[7]);
    internal_join(out, t[2], 0, t[6]);
    internal_join(out, t[3], 1, t[9]);
    internal_join(out, t[5], 3, t[4]);
    internal_join(out, t[5], 1, t[6]);
    internal_join(out, t[8], 0, t[7]);
    internal_join(out, t[8], 2, t[9]);
    internal_join(out, t[4], 1, t[10]);
    internal_join(out, t[6], 3, t[10]);
    internal_join(out, t[7], 2, t[10]);
    internal_join(out, t[9], 0, t[10]);

    let bdry: [Option<Bdry>; 4] = [
        Some(Bdry::Hex(BdryHex {
            outer_vertices: Perm4::raw([2, 1, 3, 0]),
            inner_tet: [t[2], t[8], t[3], t[9]],
            inner_vertices: [
                Perm4::raw([2, 0, 1, 3]),
                Perm4::raw([1, 2, 0, 3]),
                Perm4::raw([0, 1, 2, 3]),
                Perm4::raw([0, 2, 1, 3]),
            ],
        })),
        Some(Bdry::Hex(BdryHex {
            outer_vertices: Perm4::raw([3, 2, 0, 1]),
            inner_tet: [t[3], t[5], t[0], t[4]],
            inner_vertices: [
                Perm4::raw([3, 1, 2, 0]),
                Perm4::raw([2, 3, 1, 0]),
                Perm4::raw([1, 2, 3, 0]),
                Perm4::raw([1, 3, 2, 0]),
            ],
        })),
        Some(Bdry::Hex(BdryHex {
            outer_vertices: Perm4::raw([0, 3, 1, 2]),
            inner_tet: [t[0], t[8], t[1], t[7]],
            inner_vertices: [
                Perm4::raw([0, 2, 3, 1]),
                Perm4::raw([3, 0, 2, 1]),
                Perm4::raw([2, 3, 0, 1]),
                Perm4::raw([2, 0, 3, 1]),
            ],
        })),
        Some(Bdry::Hex(BdryHex {
            outer_vertices: Perm4::raw([1, 0, 2, 3]),
            inner_tet: [t[1], t[5], t[2], t[6]],
            inner_vertices: [
                Perm4::raw([1, 3, 0, 2]),
                Perm4::raw([0, 1, 3, 2]),
                Perm4::raw([3, 0, 1, 2]),
                Perm4::raw([3, 1, 0, 2]),
            ],
        })),
    ];

    let link = std::array::from_fn(|i| Some((t[i], Perm4::raw([1, 2, 3, 0]))));

    Block { bdry, link }
}

// =============================================================================
// PER-TETRAHEDRON BLOCK SETS
// =============================================================================

/// The full set of blocks partitioning one tetrahedron of the source
/// triangulation, indexed the way the gluing loop consumes them.
///
/// A fake vertex-linking layer is added around every vertex: the innermost
/// blocks carry vertex-linking triangles on their boundary even when the
/// surface has none there, and a small tetrahedron is glued back over each
/// to fill the vertex neighbourhood in.
struct TetBlockSet {
    tri_count: [usize; 4],
    quad_count: usize,
    quad_type: u8,
    tri_prism: [Vec<BlockId>; 4],
    quad_prism: Vec<BlockId>,
    trunc_half_tet: [BlockId; 2],
    trunc_tet: BlockId,
    vertex_nbd: [TetIndex; 4],
}

impl TetBlockSet {
    fn new(
        surface: &NormalSurface,
        tet: TetIndex,
        blocks: &mut Vec<Block>,
        out: &mut Triangulation,
    ) -> Result<TetBlockSet, CutError> {
        let mut tri_count = [0usize; 4];
        for (v, count) in tri_count.iter_mut().enumerate() {
            *count = disc_count(&surface.triangles(tet, v as u8))?;
        }

        let mut quad_count = 0;
        let mut quad_type = 0;
        for q in 0..3u8 {
            let count = disc_count(&surface.quads(tet, q))?;
            if count > 0 {
                quad_count = count;
                quad_type = q;
                break;
            }
        }

        fn push(blocks: &mut Vec<Block>, block: Block) -> BlockId {
            blocks.push(block);
            blocks.len() - 1
        }

        let tri_prism: [Vec<BlockId>; 4] = std::array::from_fn(|v| {
            (0..tri_count[v])
                .map(|_| push(blocks, tri_prism(v as u8, out)))
                .collect()
        });

        let mut quad_prism_ids = Vec::new();
        let trunc_half_ids;
        let trunc_tet_id;
        if quad_count == 0 {
            // Sentinels; every accessor guards on quad_count first.
            trunc_half_ids = [usize::MAX; 2];
            trunc_tet_id = push(blocks, trunc_tet(out));
        } else {
            for _ in 1..quad_count {
                quad_prism_ids.push(push(blocks, quad_prism(quad_type, out)));
            }
            trunc_half_ids = [
                push(blocks, trunc_half_tet(5 - quad_type, out)),
                push(blocks, trunc_half_tet(quad_type, out)),
            ];
            trunc_tet_id = usize::MAX;
        }

        let mut vertex_nbd = [0; 4];
        for v in 0..4u8 {
            let nbd = out.new_tetrahedron();
            vertex_nbd[usize::from(v)] = nbd;

            let inner = if tri_count[usize::from(v)] > 0 {
                tri_prism[usize::from(v)][0]
            } else if quad_count == 0 {
                trunc_tet_id
            } else if v == 0 || v == EDGE_VERTEX[usize::from(quad_type)][1] {
                trunc_half_ids[0]
            } else {
                trunc_half_ids[1]
            };
            blocks[inner].attach_vertex_nbd(nbd, v, out);
        }

        Ok(TetBlockSet {
            tri_count,
            quad_count,
            quad_type,
            tri_prism,
            quad_prism: quad_prism_ids,
            trunc_half_tet: trunc_half_ids,
            trunc_tet: trunc_tet_id,
            vertex_nbd,
        })
    }

    /// The number of quadrilateral block boundaries in the given face,
    /// counting outwards from `from_vertex`.
    fn num_quad_blocks(&self, face: FacetNumber, from_vertex: u8) -> usize {
        let mut ans = self.tri_count[usize::from(from_vertex)];
        if self.quad_count > 0
            && self.quad_type == QUAD_SEPARATING[usize::from(face)][usize::from(from_vertex)]
        {
            ans += self.quad_count;
        }
        ans
    }

    /// The block presenting the `which`th quadrilateral boundary counting
    /// outwards from `from_vertex`, across any face containing it.
    fn quad_block(&self, from_vertex: u8, which: usize) -> BlockId {
        let tris = self.tri_count[usize::from(from_vertex)];
        if which < tris {
            return self.tri_prism[usize::from(from_vertex)][which];
        }

        // Quadrilateral prisms are numbered away from vertex 0's side.
        let low_end =
            from_vertex == 0 || from_vertex == EDGE_VERTEX[usize::from(self.quad_type)][1];
        if which == tris {
            return self.trunc_half_tet[usize::from(!low_end)];
        }
        if low_end {
            self.quad_prism[which - tris - 1]
        } else {
            self.quad_prism[self.quad_count - (which - tris) - 1]
        }
    }

    /// The block presenting a hexagonal boundary in the given face.
    fn hex_block(&self, face: FacetNumber) -> BlockId {
        if self.quad_count == 0 {
            return self.trunc_tet;
        }
        if face == 0 || face == EDGE_VERTEX[usize::from(self.quad_type)][1] {
            self.trunc_half_tet[1]
        } else {
            self.trunc_half_tet[0]
        }
    }
}

// =============================================================================
// CUTTING AND CRUSHING
// =============================================================================

impl NormalSurface {
    /// Cuts the ambient triangulation open along this surface.
    ///
    /// The result is a triangulation of the complement of the surface; a
    /// two-sided surface appears twice in its boundary, a one-sided
    /// surface once as its orientable double cover.  For a two-sided
    /// separating surface in a connected manifold the result has exactly
    /// two components.
    ///
    /// The surface must be embedded.  Octagons are handled by cutting
    /// along the isotopic normal surface from [`Self::remove_octagons`].
    ///
    /// # Errors
    ///
    /// Returns [`CutError::NonCompact`] if the surface has infinitely
    /// many triangles, and [`CutError::Overflow`] if a disc count exceeds
    /// `usize`.
    pub fn cut_along(&self) -> Result<Triangulation, CutError> {
        if self.octagon_position().is_some() {
            return self.remove_octagons().cut_along();
        }

        let src = self.triangulation();
        let mut out = Triangulation::new();
        if src.is_empty() {
            return Ok(out);
        }

        let mut blocks: Vec<Block> = Vec::new();
        let mut sets = Vec::with_capacity(src.size());
        for tet in 0..src.size() {
            sets.push(TetBlockSet::new(self, tet, &mut blocks, &mut out)?);
        }

        let skeleton = src.skeleton();
        for triangle in skeleton.triangles() {
            if triangle.is_boundary() {
                continue;
            }
            let (tet0, face0) = triangle.embeddings[0];
            let (tet1, face1) = triangle.embeddings[1];
            let gluing = src
                .gluing(tet0, face0)
                .expect("internal triangles are glued")
                .perm;

            for from0 in 0..4u8 {
                if from0 == face0 {
                    continue;
                }
                let from1 = gluing.apply(from0);

                for i in 0..sets[tet0].num_quad_blocks(face0, from0) {
                    join_blocks(
                        &mut blocks,
                        &mut out,
                        gluing,
                        sets[tet0].quad_block(from0, i),
                        face0,
                        sets[tet1].quad_block(from1, i),
                        face1,
                    );
                }

                out.join(
                    sets[tet0].vertex_nbd[usize::from(from0)],
                    face0,
                    sets[tet1].vertex_nbd[usize::from(from1)],
                    gluing,
                )
                .expect("vertex neighbourhood faces are free");
            }

            join_blocks(
                &mut blocks,
                &mut out,
                gluing,
                sets[tet0].hex_block(face0),
                face0,
                sets[tet1].hex_block(face1),
                face1,
            );
        }

        Ok(out)
    }

    /// Crushes this surface to a point, destroying every tetrahedron that
    /// contains a quadrilateral and regluing the remainder directly.
    ///
    /// Crushing does not in general preserve the underlying manifold: in
    /// addition to cutting along the surface and collapsing its copies,
    /// it can flatten the product regions between quadrilaterals, which
    /// may delete lens-space, sphere-bundle or connected-sum structure.
    /// For the quadrilateral vertex spheres used in connected sum
    /// decomposition the side effects are precisely understood, which is
    /// what makes the decomposition loop terminate.
    ///
    /// The surface must be embedded and normal; triangle and octagon
    /// coordinates play no part.
    ///
    /// # Errors
    ///
    /// Returns [`CutError::NonCompact`] if the surface is not compact.
    pub fn crush(&self) -> Result<Triangulation, CutError> {
        if !self.is_compact() {
            return Err(CutError::NonCompact);
        }

        let src = self.triangulation();
        let mut ans = (**src).clone();
        let n = ans.size();
        if n == 0 {
            return Ok(ans);
        }

        let mut quad_types: Vec<Option<u8>> = Vec::with_capacity(n);
        for tet in 0..n {
            let mut qt = None;
            for q in 0..3u8 {
                if !self.quads(tet, q).is_zero() {
                    qt = Some(q);
                    break;
                }
            }
            quad_types.push(qt);
        }

        // Reglue each face of each surviving tetrahedron, following
        // gluings through doomed tetrahedra.  Crossing a doomed
        // tetrahedron composes with the reflection through its
        // quadrilaterals, which exchanges each entry face with the face
        // at the other end of the product region.
        for tet in 0..n {
            if quad_types[tet].is_some() {
                continue;
            }
            for face in 0..4u8 {
                let Some(start) = ans.gluing(tet, face) else {
                    continue;
                };
                if quad_types[start.adj].is_none() {
                    continue;
                }

                let mut adj_perm = start.perm;
                let mut adj_face = adj_perm.apply(face);
                let mut cur = Some(start.adj);
                while let Some(here) = cur {
                    let Some(qt) = quad_types[here] else {
                        break;
                    };
                    let swap = Perm4::swap(adj_face, quad_partner(qt, adj_face));
                    adj_face = swap.apply(adj_face);
                    match ans.gluing(here, adj_face) {
                        Some(next) => {
                            adj_perm = next.perm * swap * adj_perm;
                            cur = Some(next.adj);
                            adj_face = adj_perm.apply(face);
                        }
                        None => cur = None,
                    }
                }

                ans.unglue(tet, face).expect("face was glued");
                let Some(other) = cur else {
                    continue;
                };
                // The far face is still glued into the doomed region.
                ans.unglue(other, adj_face).expect("face was glued");
                ans.join(tet, face, other, adj_perm)
                    .expect("both faces were just freed");
            }
        }

        for tet in (0..n).rev() {
            if quad_types[tet].is_some() {
                ans.remove_tetrahedron(tet).expect("index is in range");
            }
        }
        Ok(ans)
    }
}

// =============================================================================
// TESTS
// =============================================================================
