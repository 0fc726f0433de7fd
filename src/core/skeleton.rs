//! Skeletal Structure of a Triangulation
//!
//! The [`Skeleton`] records everything a triangulation's gluing table
//! implies but does not store: vertex, edge and triangle classes, connected
//! components, orientability, vertex-link classification, and boundary
//! components (both real and ideal).
//!
//! A skeleton is immutable once built. Triangulations hold one behind an
//! RCU-style cache (see `Triangulation::skeleton`), so several readers can
//! share a single computed skeleton without locking.
//!
//! # Face classes
//!
//! Faces are identified by union-find over the gluing maps:
//!
//! - A **vertex class** collects tetrahedron corners identified by gluings.
//! - An **edge class** collects tetrahedron edges, tracking the relative
//!   direction of each identification; an edge glued to itself in reverse
//!   is *invalid*.
//! - A **triangle class** is a facet together with its glued partner, if
//!   any.
//!
//! For valid edges the embeddings are listed in order around the edge, with
//! vertex permutations arranged so that consecutive embeddings are related
//! by `next = gluing ∘ current ∘ (2 3)`, the exit facet of an embedding
//! with permutation `m` being facet `m(3)`. The Pachner moves rely on this
//! ordering.
//!
//! # Vertex links
//!
//! Each vertex link is assembled as a small triangulated surface (one
//! triangle per corner embedding) and classified by Euler characteristic,
//! orientability and boundary: sphere and disc links are ordinary, closed
//! non-sphere links make the vertex *ideal*, and bounded non-disc links
//! make it *invalid*.

use serde::{Deserialize, Serialize};

use super::collections::{FacetNumber, FastHashMap, SmallBuffer, TetIndex};
use super::perm::Perm4;
use super::tetrahedron::{edge_number, EDGE_VERTEX};
use super::triangulation::{facet_vertices, Triangulation};

// =============================================================================
// FACE DATA
// =============================================================================

/// Classification of a vertex link surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexLinkType {
    /// The link is a 2-sphere: an ordinary internal vertex.
    Sphere,
    /// The link is a disc: an ordinary vertex on the real boundary.
    Disc,
    /// The link is a torus: an ideal vertex with a torus cusp.
    Torus,
    /// The link is a Klein bottle: an ideal vertex with a Klein bottle
    /// cusp.
    KleinBottle,
    /// The link is some other closed surface: an ideal vertex with a
    /// higher-genus cusp.
    OtherClosed,
    /// The link is a bounded surface other than a disc: the vertex is
    /// invalid.
    NonDiscBoundary,
}

/// One appearance of a vertex class inside a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexEmbedding {
    /// The tetrahedron.
    pub tet: TetIndex,
    /// The corner of that tetrahedron.
    pub vertex: u8,
}

/// A vertex class of the triangulation.
#[derive(Clone, Debug)]
pub struct Vertex {
    /// All corners identified into this class, in order of discovery.
    pub embeddings: Vec<VertexEmbedding>,
    /// Classification of the link surface.
    pub link: VertexLinkType,
    /// Euler characteristic of the link surface.
    pub link_euler_char: i32,
    /// Whether the link surface is orientable.
    pub link_orientable: bool,
    /// The boundary component this vertex belongs to, if any. Ideal and
    /// invalid vertices each form their own.
    pub boundary_component: Option<usize>,
    /// The component containing this vertex.
    pub component: usize,
}

impl Vertex {
    /// Number of corners identified into this class.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether the link is a closed surface other than a sphere.
    #[must_use]
    pub fn is_ideal(&self) -> bool {
        matches!(
            self.link,
            VertexLinkType::Torus | VertexLinkType::KleinBottle | VertexLinkType::OtherClosed
        )
    }

    /// Whether the link is a sphere, disc or closed surface.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.link != VertexLinkType::NonDiscBoundary
    }

    /// Whether this vertex lies on the real boundary or is ideal.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.boundary_component.is_some()
    }
}

/// One appearance of an edge class inside a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEmbedding {
    /// The tetrahedron.
    pub tet: TetIndex,
    /// Vertex permutation: `vertices(0)` and `vertices(1)` are the ends of
    /// the edge; facet `vertices(3)` leads to the next embedding and facet
    /// `vertices(2)` to the previous.
    pub vertices: Perm4,
}

impl EdgeEmbedding {
    /// The edge number (0…5) within its tetrahedron.
    #[must_use]
    pub fn edge(&self) -> u8 {
        edge_number(self.vertices.apply(0), self.vertices.apply(1))
    }
}

/// An edge class of the triangulation.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The embeddings, ordered around the edge when the edge is valid.
    pub embeddings: Vec<EdgeEmbedding>,
    /// Whether the edge avoids being identified with itself in reverse.
    pub valid: bool,
    /// The vertex classes of the two ends (equal for a loop edge).
    pub vertices: [usize; 2],
    /// The boundary component containing this edge, if any.
    pub boundary_component: Option<usize>,
}

impl Edge {
    /// Number of tetrahedron edges identified into this class.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether this edge lies on the real boundary.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.boundary_component.is_some()
    }
}

/// A triangle class: a facet together with its glued partner, if any.
#[derive(Clone, Debug)]
pub struct Triangle {
    /// One or two (tetrahedron, facet) pairs.
    pub embeddings: SmallBuffer<(TetIndex, FacetNumber), 2>,
    /// The boundary component containing this triangle, if any.
    pub boundary_component: Option<usize>,
}

impl Triangle {
    /// Whether this triangle lies on the real boundary.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.embeddings.len() == 1
    }
}

/// A connected component of the triangulation.
#[derive(Clone, Copy, Debug)]
pub struct Component {
    /// Number of tetrahedra in the component.
    pub size: usize,
    /// Whether the component is orientable.
    pub orientable: bool,
}

/// A boundary component: either a collection of boundary triangles (real)
/// or a single ideal or invalid vertex.
#[derive(Clone, Debug)]
pub struct BoundaryComponent {
    /// Boundary triangle classes, empty for an ideal or invalid vertex.
    pub triangles: Vec<usize>,
    /// The vertex class, for an ideal or invalid vertex component.
    pub ideal_vertex: Option<usize>,
    /// Euler characteristic of the boundary surface.
    pub euler_char: i32,
}

impl BoundaryComponent {
    /// Whether this component is an ideal (or invalid) vertex rather than
    /// real boundary.
    #[must_use]
    pub fn is_ideal(&self) -> bool {
        self.ideal_vertex.is_some()
    }
}

// =============================================================================
// SKELETON
// =============================================================================

/// The full face lattice and global properties of one triangulation, as of
/// the generation at which it was built.
#[derive(Clone, Debug)]
pub struct Skeleton {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,
    components: Vec<Component>,
    boundary_components: Vec<BoundaryComponent>,
    tet_component: Vec<usize>,
    /// Per-tetrahedron orientation (±1), meaningful when orientable.
    orientations: Vec<i8>,
    vertex_class: Vec<[usize; 4]>,
    edge_class: Vec<[usize; 6]>,
    triangle_class: Vec<[usize; 4]>,
    orientable: bool,
    edges_valid: bool,
}

impl Skeleton {
    /// The vertex classes.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The edge classes.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The triangle classes.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The connected components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The boundary components (real boundary surfaces followed by ideal
    /// and invalid vertices).
    #[must_use]
    pub fn boundary_components(&self) -> &[BoundaryComponent] {
        &self.boundary_components
    }

    /// The component index of each tetrahedron.
    #[must_use]
    pub fn tet_component(&self) -> &[usize] {
        &self.tet_component
    }

    /// The orientation (±1) assigned to each tetrahedron; consistent
    /// exactly when the triangulation is orientable.
    #[must_use]
    pub fn orientations(&self) -> &[i8] {
        &self.orientations
    }

    /// The vertex class containing the given corner.
    #[must_use]
    pub fn vertex_class(&self, tet: TetIndex, vertex: u8) -> usize {
        self.vertex_class[tet][usize::from(vertex)]
    }

    /// The edge class containing the given tetrahedron edge (0…5).
    #[must_use]
    pub fn edge_class(&self, tet: TetIndex, edge: u8) -> usize {
        self.edge_class[tet][usize::from(edge)]
    }

    /// The triangle class containing the given facet.
    #[must_use]
    pub fn triangle_class(&self, tet: TetIndex, facet: FacetNumber) -> usize {
        self.triangle_class[tet][usize::from(facet)]
    }

    /// Whether every edge and every vertex is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.edges_valid && self.vertices.iter().all(Vertex::is_valid)
    }

    /// Whether no edge is identified with itself in reverse.
    #[must_use]
    pub fn edges_valid(&self) -> bool {
        self.edges_valid
    }

    /// Whether every component is orientable.
    #[must_use]
    pub fn is_orientable(&self) -> bool {
        self.orientable
    }

    /// Whether some vertex link is a closed surface other than a sphere.
    #[must_use]
    pub fn is_ideal(&self) -> bool {
        self.vertices.iter().any(Vertex::is_ideal)
    }

    /// Whether the triangulation has real (triangulated) boundary.
    #[must_use]
    pub fn has_real_boundary(&self) -> bool {
        self.boundary_components.iter().any(|b| !b.is_ideal())
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Skeleton {
    /// Computes the skeleton of the given triangulation.
    #[must_use]
    pub fn build(tri: &Triangulation) -> Self {
        let (tet_component, orientations, orientable, comp_sizes) = compute_components(tri);
        let components: Vec<Component> = comp_sizes
            .iter()
            .enumerate()
            .map(|(c, &size)| Component {
                size,
                orientable: orientable_component(tri, &tet_component, &orientations, c),
            })
            .collect();

        let (triangle_class, triangles) = compute_triangles(tri);
        let (edge_class, mut edges) = compute_edges(tri);
        let (vertex_class, vertex_embeddings) = compute_vertex_classes(tri);

        let vertices: Vec<Vertex> = vertex_embeddings
            .into_iter()
            .map(|embeddings| {
                let link = classify_link(tri, &embeddings);
                Vertex {
                    component: if embeddings.is_empty() {
                        0
                    } else {
                        tet_component[embeddings[0].tet]
                    },
                    embeddings,
                    link: link.kind,
                    link_euler_char: link.euler_char,
                    link_orientable: link.orientable,
                    boundary_component: None,
                }
            })
            .collect();

        for e in &mut edges {
            if let Some(emb) = e.embeddings.first() {
                e.vertices = [
                    vertex_class[emb.tet][usize::from(emb.vertices.apply(0))],
                    vertex_class[emb.tet][usize::from(emb.vertices.apply(1))],
                ];
            }
        }

        let edges_valid = edges.iter().all(|e| e.valid);

        let mut skel = Skeleton {
            vertices,
            edges,
            triangles,
            components,
            boundary_components: Vec::new(),
            tet_component,
            orientations,
            vertex_class,
            edge_class,
            triangle_class,
            orientable,
            edges_valid,
        };
        skel.compute_boundary_components(tri);
        skel
    }

    // Groups boundary triangles into surfaces, then appends one component
    // per ideal or invalid vertex.
    fn compute_boundary_components(&mut self, tri: &Triangulation) {
        let mut tri_of_facet: FastHashMap<(TetIndex, FacetNumber), usize> = FastHashMap::default();
        for (i, t) in self.triangles.iter().enumerate() {
            if t.is_boundary() {
                tri_of_facet.insert(t.embeddings[0], i);
            }
        }

        let mut seen: FastHashMap<usize, usize> = FastHashMap::default();
        for (&(tet, facet), &tri_idx) in &tri_of_facet {
            if seen.contains_key(&tri_idx) {
                continue;
            }
            let comp = self.boundary_components.len();
            // BFS across the boundary surface, crossing each boundary edge
            // by rotating through the interior.
            let mut queue = vec![(tet, facet)];
            let mut member_triangles: Vec<usize> = Vec::new();
            seen.insert(tri_idx, comp);
            while let Some((t0, f0)) = queue.pop() {
                let idx = tri_of_facet[&(t0, f0)];
                member_triangles.push(idx);
                self.triangles[idx].boundary_component = Some(comp);
                for pivot in facet_vertices(f0) {
                    let (s, b) = boundary_partner(tri, t0, f0, pivot);
                    let partner = tri_of_facet[&(s, b)];
                    if let std::collections::hash_map::Entry::Vacant(entry) =
                        seen.entry(partner)
                    {
                        entry.insert(comp);
                        queue.push((s, b));
                    }
                }
            }
            // Mark edges and vertices on this component.
            let mut edge_set: Vec<usize> = Vec::new();
            let mut vertex_set: Vec<usize> = Vec::new();
            for &idx in &member_triangles {
                let (t0, f0) = self.triangles[idx].embeddings[0];
                for pivot in facet_vertices(f0) {
                    for other in facet_vertices(f0) {
                        if other != pivot {
                            let e = self.edge_class(t0, edge_number(pivot, other));
                            if self.edges[e].boundary_component.is_none() {
                                self.edges[e].boundary_component = Some(comp);
                                edge_set.push(e);
                            }
                        }
                    }
                    let v = self.vertex_class(t0, pivot);
                    if self.vertices[v].boundary_component.is_none() {
                        self.vertices[v].boundary_component = Some(comp);
                        vertex_set.push(v);
                    }
                }
            }
            let euler_char = vertex_set.len() as i32 - edge_set.len() as i32
                + member_triangles.len() as i32;
            self.boundary_components.push(BoundaryComponent {
                triangles: member_triangles,
                ideal_vertex: None,
                euler_char,
            });
        }

        // Ideal and invalid vertices each form their own component.
        for v in 0..self.vertices.len() {
            if self.vertices[v].boundary_component.is_none()
                && (self.vertices[v].is_ideal() || !self.vertices[v].is_valid())
            {
                let comp = self.boundary_components.len();
                self.vertices[v].boundary_component = Some(comp);
                let euler_char = self.vertices[v].link_euler_char;
                self.boundary_components.push(BoundaryComponent {
                    triangles: Vec::new(),
                    ideal_vertex: Some(v),
                    euler_char,
                });
            }
        }
    }
}

// Rotates around the boundary edge of facet `facet` opposite `pivot`...
// more precisely: starting from boundary facet `facet` of `tet` with pivot
// vertex `pivot` on its triangle, walks through the interior around the
// boundary edge opposite to `pivot` within the triangle, returning the
// partner boundary facet reached on the far side.
fn boundary_partner(
    tri: &Triangulation,
    tet: TetIndex,
    facet: FacetNumber,
    pivot: u8,
) -> (TetIndex, FacetNumber) {
    let (mut s, mut a, mut b) = (tet, facet, pivot);
    while let Some(g) = tri.gluing(s, b) {
        let (na, nb) = (g.perm.apply(b), g.perm.apply(a));
        s = g.adj;
        a = na;
        b = nb;
    }
    let _ = a;
    (s, b)
}

// -----------------------------------------------------------------------------
// Components and orientations
// -----------------------------------------------------------------------------

fn compute_components(tri: &Triangulation) -> (Vec<usize>, Vec<i8>, bool, Vec<usize>) {
    let n = tri.size();
    let mut component = vec![usize::MAX; n];
    let mut orientation = vec![0i8; n];
    let mut orientable = true;
    let mut sizes: Vec<usize> = Vec::new();
    for start in 0..n {
        if component[start] != usize::MAX {
            continue;
        }
        let comp = sizes.len();
        sizes.push(0);
        component[start] = comp;
        orientation[start] = 1;
        let mut queue = vec![start];
        while let Some(t) = queue.pop() {
            sizes[comp] += 1;
            for facet in 0..4 {
                let Some(g) = tri.gluing(t, facet) else {
                    continue;
                };
                // An odd gluing permutation is compatible with equal
                // orientations on the two tetrahedra.
                let expected = if g.perm.sign() < 0 {
                    orientation[t]
                } else {
                    -orientation[t]
                };
                if component[g.adj] == usize::MAX {
                    component[g.adj] = comp;
                    orientation[g.adj] = expected;
                    queue.push(g.adj);
                } else if orientation[g.adj] != expected {
                    orientable = false;
                }
            }
        }
    }
    (component, orientation, orientable, sizes)
}

fn orientable_component(
    tri: &Triangulation,
    tet_component: &[usize],
    orientations: &[i8],
    comp: usize,
) -> bool {
    for t in 0..tri.size() {
        if tet_component[t] != comp {
            continue;
        }
        for facet in 0..4 {
            if let Some(g) = tri.gluing(t, facet) {
                let expected = if g.perm.sign() < 0 {
                    orientations[t]
                } else {
                    -orientations[t]
                };
                if orientations[g.adj] != expected {
                    return false;
                }
            }
        }
    }
    true
}

// -----------------------------------------------------------------------------
// Triangles
// -----------------------------------------------------------------------------

fn compute_triangles(tri: &Triangulation) -> (Vec<[usize; 4]>, Vec<Triangle>) {
    let n = tri.size();
    let mut class = vec![[usize::MAX; 4]; n];
    let mut triangles: Vec<Triangle> = Vec::new();
    for t in 0..n {
        for facet in 0..4u8 {
            if class[t][usize::from(facet)] != usize::MAX {
                continue;
            }
            let idx = triangles.len();
            class[t][usize::from(facet)] = idx;
            let mut embeddings: SmallBuffer<(TetIndex, FacetNumber), 2> = SmallBuffer::new();
            embeddings.push((t, facet));
            if let Some(g) = tri.gluing(t, facet) {
                let adj_facet = g.adj_facet(facet);
                class[g.adj][usize::from(adj_facet)] = idx;
                embeddings.push((g.adj, adj_facet));
            }
            triangles.push(Triangle {
                embeddings,
                boundary_component: None,
            });
        }
    }
    (class, triangles)
}

// -----------------------------------------------------------------------------
// Edges
// -----------------------------------------------------------------------------

// Union-find with a direction bit per slot: the bit records whether the
// slot's ascending vertex order agrees with its root's.
struct SignedUnionFind {
    parent: Vec<usize>,
    flip: Vec<bool>,
    consistent: Vec<bool>,
}

impl SignedUnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            flip: vec![false; n],
            consistent: vec![true; n],
        }
    }

    fn find(&mut self, x: usize) -> (usize, bool) {
        if self.parent[x] == x {
            return (x, false);
        }
        let (root, parent_flip) = self.find(self.parent[x]);
        self.parent[x] = root;
        self.flip[x] ^= parent_flip;
        (root, self.flip[x])
    }

    // Unites x and y, where the identification reverses direction iff
    // `reversed`.
    fn union(&mut self, x: usize, y: usize, reversed: bool) {
        let (rx, fx) = self.find(x);
        let (ry, fy) = self.find(y);
        if rx == ry {
            if fx ^ fy != reversed {
                self.consistent[rx] = false;
            }
            return;
        }
        let keep_consistent = self.consistent[rx] && self.consistent[ry];
        self.parent[ry] = rx;
        self.flip[ry] = fx ^ fy ^ reversed;
        self.consistent[rx] = keep_consistent;
    }

    fn class_consistent(&mut self, x: usize) -> bool {
        let (root, _) = self.find(x);
        self.consistent[root]
    }
}

fn compute_edges(tri: &Triangulation) -> (Vec<[usize; 6]>, Vec<Edge>) {
    let n = tri.size();
    let slot = |t: TetIndex, e: u8| 6 * t + usize::from(e);
    let mut uf = SignedUnionFind::new(6 * n);
    for t in 0..n {
        for facet in 0..4u8 {
            let Some(g) = tri.gluing(t, facet) else {
                continue;
            };
            for e in 0..6u8 {
                let [a, b] = EDGE_VERTEX[usize::from(e)];
                if a == facet || b == facet {
                    continue;
                }
                let (ia, ib) = (g.perm.apply(a), g.perm.apply(b));
                let adj_e = edge_number(ia, ib);
                uf.union(slot(t, e), slot(g.adj, adj_e), ia > ib);
            }
        }
    }

    let mut class = vec![[usize::MAX; 6]; n];
    let mut edges: Vec<Edge> = Vec::new();
    for t in 0..n {
        for e in 0..6u8 {
            if class[t][usize::from(e)] != usize::MAX {
                continue;
            }
            let idx = edges.len();
            let valid = uf.class_consistent(slot(t, e));
            // Assign every slot of the class before walking, so invalid
            // edges still get a complete class map.
            let (root, _) = uf.find(slot(t, e));
            let mut members: Vec<(TetIndex, u8)> = Vec::new();
            for t2 in t..n {
                for e2 in 0..6u8 {
                    if uf.find(slot(t2, e2)).0 == root {
                        class[t2][usize::from(e2)] = idx;
                        members.push((t2, e2));
                    }
                }
            }
            let embeddings = if valid {
                walk_edge(tri, t, e)
            } else {
                members
                    .iter()
                    .map(|&(t2, e2)| EdgeEmbedding {
                        tet: t2,
                        vertices: edge_start_perm(e2),
                    })
                    .collect()
            };
            edges.push(Edge {
                embeddings,
                valid,
                vertices: [0, 0],
                boundary_component: None,
            });
        }
    }
    (class, edges)
}

// Initial embedding permutation: edge ends first, opposite edge after.
fn edge_start_perm(e: u8) -> Perm4 {
    let [a, b] = EDGE_VERTEX[usize::from(e)];
    let [c, d] = EDGE_VERTEX[usize::from(5 - e)];
    Perm4::raw([a, b, c, d])
}

// Produces the ordered embedding list of a valid edge: walk backwards to a
// boundary facet (or all the way around), then forwards collecting
// embeddings.
fn walk_edge(tri: &Triangulation, t: TetIndex, e: u8) -> Vec<EdgeEmbedding> {
    let start = EdgeEmbedding {
        tet: t,
        vertices: edge_start_perm(e),
    };
    // Backward phase: exit through facet m(2).
    let mut first = start;
    loop {
        let exit = first.vertices.apply(2);
        let Some(g) = tri.gluing(first.tet, exit) else {
            break;
        };
        let prev = EdgeEmbedding {
            tet: g.adj,
            vertices: g.perm * first.vertices * Perm4::swap(2, 3),
        };
        if prev.tet == start.tet && prev.edge() == e {
            // Came all the way around: the edge is internal; start anywhere.
            first = start;
            break;
        }
        first = prev;
    }
    // Forward phase: exit through facet m(3).
    let mut embeddings = vec![first];
    let mut current = first;
    loop {
        let exit = current.vertices.apply(3);
        let Some(g) = tri.gluing(current.tet, exit) else {
            break;
        };
        let next = EdgeEmbedding {
            tet: g.adj,
            vertices: g.perm * current.vertices * Perm4::swap(2, 3),
        };
        if next.tet == first.tet && next.edge() == first.edge() {
            break;
        }
        embeddings.push(next);
        current = next;
    }
    embeddings
}

// -----------------------------------------------------------------------------
// Vertices
// -----------------------------------------------------------------------------

fn compute_vertex_classes(tri: &Triangulation) -> (Vec<[usize; 4]>, Vec<Vec<VertexEmbedding>>) {
    let n = tri.size();
    let slot = |t: TetIndex, v: u8| 4 * t + usize::from(v);
    let mut parent: Vec<usize> = (0..4 * n).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] == x {
            return x;
        }
        let root = find(parent, parent[x]);
        parent[x] = root;
        root
    }
    for t in 0..n {
        for facet in 0..4u8 {
            if let Some(g) = tri.gluing(t, facet) {
                for v in 0..4u8 {
                    if v != facet {
                        let a = find(&mut parent, slot(t, v));
                        let b = find(&mut parent, slot(g.adj, g.perm.apply(v)));
                        parent[a] = b;
                    }
                }
            }
        }
    }
    let mut class = vec![[usize::MAX; 4]; n];
    let mut embeddings: Vec<Vec<VertexEmbedding>> = Vec::new();
    let mut root_index: FastHashMap<usize, usize> = FastHashMap::default();
    for t in 0..n {
        for v in 0..4u8 {
            let root = find(&mut parent, slot(t, v));
            let idx = *root_index.entry(root).or_insert_with(|| {
                embeddings.push(Vec::new());
                embeddings.len() - 1
            });
            class[t][usize::from(v)] = idx;
            embeddings[idx].push(VertexEmbedding { tet: t, vertex: v });
        }
    }
    (class, embeddings)
}

// -----------------------------------------------------------------------------
// Vertex links
// -----------------------------------------------------------------------------

struct LinkSummary {
    kind: VertexLinkType,
    euler_char: i32,
    orientable: bool,
}

// Builds the link of a vertex class as a triangulated surface (one link
// triangle per corner embedding) and classifies it.
fn classify_link(tri: &Triangulation, corners: &[VertexEmbedding]) -> LinkSummary {
    let face_index: FastHashMap<(TetIndex, u8), usize> = corners
        .iter()
        .enumerate()
        .map(|(i, c)| ((c.tet, c.vertex), i))
        .collect();
    let nf = corners.len();

    // Link-vertex classes: corners of link triangles are directions
    // (tet, vertex, toward) with toward != vertex.
    let dir_slot = |i: usize, toward: u8| 4 * i + usize::from(toward);
    let mut parent: Vec<usize> = (0..4 * nf).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] == x {
            return x;
        }
        let root = find(parent, parent[x]);
        parent[x] = root;
        root
    }

    let mut boundary_sides = 0usize;
    let mut glued_sides = 0usize;
    // Orientation colouring of the link surface.
    let mut colour = vec![0i8; nf];
    let mut orientable = true;

    let mut stack: Vec<usize> = Vec::new();
    for start in 0..nf {
        if colour[start] != 0 {
            continue;
        }
        colour[start] = 1;
        stack.push(start);
        while let Some(i) = stack.pop() {
            let (t, v) = (corners[i].tet, corners[i].vertex);
            for f in 0..4u8 {
                if f == v {
                    continue;
                }
                let Some(g) = tri.gluing(t, f) else {
                    boundary_sides += 1;
                    continue;
                };
                glued_sides += 1;
                let j = face_index[&(g.adj, g.perm.apply(v))];
                // Identify the link-triangle corners across this side.
                for w in 0..4u8 {
                    if w != v && w != f {
                        let a = find(&mut parent, dir_slot(i, w));
                        let b = find(&mut parent, dir_slot(j, g.perm.apply(w)));
                        parent[a] = b;
                    }
                }
                // Induced permutation on the link triangle: odd overall
                // gluings keep the surface orientation coherent.
                let s3 = restricted_sign(g.perm, v);
                let expected = if s3 < 0 { colour[i] } else { -colour[i] };
                if colour[j] == 0 {
                    colour[j] = expected;
                    stack.push(j);
                } else if colour[j] != expected {
                    orientable = false;
                }
            }
        }
    }

    // Count link-vertex classes among the used direction slots.
    let mut roots: Vec<usize> = Vec::new();
    for (i, c) in corners.iter().enumerate() {
        for w in 0..4u8 {
            if w != c.vertex {
                roots.push(find(&mut parent, dir_slot(i, w)));
            }
        }
    }
    roots.sort_unstable();
    roots.dedup();
    let v_count = roots.len() as i32;
    let e_count = (boundary_sides + glued_sides / 2) as i32;
    let f_count = nf as i32;
    let euler_char = v_count - e_count + f_count;
    let closed = boundary_sides == 0;

    let kind = if closed {
        match (euler_char, orientable) {
            (2, _) => VertexLinkType::Sphere,
            (0, true) => VertexLinkType::Torus,
            (0, false) => VertexLinkType::KleinBottle,
            _ => VertexLinkType::OtherClosed,
        }
    } else if euler_char == 1 {
        VertexLinkType::Disc
    } else {
        VertexLinkType::NonDiscBoundary
    };
    LinkSummary {
        kind,
        euler_char,
        orientable,
    }
}

// Sign of the permutation induced on {0,1,2,3} \ {v} by g, relative to
// ascending order on both sides.
fn restricted_sign(g: Perm4, v: u8) -> i8 {
    let from: Vec<u8> = (0..4).filter(|&w| w != v).collect();
    let to_unsorted: Vec<u8> = from.iter().map(|&w| g.apply(w)).collect();
    let mut inversions = 0;
    for i in 0..3 {
        for j in (i + 1)..3 {
            if to_unsorted[i] > to_unsorted[j] {
                inversions += 1;
            }
        }
    }
    if inversions % 2 == 0 {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure_eight() -> Triangulation {
        // The standard two-tetrahedron ideal triangulation of the
        // figure eight knot complement.
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

    #[test]
    fn ball_skeleton_counts() {
        let tri = Triangulation::ball();
        let skel = tri.skeleton();
        assert_eq!(skel.vertices().len(), 4);
        assert_eq!(skel.edges().len(), 6);
        assert_eq!(skel.triangles().len(), 4);
        assert_eq!(skel.components().len(), 1);
        assert_eq!(skel.boundary_components().len(), 1);
        assert_eq!(skel.boundary_components()[0].euler_char, 2);
        assert!(skel.is_valid());
        for v in skel.vertices() {
            assert_eq!(v.link, VertexLinkType::Disc);
        }
    }

    #[test]
    fn sphere_skeleton_counts() {
        let tri = Triangulation::sphere();
        let skel = tri.skeleton();
        assert_eq!(skel.vertices().len(), 4);
        assert_eq!(skel.edges().len(), 6);
        assert_eq!(skel.triangles().len(), 4);
        assert!(skel.boundary_components().is_empty());
        for v in skel.vertices() {
            assert_eq!(v.link, VertexLinkType::Sphere);
        }
        for e in skel.edges() {
            assert_eq!(e.degree(), 2);
            assert!(e.valid);
        }
    }

    #[test]
    fn edge_embeddings_walk_consistently() {
        let tri = Triangulation::layered_loop(3, false);
        let skel = tri.skeleton();
        for e in skel.edges() {
            assert!(e.valid);
            // Consecutive embeddings are related by the exit-facet rule.
            for pair in e.embeddings.windows(2) {
                let exit = pair[0].vertices.apply(3);
                let g = tri.gluing(pair[0].tet, exit).unwrap();
                assert_eq!(g.adj, pair[1].tet);
                assert_eq!(
                    g.perm * pair[0].vertices * Perm4::swap(2, 3),
                    pair[1].vertices
                );
            }
        }
        // Degrees sum to 6 per tetrahedron.
        let total: usize = skel.edges().iter().map(Edge::degree).sum();
        assert_eq!(total, 6 * tri.size());
    }

    #[test]
    fn figure_eight_has_one_torus_cusp() {
        let tri = figure_eight();
        let skel = tri.skeleton();
        assert!(skel.is_valid());
        assert!(skel.is_orientable());
        assert!(skel.is_ideal());
        assert_eq!(skel.vertices().len(), 1);
        assert_eq!(skel.vertices()[0].link, VertexLinkType::Torus);
        assert_eq!(skel.edges().len(), 2);
        assert_eq!(skel.boundary_components().len(), 1);
        assert!(skel.boundary_components()[0].is_ideal());
        assert_eq!(skel.boundary_components()[0].euler_char, 0);
        assert!(!tri.is_closed());
    }

    #[test]
    fn twisted_bundle_detected_non_orientable() {
        let tri = Triangulation::twisted_sphere_bundle();
        let skel = tri.skeleton();
        assert!(!skel.is_orientable());
        assert!(!skel.components()[0].orientable);
        assert!(skel.is_valid());
    }

    #[test]
    fn invalid_edge_is_detected() {
        // Fold two facets of one tetrahedron onto each other so that edge
        // 01 is identified with itself in reverse: facet 2 -> facet 3 via
        // the permutation sending (0,1,3) to (1,0,2).
        let mut tri = Triangulation::new();
        tri.new_tetrahedron();
        tri.glue(0, 2, 0, 3, Perm4::raw([1, 0, 3, 2])).unwrap();
        let skel = tri.skeleton();
        assert!(!skel.edges_valid());
        assert!(!skel.is_valid());
    }

    #[test]
    fn disjoint_union_counts_components() {
        let mut tri = Triangulation::sphere();
        tri.insert_triangulation(&Triangulation::ball());
        let skel = tri.skeleton();
        assert_eq!(skel.components().len(), 2);
        assert_eq!(skel.components()[0].size, 2);
        assert_eq!(skel.components()[1].size, 1);
        assert_eq!(skel.tet_component(), &[0, 0, 1]);
    }
}
