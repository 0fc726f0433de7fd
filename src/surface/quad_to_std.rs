//! Converting reduced vertex solutions into standard vertex solutions.
//!
//! Enumerating in a reduced (triangle-free) coordinate system is far
//! faster, but the canonical extensions of the reduced vertex surfaces
//! are not yet the standard vertex surfaces: the vertex links, and
//! combinations involving them, are missing.  This module rebuilds the
//! full standard solution set by an incremental double description pass
//! over one vertex link at a time.
//!
//! For each vertex of the triangulation, the negated link of that vertex
//! is temporarily admitted as a ray, the inequalities `t >= 0` for the
//! link's triangle coordinates are intersected back in one at a time, and
//! finally the (positive) link itself is restored.  Every ray is kept
//! reduced modulo the links not yet processed, so coordinates stay small.

use num_bigint::BigInt;
use num_traits::Zero;
use std::sync::Arc;

use crate::algebra::LargeInt;
use crate::core::triangulation::Triangulation;
use crate::enumerate::bitmask::{Bitmask, ConstraintMasks};
use crate::enumerate::dd::scale_down;
use crate::enumerate::progress::{Cancelled, ProgressTracker};
use crate::surface::coords::{CoordSystem, DiscEncoding};
use crate::surface::matching::admissibility_groups;
use crate::surface::surface::NormalSurface;

/// A ray in standard coordinate space, with its support cached.  Unlike
/// enumeration proper, coordinates may be negative while a negated vertex
/// link is still being cancelled out.
#[derive(Clone)]
struct RaySpec {
    vector: Vec<BigInt>,
    support: Bitmask,
}

impl RaySpec {
    fn from_vector(vector: Vec<BigInt>) -> RaySpec {
        let mut support = Bitmask::new(vector.len());
        for (i, x) in vector.iter().enumerate() {
            if !x.is_zero() {
                support.set(i, true);
            }
        }
        RaySpec { vector, support }
    }

    /// The negative of the given vertex link.
    fn negated(link: &RaySpec) -> RaySpec {
        let vector = link.vector.iter().map(|x| -x).collect();
        RaySpec {
            vector,
            support: link.support.clone(),
        }
    }

    /// Intersects the plane through `pos` and `neg` with the hyperplane
    /// on which the `coord`th coordinate vanishes.
    fn combine(pos: &RaySpec, neg: &RaySpec, coord: usize) -> RaySpec {
        let pos_diff = &pos.vector[coord];
        let neg_diff = &neg.vector[coord];
        let mut vector: Vec<BigInt> = pos
            .vector
            .iter()
            .zip(&neg.vector)
            .map(|(p, n)| n * pos_diff - p * neg_diff)
            .collect();
        scale_down(&mut vector);
        RaySpec::from_vector(vector)
    }

    fn sign(&self, coord: usize) -> num_bigint::Sign {
        self.vector[coord].sign()
    }

    /// Does this ray vanish everywhere that `pos` and `neg` both vanish,
    /// apart from the ignored coordinates?
    fn covers(&self, union: &Bitmask) -> bool {
        self.support.is_subset_of(union)
    }

    /// Subtracts as many copies of the given link as possible without
    /// sending any of its triangle coordinates negative.
    fn reduce(&mut self, link: &RaySpec) {
        if !link.support.is_subset_of(&self.support) {
            return;
        }
        let mut max: Option<&BigInt> = None;
        for i in link.support.ones() {
            match max {
                Some(m) if *m <= self.vector[i] => {}
                _ => max = Some(&self.vector[i]),
            }
        }
        let Some(max) = max.cloned() else {
            return;
        };
        for i in link.support.ones() {
            self.vector[i] -= &max;
            if self.vector[i].is_zero() {
                self.support.set(i, false);
            }
        }
    }

    fn scale_down(&mut self) {
        scale_down(&mut self.vector);
    }
}

/// Rebuilds the standard vertex solution set from the reduced one.
///
/// `system` names the target standard coordinate system and the reduced
/// surfaces must be canonical extensions of vertex solutions in the
/// corresponding reduced system.  The triangulation must be valid and
/// non-ideal, so that every input surface is compact.
///
/// # Errors
///
/// Returns [`Cancelled`] if the tracker requests cancellation.
pub(crate) fn build_standard_from_reduced(
    tri: &Arc<Triangulation>,
    system: CoordSystem,
    reduced: &[NormalSurface],
    tracker: &dyn ProgressTracker,
) -> Result<Vec<NormalSurface>, Cancelled> {
    let block = system.block_size();
    let std_len = system.vector_len(tri.size());
    let enc = DiscEncoding::for_system(system);
    if std_len == 0 {
        return Ok(Vec::new());
    }

    let constraints = ConstraintMasks::new(std_len, &admissibility_groups(tri.size(), system));
    let skeleton = tri.skeleton();
    let n_links = skeleton.vertices().len();

    let links: Vec<RaySpec> = (0..n_links)
        .map(|v| {
            let mut vector = vec![BigInt::zero(); std_len];
            for emb in &skeleton.vertices()[v].embeddings {
                vector[block * emb.tet + usize::from(emb.vertex)] = BigInt::from(1);
            }
            RaySpec::from_vector(vector)
        })
        .collect();

    let mut working: Vec<RaySpec> = reduced
        .iter()
        .map(|s| {
            let vector = s
                .vector()
                .iter()
                .map(|x| {
                    x.finite()
                        .expect("reduced solutions in a non-ideal triangulation are compact")
                        .clone()
                })
                .collect();
            RaySpec::from_vector(vector)
        })
        .collect();

    // Triangle coordinates are unconstrained until their inequality has
    // been processed; this mask flags the ones still to come.
    let mut ignore = Bitmask::new(std_len);
    for i in 0..std_len {
        if i % block < 4 {
            ignore.set(i, true);
        }
    }

    let total: usize = skeleton.vertices().iter().map(|v| v.embeddings.len()).sum();
    let step = if total == 0 { 0.0 } else { 1.0 / total as f64 };

    for vtx in 0..n_links {
        working.push(RaySpec::negated(&links[vtx]));

        for emb in &skeleton.vertices()[vtx].embeddings {
            tracker.check()?;
            let tcoord = block * emb.tet + usize::from(emb.vertex);

            // Intersect with the half-space vector[tcoord] >= 0.
            let mut zero = Vec::new();
            let mut pos = Vec::new();
            let mut neg = Vec::new();
            for ray in working.drain(..) {
                match ray.sign(tcoord) {
                    num_bigint::Sign::NoSign => zero.push(ray),
                    num_bigint::Sign::Plus => pos.push(ray),
                    num_bigint::Sign::Minus => neg.push(ray),
                }
            }

            let mut combined = Vec::new();
            for p in &pos {
                tracker.check()?;
                for n in &neg {
                    let union = p.support.union(&n.support);
                    if !constraints.admits(&union) {
                        continue;
                    }

                    let unless = union.union(&ignore);
                    let blocks = |r: &RaySpec| r.covers(&unless);
                    if zero.iter().any(&blocks)
                        || pos.iter().any(|r| !std::ptr::eq(r, p) && blocks(r))
                        || neg.iter().any(|r| !std::ptr::eq(r, n) && blocks(r))
                    {
                        continue;
                    }

                    combined.push(RaySpec::combine(p, n, tcoord));
                }
            }

            working = zero;
            working.append(&mut pos);
            working.append(&mut combined);

            ignore.set(tcoord, false);
            tracker.report_progress(step);
        }

        // Reinstate the link itself, and keep every ray reduced modulo
        // the links that have not been cancelled yet.
        working.push(links[vtx].clone());
        for ray in &mut working {
            for link in &links[vtx + 1..] {
                ray.reduce(link);
            }
            ray.scale_down();
        }
    }

    Ok(working
        .into_iter()
        .map(|ray| {
            let vector = ray.vector.into_iter().map(LargeInt::from).collect();
            NormalSurface::from_encoded(Arc::clone(tri), enc, vector)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::dd::extremal_rays;
    use crate::enumerate::progress::NullProgress;
    use crate::surface::matching::matching_equations;

    /// Enumerates vertex surfaces directly by double description in the
    /// given system, returning canonical standard-length vectors.
    fn direct_vertex_vectors(
        tri: &Arc<Triangulation>,
        system: CoordSystem,
    ) -> Vec<Vec<BigInt>> {
        let m = matching_equations(tri, system).unwrap();
        let constraints = ConstraintMasks::new(
            system.vector_len(tri.size()),
            &admissibility_groups(tri.size(), system),
        );
        extremal_rays(&m, &constraints, &NullProgress).unwrap()
    }

    fn standard_vectors(surfaces: &[NormalSurface]) -> Vec<Vec<BigInt>> {
        let mut out: Vec<Vec<BigInt>> = surfaces
            .iter()
            .map(|s| {
                s.vector()
                    .iter()
                    .map(|x| x.finite().unwrap().clone())
                    .collect()
            })
            .collect();
        out.sort();
        out
    }

    fn conversion_matches_direct_enumeration(tri: &Arc<Triangulation>) {
        let reduced: Vec<NormalSurface> = direct_vertex_vectors(tri, CoordSystem::Quad)
            .into_iter()
            .map(|v| NormalSurface::from_vector(Arc::clone(tri), CoordSystem::Quad, v).unwrap())
            .collect();

        let converted = build_standard_from_reduced(
            tri,
            CoordSystem::Standard,
            &reduced,
            &NullProgress,
        )
        .unwrap();

        let mut direct = direct_vertex_vectors(tri, CoordSystem::Standard);
        direct.sort();
        assert_eq!(standard_vectors(&converted), direct);
    }

    #[test]
    fn conversion_agrees_with_direct_enumeration_on_the_sphere() {
        let tri = Arc::new(Triangulation::sphere());
        conversion_matches_direct_enumeration(&tri);
    }

    #[test]
    fn conversion_agrees_with_direct_enumeration_on_a_layered_loop() {
        let tri = Arc::new(Triangulation::layered_loop(3, false));
        conversion_matches_direct_enumeration(&tri);
    }

    #[test]
    fn conversion_of_an_empty_reduced_list_yields_the_vertex_links() {
        let tri = Arc::new(Triangulation::ball());
        let converted =
            build_standard_from_reduced(&tri, CoordSystem::Standard, &[], &NullProgress)
                .unwrap();
        assert!(!converted.is_empty());
        assert!(converted.iter().all(|s| s.is_vertex_linking()));
    }

    #[test]
    fn conversion_can_be_cancelled() {
        let tri = Arc::new(Triangulation::sphere());
        let meter = crate::enumerate::progress::ProgressMeter::new();
        meter.cancel();
        let result = build_standard_from_reduced(&tri, CoordSystem::Standard, &[], &meter);
        assert_eq!(result.unwrap_err(), Cancelled);
    }
}
