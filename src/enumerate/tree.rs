//! Type-tree enumeration of vertex rays.
//!
//! Walks the tree of *type choices*: each constraint group (one per
//! tetrahedron) contributes a branch for every coordinate that may be the
//! group's non-zero representative.  A full assignment selects a maximal
//! admissible face of the orthant, and the vertex rays supported on that
//! face are exactly the extremal rays of the cone restricted to it, which
//! the double description core computes without further constraint
//! handling.
//!
//! Subtrees are pruned when the columns fixed to zero so far already
//! force the whole system to zero.  All exact arithmetic; no floating
//! point relaxation is used.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::algebra::MatrixInt;
use crate::core::collections::FastHashSet;
use crate::enumerate::bitmask::{Bitmask, ConstraintMasks};
use crate::enumerate::dd;
use crate::enumerate::progress::{Cancelled, ProgressTracker};

/// Enumerates the admissible extremal rays of
/// `{ x >= 0 : subspace * x = 0 }` by traversing the tree of type
/// choices.
///
/// Produces the same set as [`dd::extremal_rays`] with the same
/// constraints, as primitive integer vectors.
pub fn vertex_rays(
    subspace: &MatrixInt,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let groups = constraints.masks();

    let mut base = Bitmask::new(dim);
    for i in 0..dim {
        base.set(i, true);
    }
    for group in groups {
        for i in group.ones() {
            base.set(i, false);
        }
    }

    let mut seen: FastHashSet<Vec<BigInt>> = FastHashSet::default();
    let mut out = Vec::new();
    let leaves: f64 = groups
        .iter()
        .map(|g| g.count_ones() as f64)
        .product();
    let step = 1.0 / leaves.max(1.0);

    descend(
        subspace, groups, 0, base, constraints, tracker, step, &mut seen, &mut out,
    )?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn descend(
    subspace: &MatrixInt,
    groups: &[Bitmask],
    depth: usize,
    face: Bitmask,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
    step: f64,
    seen: &mut FastHashSet<Vec<BigInt>>,
    out: &mut Vec<Vec<BigInt>>,
) -> Result<(), Cancelled> {
    tracker.check()?;

    if depth == groups.len() {
        for ray in dd::extremal_rays_in_face(subspace, &face, tracker)? {
            if constraints_admit(constraints, &ray) && seen.insert(ray.clone()) {
                out.push(ray);
            }
        }
        tracker.report_progress(step);
        return Ok(());
    }

    for col in groups[depth].ones() {
        let mut chosen = face.clone();
        chosen.set(col, true);
        descend(
            subspace,
            groups,
            depth + 1,
            chosen,
            constraints,
            tracker,
            step,
            seen,
            out,
        )?;
    }
    Ok(())
}

fn constraints_admit(constraints: &ConstraintMasks, ray: &[BigInt]) -> bool {
    let mut support = Bitmask::new(ray.len());
    for (i, x) in ray.iter().enumerate() {
        if !x.is_zero() {
            support.set(i, true);
        }
    }
    constraints.admits(&support)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::progress::NullProgress;

    fn sorted(mut v: Vec<Vec<BigInt>>) -> Vec<Vec<BigInt>> {
        v.sort();
        v
    }

    #[test]
    fn agrees_with_double_description() {
        let m = MatrixInt::from_rows(&[vec![1, 1, -2, 0], vec![0, 1, 0, -1]]);
        let cons = ConstraintMasks::new(4, &[vec![0, 1]]);
        let tree = sorted(vertex_rays(&m, &cons, &NullProgress).unwrap());
        let direct = sorted(dd::extremal_rays(&m, &cons, &NullProgress).unwrap());
        assert_eq!(tree, direct);
    }

    #[test]
    fn no_groups_degenerates_to_plain_enumeration() {
        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        let rays = sorted(vertex_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap());
        let direct = sorted(
            dd::extremal_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap(),
        );
        assert_eq!(rays, direct);
    }
}
