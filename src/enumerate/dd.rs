//! Double description enumeration of extremal rays.
//!
//! # Key Features
//!
//! - [`extremal_rays`]: all extremal rays of the intersection of the
//!   non-negative orthant with a linear subspace, filtered by
//!   admissibility constraints.
//! - [`extremal_rays_in_face`]: the same computation restricted to a face
//!   of the orthant, used by the type-tree and primal Hilbert drivers.
//!
//! # Algorithm
//!
//! The classical double description method: start from the extremal rays
//! of the orthant (the unit vectors) and intersect with one hyperplane at
//! a time.  At each step the rays strictly inside the new hyperplane are
//! kept, and each adjacent positive/negative pair is combined into a new
//! ray on the hyperplane.  Adjacency uses the combinatorial test: a pair
//! is adjacent precisely when no third ray's support is contained in the
//! union of their supports.
//!
//! Admissibility constraints are enforced eagerly: a pair whose combined
//! support would break a constraint can never lead to an admissible
//! extremal ray, so it is dropped before the combination is formed.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;

use crate::algebra::MatrixInt;
use crate::enumerate::bitmask::{Bitmask, ConstraintMasks};
use crate::enumerate::progress::{Cancelled, ProgressTracker};

/// A ray paired with its support mask.
#[derive(Clone, Debug)]
struct RaySpec {
    vector: Vec<BigInt>,
    support: Bitmask,
    /// Dot product with the hyperplane currently being processed.
    dot: BigInt,
}

impl RaySpec {
    fn unit(pos: usize, dim: usize) -> RaySpec {
        let mut vector = vec![BigInt::zero(); dim];
        vector[pos] = BigInt::from(1);
        let mut support = Bitmask::new(dim);
        support.set(pos, true);
        RaySpec {
            vector,
            support,
            dot: BigInt::zero(),
        }
    }

    fn set_dot(&mut self, subspace: &MatrixInt, row: usize) {
        let mut dot = BigInt::zero();
        for i in self.support.ones() {
            dot += &subspace[(row, i)] * &self.vector[i];
        }
        self.dot = dot;
    }

    /// Combines a strictly positive and a strictly negative ray into a ray
    /// on the current hyperplane, scaled down to primitive form.
    fn combine(pos: &RaySpec, neg: &RaySpec, dim: usize) -> RaySpec {
        let a = -&neg.dot;
        let b = &pos.dot;
        let mut vector = Vec::with_capacity(dim);
        for i in 0..dim {
            vector.push(&a * &pos.vector[i] + b * &neg.vector[i]);
        }
        scale_down(&mut vector);
        let mut support = Bitmask::new(dim);
        for (i, x) in vector.iter().enumerate() {
            if !x.is_zero() {
                support.set(i, true);
            }
        }
        RaySpec {
            vector,
            support,
            dot: BigInt::zero(),
        }
    }
}

/// Divides the vector through by the gcd of its entries.
pub(crate) fn scale_down(vector: &mut [BigInt]) {
    let mut g = BigInt::zero();
    for x in vector.iter() {
        if !x.is_zero() {
            g = g.gcd(x);
            if g == BigInt::from(1) {
                return;
            }
        }
    }
    if g.is_zero() || g == BigInt::from(1) {
        return;
    }
    for x in vector.iter_mut() {
        *x /= &g;
    }
}

/// Enumerates the extremal rays of `{ x >= 0 : subspace * x = 0 }` that
/// satisfy the given admissibility constraints.
///
/// Rays are returned in primitive integer form (coordinates with gcd 1).
/// Progress is reported per hyperplane; cancellation is polled between
/// hyperplanes.
pub fn extremal_rays(
    subspace: &MatrixInt,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let seed: Vec<RaySpec> = (0..dim).map(|i| RaySpec::unit(i, dim)).collect();
    run(subspace, seed, Some(constraints), tracker)
}

/// Enumerates the extremal rays of the cone restricted to a face of the
/// orthant: only the coordinates allowed by `face` may be non-zero.
///
/// No admissibility constraints are applied; callers choose faces that
/// are admissible by construction.
pub fn extremal_rays_in_face(
    subspace: &MatrixInt,
    face: &Bitmask,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let seed: Vec<RaySpec> = face.ones().map(|i| RaySpec::unit(i, dim)).collect();
    run(subspace, seed, None, tracker)
}

fn run(
    subspace: &MatrixInt,
    mut rays: Vec<RaySpec>,
    constraints: Option<&ConstraintMasks>,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let rows = subspace.rows();
    let step = if rows == 0 { 0.0 } else { 1.0 / rows as f64 };

    for row in 0..rows {
        tracker.check()?;

        for ray in rays.iter_mut() {
            ray.set_dot(subspace, row);
        }

        let mut zero = Vec::new();
        let mut pos = Vec::new();
        let mut neg = Vec::new();
        for ray in rays.drain(..) {
            match ray.dot.sign() {
                num_bigint::Sign::NoSign => zero.push(ray),
                num_bigint::Sign::Plus => pos.push(ray),
                num_bigint::Sign::Minus => neg.push(ray),
            }
        }

        let mut next = zero;
        for p in &pos {
            for n in &neg {
                let union = p.support.union(&n.support);
                if let Some(cons) = constraints {
                    if !cons.admits(&union) {
                        continue;
                    }
                }
                if !adjacent(p, n, &union, &next, &pos, &neg) {
                    continue;
                }
                next.push(RaySpec::combine(p, n, dim));
            }
        }

        rays = next;
        tracker.report_progress(step);
    }

    let mut out = Vec::with_capacity(rays.len());
    for ray in rays {
        if constraints.map_or(true, |c| c.admits(&ray.support)) {
            out.push(ray.vector);
        }
    }
    Ok(out)
}

/// The combinatorial adjacency test: `p` and `n` span a 2-face precisely
/// when no other current ray's support fits inside their combined support.
fn adjacent(
    p: &RaySpec,
    n: &RaySpec,
    union: &Bitmask,
    zero: &[RaySpec],
    pos: &[RaySpec],
    neg: &[RaySpec],
) -> bool {
    let blocks = |w: &RaySpec| w.support.is_subset_of(union);
    if zero.iter().any(blocks) {
        return false;
    }
    if pos
        .iter()
        .any(|w| !std::ptr::eq(w, p) && blocks(w))
    {
        return false;
    }
    if neg
        .iter()
        .any(|w| !std::ptr::eq(w, n) && blocks(w))
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::progress::NullProgress;

    fn sorted(mut rays: Vec<Vec<BigInt>>) -> Vec<Vec<BigInt>> {
        rays.sort();
        rays
    }

    #[test]
    fn orthant_with_no_hyperplanes_keeps_unit_rays() {
        let m = MatrixInt::zero(0, 3);
        let rays = extremal_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap();
        assert_eq!(rays.len(), 3);
    }

    #[test]
    fn single_balance_equation() {
        // x0 = x1 in the plane: extremal rays (1,1,0) and (0,0,1).
        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        let rays = sorted(
            extremal_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap(),
        );
        let expect = sorted(vec![
            vec![BigInt::from(1), BigInt::from(1), BigInt::zero()],
            vec![BigInt::zero(), BigInt::zero(), BigInt::from(1)],
        ]);
        assert_eq!(rays, expect);
    }

    #[test]
    fn two_equations_cut_to_a_line() {
        // x0 = x1 and x1 = x2: only the diagonal ray survives.
        let m = MatrixInt::from_rows(&[vec![1, -1, 0], vec![0, 1, -1]]);
        let rays = extremal_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap();
        assert_eq!(rays.len(), 1);
        assert_eq!(rays[0], vec![BigInt::from(1); 3]);
    }

    #[test]
    fn constraints_discard_incompatible_rays() {
        // x0 = x1 forces {0,1} together, which the constraint forbids.
        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        let cons = ConstraintMasks::new(3, &[vec![0, 1]]);
        let rays = extremal_rays(&m, &cons, &NullProgress).unwrap();
        assert_eq!(rays.len(), 1);
        assert_eq!(
            rays[0],
            vec![BigInt::zero(), BigInt::zero(), BigInt::from(1)]
        );
    }

    #[test]
    fn rays_are_primitive() {
        // 2*x0 = 4*x1: the ray should come out as (2,1), scaled down.
        let m = MatrixInt::from_rows(&[vec![2, -4]]);
        let rays = extremal_rays(&m, &ConstraintMasks::none(), &NullProgress).unwrap();
        assert_eq!(rays.len(), 1);
        assert_eq!(rays[0], vec![BigInt::from(2), BigInt::from(1)]);
    }

    #[test]
    fn face_restriction_limits_support() {
        let m = MatrixInt::zero(0, 4);
        let mut face = Bitmask::new(4);
        face.set(1, true);
        face.set(3, true);
        let rays = extremal_rays_in_face(&m, &face, &NullProgress).unwrap();
        assert_eq!(rays.len(), 2);
        for ray in &rays {
            assert!(ray[0].is_zero() && ray[2].is_zero());
        }
    }

    #[test]
    fn cancellation_interrupts_enumeration() {
        use crate::enumerate::progress::ProgressMeter;
        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        let meter = ProgressMeter::new();
        meter.cancel();
        let err = extremal_rays(&m, &ConstraintMasks::none(), &meter).unwrap_err();
        assert_eq!(err, Cancelled);
    }
}
