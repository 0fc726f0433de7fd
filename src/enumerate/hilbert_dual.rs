//! Dual algorithm for Hilbert basis enumeration.
//!
//! Computes the minimal generating set (Hilbert basis) of the monoid of
//! non-negative integer solutions to a homogeneous linear system, one
//! hyperplane at a time: starting with the unit vectors, the basis for the
//! partially intersected cone is completed by repeatedly summing vectors
//! from opposite sides of the next hyperplane and discarding any sum that
//! an existing basis element reduces.
//!
//! A vector `v` reduces against `b` when `v - b` is non-negative and lies
//! on the correct side of the current hyperplane for the list being
//! filtered.  Admissibility constraints are enforced on every sum: a
//! fundamental vector's summands live in the same constraint face, so
//! inadmissible intermediates can never contribute.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::algebra::MatrixInt;
use crate::enumerate::bitmask::{Bitmask, ConstraintMasks};
use crate::enumerate::progress::{Cancelled, ProgressTracker};

#[derive(Clone, Debug, PartialEq, Eq)]
struct VecSpec {
    vector: Vec<BigInt>,
    support: Bitmask,
    /// Dot product with the hyperplane currently being processed.
    dot: BigInt,
}

impl VecSpec {
    fn unit(pos: usize, dim: usize) -> VecSpec {
        let mut vector = vec![BigInt::zero(); dim];
        vector[pos] = BigInt::from(1);
        let mut support = Bitmask::new(dim);
        support.set(pos, true);
        VecSpec {
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

    fn sum(p: &VecSpec, n: &VecSpec) -> VecSpec {
        let vector: Vec<BigInt> = p
            .vector
            .iter()
            .zip(&n.vector)
            .map(|(a, b)| a + b)
            .collect();
        let support = p.support.union(&n.support);
        VecSpec {
            vector,
            support,
            dot: &p.dot + &n.dot,
        }
    }

    /// Does `self - other` stay non-negative in every coordinate?
    fn dominates(&self, other: &VecSpec) -> bool {
        other.support.is_subset_of(&self.support)
            && self
                .vector
                .iter()
                .zip(&other.vector)
                .all(|(a, b)| a >= b)
    }
}

/// Can `vec` be reduced by some basis vector in `against`?
///
/// `list_sign` selects the side of the current hyperplane that the
/// difference must stay on: zero for the on-hyperplane list, positive or
/// negative for the respective open sides.
fn reduces(vec: &VecSpec, against: &[VecSpec], list_sign: i32) -> bool {
    against.iter().any(|b| {
        if !vec.dominates(b) {
            return false;
        }
        let diff = &vec.dot - &b.dot;
        match list_sign {
            0 => diff.is_zero(),
            s if s > 0 => diff >= BigInt::zero(),
            _ => diff <= BigInt::zero(),
        }
    })
}

/// Inserts `cand` into `list`, first removing any existing vectors that
/// the candidate itself reduces.
fn insert_reducing(list: &mut Vec<VecSpec>, cand: VecSpec, list_sign: i32) {
    list.retain(|w| {
        if !w.dominates(&cand) {
            return true;
        }
        let diff = &w.dot - &cand.dot;
        let reducible = match list_sign {
            0 => diff.is_zero(),
            s if s > 0 => diff >= BigInt::zero(),
            _ => diff <= BigInt::zero(),
        };
        !reducible
    });
    list.push(cand);
}

/// Enumerates the Hilbert basis of the admissible solutions of
/// `{ x >= 0 : subspace * x = 0 }`.
///
/// The returned vectors are the fundamental solutions: every admissible
/// non-negative integer solution is a sum of basis elements, and no basis
/// element is a non-trivial sum of admissible solutions.
pub fn hilbert_basis(
    subspace: &MatrixInt,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let rows = subspace.rows();
    let step = if rows == 0 { 0.0 } else { 1.0 / rows as f64 };

    let mut basis: Vec<VecSpec> = (0..dim).map(|i| VecSpec::unit(i, dim)).collect();

    for row in 0..rows {
        tracker.check()?;
        intersect_hyperplane(&mut basis, subspace, row, constraints, tracker)?;
        tracker.report_progress(step);
    }

    Ok(basis.into_iter().map(|v| v.vector).collect())
}

/// Replaces the Hilbert basis of a partially intersected cone with the
/// basis of its intersection with one further hyperplane.
fn intersect_hyperplane(
    basis: &mut Vec<VecSpec>,
    subspace: &MatrixInt,
    row: usize,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<(), Cancelled> {
    let mut zero = Vec::new();
    let mut pos = Vec::new();
    let mut neg = Vec::new();

    for mut v in basis.drain(..) {
        v.set_dot(subspace, row);
        if v.dot.is_zero() {
            zero.push(v);
        } else if v.dot > BigInt::zero() {
            pos.push(v);
        } else {
            neg.push(v);
        }
    }

    // Completion: keep summing across the hyperplane until nothing new
    // survives reduction.  Freshly added vectors must themselves be paired,
    // so we track how far each list has been processed.
    let mut pos_done = 0;
    let mut neg_done = 0;
    loop {
        tracker.check()?;
        let pos_len = pos.len();
        let neg_len = neg.len();
        if pos_done == pos_len && neg_done == neg_len {
            break;
        }

        let mut fresh = Vec::new();
        for (i, p) in pos.iter().enumerate() {
            for (j, n) in neg.iter().enumerate() {
                // Skip pairs already tried in a previous round.
                if i < pos_done && j < neg_done {
                    continue;
                }
                let cand = VecSpec::sum(p, n);
                if !constraints.admits(&cand.support) {
                    continue;
                }
                fresh.push(cand);
            }
        }
        pos_done = pos_len;
        neg_done = neg_len;

        for cand in fresh {
            let sign = if cand.dot.is_zero() {
                0
            } else if cand.dot > BigInt::zero() {
                1
            } else {
                -1
            };
            match sign {
                0 => {
                    if !reduces(&cand, &zero, 0) {
                        insert_reducing(&mut zero, cand, 0);
                    }
                }
                1 => {
                    if !reduces(&cand, &zero, 1) && !reduces(&cand, &pos, 1) {
                        insert_reducing(&mut pos, cand, 1);
                    }
                }
                _ => {
                    if !reduces(&cand, &zero, -1) && !reduces(&cand, &neg, -1) {
                        insert_reducing(&mut neg, cand, -1);
                    }
                }
            }
        }
    }

    // The on-hyperplane list is the new basis; strip any internal
    // redundancy that crept in across rounds.
    let mut minimal: Vec<VecSpec> = Vec::with_capacity(zero.len());
    for v in zero {
        if !reduces(&v, &minimal, 0) {
            insert_reducing(&mut minimal, v, 0);
        }
    }
    *basis = minimal;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::progress::NullProgress;

    fn sorted(mut v: Vec<Vec<BigInt>>) -> Vec<Vec<BigInt>> {
        v.sort();
        v
    }

    fn ints(v: &[i64]) -> Vec<BigInt> {
        v.iter().map(|x| BigInt::from(*x)).collect()
    }

    #[test]
    fn no_equations_gives_unit_vectors() {
        let m = MatrixInt::zero(0, 3);
        let basis = hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap();
        assert_eq!(basis.len(), 3);
    }

    #[test]
    fn balance_equation_keeps_paired_generator() {
        // x0 = x1: basis is (1,1,0) and (0,0,1).
        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        let basis = sorted(hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap());
        assert_eq!(basis, sorted(vec![ints(&[1, 1, 0]), ints(&[0, 0, 1])]));
    }

    #[test]
    fn unscaled_generators_appear() {
        // 2*x0 = x1: fundamental solution (1,2), not scaled down.
        let m = MatrixInt::from_rows(&[vec![2, -1]]);
        let basis = hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap();
        assert_eq!(basis, vec![ints(&[1, 2])]);
    }

    #[test]
    fn interior_fundamental_solutions_are_found() {
        // x0 + x1 = 2*x2: vertex rays (2,0,1) and (0,2,1), but (1,1,1)
        // is also fundamental.
        let m = MatrixInt::from_rows(&[vec![1, 1, -2]]);
        let basis = sorted(hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap());
        assert_eq!(
            basis,
            sorted(vec![ints(&[2, 0, 1]), ints(&[0, 2, 1]), ints(&[1, 1, 1])])
        );
    }

    #[test]
    fn constraints_restrict_the_basis() {
        // x0 + x1 = 2*x2, but x0 and x1 may not both be non-zero:
        // (1,1,1) straddles both faces and must disappear.
        let m = MatrixInt::from_rows(&[vec![1, 1, -2]]);
        let cons = ConstraintMasks::new(3, &[vec![0, 1]]);
        let basis = sorted(hilbert_basis(&m, &cons, &NullProgress).unwrap());
        assert_eq!(basis, sorted(vec![ints(&[2, 0, 1]), ints(&[0, 2, 1])]));
    }
}
