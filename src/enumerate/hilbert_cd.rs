//! Contejean-Devie enumeration of fundamental solutions.
//!
//! A breadth-first completion procedure over integer vectors: starting
//! from the unit vectors, a partial solution `x` is grown by one unit in
//! coordinate `i` only when the defect `Mx` moves closer to zero, in the
//! sense that the inner product of `Mx` with column `i` of `M` is
//! negative.  Vectors whose defect reaches zero are fundamental solutions
//! unless an already-found solution dominates them.
//!
//! This is the slowest of the Hilbert algorithms and exists as a
//! reference implementation: it is easy to verify and useful for
//! cross-checking the dual and primal enumerations on small systems.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::algebra::MatrixInt;
use crate::core::collections::FastHashSet;
use crate::enumerate::bitmask::{Bitmask, ConstraintMasks};
use crate::enumerate::progress::{Cancelled, ProgressTracker};

/// Enumerates the Hilbert basis of the admissible solutions of
/// `{ x >= 0 : subspace * x = 0 }` by Contejean-Devie completion.
///
/// Produces the same set as the dual and primal algorithms.
pub fn hilbert_basis(
    subspace: &MatrixInt,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();
    let rows = subspace.rows();

    let mut solutions: Vec<(Vec<BigInt>, Bitmask)> = Vec::new();
    let mut frontier: Vec<(Vec<BigInt>, Vec<BigInt>, Bitmask)> = Vec::new();
    let mut visited: FastHashSet<Vec<BigInt>> = FastHashSet::default();

    for i in 0..dim {
        let mut x = vec![BigInt::zero(); dim];
        x[i] = BigInt::from(1);
        let defect = column(subspace, i);
        let mut support = Bitmask::new(dim);
        support.set(i, true);
        if visited.insert(x.clone()) {
            frontier.push((x, defect, support));
        }
    }

    while !frontier.is_empty() {
        tracker.check()?;

        let mut next = Vec::new();
        for (x, defect, support) in frontier {
            if defect.iter().all(|d| d.is_zero()) {
                if !dominated(&x, &support, &solutions) {
                    solutions.push((x, support));
                }
                continue;
            }
            for i in 0..dim {
                // Move only towards the kernel.
                let inner: BigInt = (0..rows)
                    .map(|r| &defect[r] * &subspace[(r, i)])
                    .sum();
                if inner >= BigInt::zero() {
                    continue;
                }
                let mut grown_support = support.clone();
                grown_support.set(i, true);
                if !constraints.admits(&grown_support) {
                    continue;
                }
                let mut grown = x.clone();
                grown[i] += 1;
                if dominated(&grown, &grown_support, &solutions) {
                    continue;
                }
                if !visited.insert(grown.clone()) {
                    continue;
                }
                let mut grown_defect = defect.clone();
                for (r, d) in grown_defect.iter_mut().enumerate() {
                    *d += &subspace[(r, i)];
                }
                next.push((grown, grown_defect, grown_support));
            }
        }
        frontier = next;
        tracker.report_progress(0.0);
    }

    // The search can emit a solution before a smaller one that dominates
    // it is reached, so minimalise at the end.
    let mut minimal: Vec<(Vec<BigInt>, Bitmask)> = Vec::new();
    for (x, support) in solutions {
        if !dominated(&x, &support, &minimal) {
            minimal.retain(|(other, other_support)| {
                !(support.is_subset_of(other_support)
                    && other.iter().zip(&x).all(|(a, b)| a >= b))
            });
            minimal.push((x, support));
        }
    }

    Ok(minimal.into_iter().map(|(x, _)| x).collect())
}

/// Is `x` componentwise at least some known solution?
fn dominated(x: &[BigInt], support: &Bitmask, solutions: &[(Vec<BigInt>, Bitmask)]) -> bool {
    solutions.iter().any(|(s, s_support)| {
        s_support.is_subset_of(support) && x.iter().zip(s).all(|(a, b)| a >= b)
    })
}

/// Column `i` of the matrix as a vector.
fn column(m: &MatrixInt, i: usize) -> Vec<BigInt> {
    (0..m.rows()).map(|r| m[(r, i)].clone()).collect()
}
