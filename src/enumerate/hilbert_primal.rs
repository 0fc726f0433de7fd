//! Primal algorithm for Hilbert basis enumeration.
//!
//! Decomposes the admissible region into its maximal constraint faces and
//! computes an ordinary (unconstrained) Hilbert basis inside each face.
//! Every admissible solution and both summands of any decomposition live
//! in a common face, so the union of the per-face bases, with duplicates
//! removed, is exactly the fundamental solution set of the whole region.
//!
//! The face count is the product of the constraint group sizes, so this
//! pays off when each face collapses to a much smaller system; the dual
//! algorithm is preferable when the constraint structure is loose.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::algebra::MatrixInt;
use crate::core::collections::FastHashSet;
use crate::enumerate::bitmask::ConstraintMasks;
use crate::enumerate::hilbert_dual;
use crate::enumerate::progress::{Cancelled, ProgressTracker};

/// Enumerates the Hilbert basis of the admissible solutions of
/// `{ x >= 0 : subspace * x = 0 }` by maximal-face decomposition.
///
/// Produces the same set as [`hilbert_dual::hilbert_basis`], in a
/// different order of work.
pub fn hilbert_basis(
    subspace: &MatrixInt,
    constraints: &ConstraintMasks,
    tracker: &dyn ProgressTracker,
) -> Result<Vec<Vec<BigInt>>, Cancelled> {
    let dim = subspace.cols();

    let faces = constraints.maximal_faces(dim);
    let step = 1.0 / faces.len() as f64;

    let mut seen: FastHashSet<Vec<BigInt>> = FastHashSet::default();
    let mut out = Vec::new();

    for face in faces {
        tracker.check()?;

        let cols: Vec<usize> = face.ones().collect();
        let restricted = restrict_columns(subspace, &cols);
        for compact in
            hilbert_dual::hilbert_basis(&restricted, &ConstraintMasks::none(), tracker)?
        {
            let mut full = vec![BigInt::zero(); dim];
            for (value, &col) in compact.into_iter().zip(&cols) {
                full[col] = value;
            }
            if seen.insert(full.clone()) {
                out.push(full);
            }
        }
        tracker.report_progress(step);
    }

    Ok(out)
}

/// Copies the chosen columns of `m` into a narrower matrix.
fn restrict_columns(m: &MatrixInt, cols: &[usize]) -> MatrixInt {
    let mut out = MatrixInt::zero(m.rows(), cols.len());
    for r in 0..m.rows() {
        for (c, &col) in cols.iter().enumerate() {
            out[(r, c)] = m[(r, col)].clone();
        }
    }
    out
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
    fn agrees_with_dual_without_constraints() {
        let m = MatrixInt::from_rows(&[vec![1, 1, -2]]);
        let primal = sorted(hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap());
        let dual = sorted(
            hilbert_dual::hilbert_basis(&m, &ConstraintMasks::none(), &NullProgress).unwrap(),
        );
        assert_eq!(primal, dual);
    }

    #[test]
    fn agrees_with_dual_under_constraints() {
        let m = MatrixInt::from_rows(&[vec![1, 1, -2]]);
        let cons = ConstraintMasks::new(3, &[vec![0, 1]]);
        let primal = sorted(hilbert_basis(&m, &cons, &NullProgress).unwrap());
        let dual = sorted(hilbert_dual::hilbert_basis(&m, &cons, &NullProgress).unwrap());
        assert_eq!(primal, dual);
        assert_eq!(primal.len(), 2);
    }

    #[test]
    fn face_decomposition_counts() {
        let cons = ConstraintMasks::new(6, &[vec![0, 1, 2], vec![3, 4, 5]]);
        let faces = cons.maximal_faces(6);
        assert_eq!(faces.len(), 9);
        for face in &faces {
            assert_eq!(face.count_ones(), 2);
            assert!(cons.admits(face));
        }
    }
}
