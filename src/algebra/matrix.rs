//! Integer Matrices
//!
//! Dense matrices over `num_bigint::BigInt`, sized for matching equations
//! and homology presentations (tens to a few thousand entries, exact
//! arithmetic throughout). Provides the elementary row and column
//! operations and a Smith normal form reduction; everything heavier lives
//! with its consumer.

use std::fmt;
use std::ops::{Index, IndexMut};

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

/// A dense matrix of arbitrary-precision integers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixInt {
    rows: usize,
    cols: usize,
    entries: Vec<BigInt>,
}

impl MatrixInt {
    /// A zero matrix of the given dimensions.
    #[must_use]
    pub fn zero(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![BigInt::zero(); rows * cols],
        }
    }

    /// Builds a matrix from integer rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows have unequal lengths.
    #[must_use]
    pub fn from_rows(rows: &[Vec<i64>]) -> Self {
        let n_cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == n_cols),
            "all rows must have equal length"
        );
        Self {
            rows: rows.len(),
            cols: n_cols,
            entries: rows
                .iter()
                .flat_map(|r| r.iter().map(|&v| BigInt::from(v)))
                .collect(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One row as a slice.
    #[must_use]
    pub fn row(&self, r: usize) -> &[BigInt] {
        &self.entries[r * self.cols..(r + 1) * self.cols]
    }

    /// Whether every entry is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(Zero::is_zero)
    }

    /// Swaps two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.entries.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    /// Swaps two columns.
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for r in 0..self.rows {
            self.entries.swap(r * self.cols + a, r * self.cols + b);
        }
    }

    /// Adds `factor` times row `src` to row `dest`.
    pub fn add_row_multiple(&mut self, src: usize, dest: usize, factor: &BigInt) {
        for c in 0..self.cols {
            let delta = &self.entries[src * self.cols + c] * factor;
            self.entries[dest * self.cols + c] += delta;
        }
    }

    /// Adds `factor` times column `src` to column `dest`.
    pub fn add_col_multiple(&mut self, src: usize, dest: usize, factor: &BigInt) {
        for r in 0..self.rows {
            let delta = &self.entries[r * self.cols + src] * factor;
            self.entries[r * self.cols + dest] += delta;
        }
    }

    /// Negates a row.
    pub fn negate_row(&mut self, r: usize) {
        for c in 0..self.cols {
            let v = -&self.entries[r * self.cols + c];
            self.entries[r * self.cols + c] = v;
        }
    }

    /// Reduces this matrix to Smith normal form in place, returning the
    /// nonzero diagonal entries `d₁ | d₂ | …` (all positive).
    pub fn smith_normal_form(&mut self) -> Vec<BigInt> {
        let mut invariants = Vec::new();
        let limit = self.rows.min(self.cols);
        let mut k = 0;
        while k < limit {
            // Find a nonzero pivot at or below/right of (k, k).
            let Some((pr, pc)) = self.find_nonzero(k) else {
                break;
            };
            self.swap_rows(k, pr);
            self.swap_cols(k, pc);
            loop {
                // Clear column k below the pivot.
                let mut dirty = false;
                for r in (k + 1)..self.rows {
                    if !self[(r, k)].is_zero() {
                        let q = &self[(r, k)] / &self[(k, k)];
                        let neg_q = -q;
                        self.add_row_multiple(k, r, &neg_q);
                        if !self[(r, k)].is_zero() {
                            // Remainder left over: swap to shrink the pivot.
                            self.swap_rows(k, r);
                            dirty = true;
                        }
                    }
                }
                for c in (k + 1)..self.cols {
                    if !self[(k, c)].is_zero() {
                        let q = &self[(k, c)] / &self[(k, k)];
                        let neg_q = -q;
                        self.add_col_multiple(k, c, &neg_q);
                        if !self[(k, c)].is_zero() {
                            self.swap_cols(k, c);
                            dirty = true;
                        }
                    }
                }
                if !dirty {
                    break;
                }
            }
            // Enforce divisibility of the remaining block by the pivot.
            let mut restart = false;
            'divisibility: for r in (k + 1)..self.rows {
                for c in (k + 1)..self.cols {
                    if !(&self[(r, c)] % &self[(k, k)]).is_zero() {
                        let one = BigInt::from(1);
                        self.add_row_multiple(r, k, &one);
                        restart = true;
                        break 'divisibility;
                    }
                }
            }
            if restart {
                continue;
            }
            if self[(k, k)].is_negative() {
                self.negate_row(k);
            }
            invariants.push(self[(k, k)].clone());
            k += 1;
        }
        invariants
    }

    fn find_nonzero(&self, k: usize) -> Option<(usize, usize)> {
        for r in k..self.rows {
            for c in k..self.cols {
                if !self[(r, c)].is_zero() {
                    return Some((r, c));
                }
            }
        }
        None
    }
}

impl Index<(usize, usize)> for MatrixInt {
    type Output = BigInt;
    fn index(&self, (r, c): (usize, usize)) -> &BigInt {
        &self.entries[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for MatrixInt {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut BigInt {
        &mut self.entries[r * self.cols + c]
    }
}

impl fmt::Display for MatrixInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                if c > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", self[(r, c)])?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
