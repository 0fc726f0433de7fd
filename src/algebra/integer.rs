//! Arbitrary-Precision Integers with Infinity
//!
//! Normal surface coordinates can be genuinely infinite: a spun surface
//! meets some edges in infinitely many points. [`LargeInt`] extends
//! `num_bigint::BigInt` with a single positive infinity that absorbs all
//! arithmetic, so coordinate vectors and edge weights can carry "spun"
//! entries without a parallel bookkeeping channel.
//!
//! Infinity compares greater than every finite value, and two infinities
//! compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

/// An arbitrary-precision integer, or positive infinity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LargeInt {
    /// A finite integer.
    Finite(BigInt),
    /// Positive infinity. Absorbs all arithmetic.
    Infinity,
}

impl LargeInt {
    /// Zero.
    #[must_use]
    pub fn zero() -> Self {
        LargeInt::Finite(BigInt::zero())
    }

    /// One.
    #[must_use]
    pub fn one() -> Self {
        LargeInt::Finite(BigInt::one())
    }

    /// Whether this is the infinite value.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        matches!(self, LargeInt::Infinity)
    }

    /// Whether this is finite zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, LargeInt::Finite(v) if v.is_zero())
    }

    /// The finite value, if this is finite.
    #[must_use]
    pub fn finite(&self) -> Option<&BigInt> {
        match self {
            LargeInt::Finite(v) => Some(v),
            LargeInt::Infinity => None,
        }
    }

    /// Whether this is finite and strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        matches!(self, LargeInt::Finite(v) if v.is_negative())
    }
}

impl From<BigInt> for LargeInt {
    fn from(v: BigInt) -> Self {
        LargeInt::Finite(v)
    }
}

impl From<i64> for LargeInt {
    fn from(v: i64) -> Self {
        LargeInt::Finite(BigInt::from(v))
    }
}

impl Default for LargeInt {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialOrd for LargeInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LargeInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LargeInt::Infinity, LargeInt::Infinity) => Ordering::Equal,
            (LargeInt::Infinity, LargeInt::Finite(_)) => Ordering::Greater,
            (LargeInt::Finite(_), LargeInt::Infinity) => Ordering::Less,
            (LargeInt::Finite(a), LargeInt::Finite(b)) => a.cmp(b),
        }
    }
}

macro_rules! absorb_binop {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident) => {
        impl $trait for LargeInt {
            type Output = LargeInt;
            fn $method(self, rhs: LargeInt) -> LargeInt {
                match (self, rhs) {
                    (LargeInt::Finite(a), LargeInt::Finite(b)) => {
                        LargeInt::Finite($trait::$method(a, b))
                    }
                    _ => LargeInt::Infinity,
                }
            }
        }

        impl $assign_trait for LargeInt {
            fn $assign_method(&mut self, rhs: LargeInt) {
                let lhs = std::mem::replace(self, LargeInt::Infinity);
                *self = $trait::$method(lhs, rhs);
            }
        }
    };
}

absorb_binop!(Add, add, AddAssign, add_assign);
absorb_binop!(Sub, sub, SubAssign, sub_assign);
absorb_binop!(Mul, mul, MulAssign, mul_assign);

impl fmt::Display for LargeInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LargeInt::Finite(v) => write!(f, "{v}"),
            LargeInt::Infinity => f.write_str("inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_absorbs_arithmetic() {
        let inf = LargeInt::Infinity;
        let two = LargeInt::from(2);
        assert_eq!(inf.clone() + two.clone(), LargeInt::Infinity);
        assert_eq!(two.clone() * inf.clone(), LargeInt::Infinity);
        assert_eq!(inf.clone() - inf, LargeInt::Infinity);
        assert_eq!(two.clone() + two, LargeInt::from(4));
    }

    #[test]
    fn ordering_puts_infinity_on_top() {
        let mut values = vec![
            LargeInt::Infinity,
            LargeInt::from(-3),
            LargeInt::from(100),
            LargeInt::zero(),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                LargeInt::from(-3),
                LargeInt::zero(),
                LargeInt::from(100),
                LargeInt::Infinity
            ]
        );
    }

    #[test]
    fn display_and_predicates() {
        assert_eq!(LargeInt::Infinity.to_string(), "inf");
        assert_eq!(LargeInt::from(-7).to_string(), "-7");
        assert!(LargeInt::from(-7).is_negative());
        assert!(!LargeInt::Infinity.is_negative());
        assert!(LargeInt::zero().is_zero());
    }
}
