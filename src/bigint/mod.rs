//! # BigInt Engine
//!
//! Arbitrary-precision signed integers backing the Diffie-Hellman exchange.
//!
//! A value is a sign plus little-endian digits in radix 2^31. Digits are held
//! in `i64` slots so that the product of two digits plus an accumulated carry
//! still fits, which lets multiplication defer carry propagation to
//! [`BigInt::normalize`].
//!
//! Every arithmetic method takes its operands by value and returns a fresh
//! value. Call `clone()` when an operand is needed again afterwards.
//!
//! Arithmetic misuse (division by zero, inverse of non-coprime values, an even
//! Jacobi modulus, a non-positive modulus) is a programming error and panics.

mod arith;
mod convert;
mod division;
mod number_theory;
mod primes;

use std::cmp::Ordering;
use thiserror::Error;

pub(crate) use primes::LOW_PRIMES;

/// Bits per digit.
pub(crate) const RADIX_BITS: u32 = 31;
pub(crate) const RADIX: i64 = 1 << RADIX_BITS;
pub(crate) const RADIX_HALF: i64 = RADIX / 2;
/// Integer square root of the radix, the lower bound a divisor's top digit is
/// scaled up to before long division.
pub(crate) const RADIX_SQRT: i64 = 46_340;

/// Errors from parsing text into a [`BigInt`] or narrowing one into a native integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BigIntError {
    #[error("no digits to parse")]
    Empty,
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
    #[error("value does not fit in the target integer type")]
    Overflow,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigInt {
    /// +1 or -1. Zero is always +1.
    sign: i8,
    /// Little-endian digits, each in `[0, RADIX)` once normalized.
    comps: Vec<i64>,
}

impl BigInt {
    pub fn zero() -> BigInt {
        BigInt { sign: 1, comps: vec![0] }
    }

    pub fn one() -> BigInt {
        BigInt { sign: 1, comps: vec![1] }
    }

    /// Builds a value from raw digits that may be out of range or carry a
    /// negative top digit.
    pub(crate) fn from_raw(sign: i8, comps: Vec<i64>) -> BigInt {
        let mut value = BigInt {
            sign,
            comps: if comps.is_empty() { vec![0] } else { comps },
        };
        value.normalize();
        value
    }

    pub fn is_zero(&self) -> bool {
        self.comps.len() == 1 && self.comps[0] == 0
    }

    pub fn is_one(&self) -> bool {
        self.sign == 1 && self.comps.len() == 1 && self.comps[0] == 1
    }

    pub fn is_negative(&self) -> bool {
        self.sign < 0
    }

    pub fn is_odd(&self) -> bool {
        self.comps[0] & 1 == 1
    }

    pub fn is_even(&self) -> bool {
        !self.is_odd()
    }

    /// -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        if self.is_zero() {
            0
        } else {
            self.sign as i32
        }
    }

    /// Number of significant bits in the magnitude. Zero has no bits.
    pub fn bits(&self) -> u64 {
        let top = self.top();
        let top_bits = (i64::BITS - top.leading_zeros()) as u64;
        (self.comps.len() as u64 - 1) * RADIX_BITS as u64 + top_bits
    }

    pub(crate) fn num_comps(&self) -> usize {
        self.comps.len()
    }

    pub(crate) fn top(&self) -> i64 {
        self.comps[self.comps.len() - 1]
    }

    /// Applies `sign` unless the value is zero.
    pub(crate) fn with_sign(mut self, sign: i8) -> BigInt {
        if !self.is_zero() {
            self.sign = sign;
        }
        self
    }

    /// Restores the representation invariants after raw digit arithmetic.
    ///
    /// # Process
    /// 1. Borrows from the next digit up into every negative lower digit
    /// 2. If the top digit is still negative, flips the sign and replaces the
    ///    digits with their complement so the magnitude becomes positive
    /// 3. Carries every digit at or above the radix upward, growing as needed
    /// 4. Drops leading zero digits and turns -0 into +0
    pub(crate) fn normalize(&mut self) {
        let top = self.comps.len() - 1;

        for c in 0..top {
            if self.comps[c] < 0 {
                self.comps[c + 1] += self.comps[c] / RADIX - 1;
                self.comps[c] %= RADIX;
                if self.comps[c] != 0 {
                    self.comps[c] += RADIX;
                } else {
                    self.comps[c + 1] += 1;
                }
            }
        }

        if self.comps[top] < 0 {
            self.sign = -self.sign;
            for c in 0..top {
                self.comps[c] = RADIX - self.comps[c];
                self.comps[c + 1] += 1;
            }
            self.comps[top] = -self.comps[top];
        }

        let mut c = 0;
        while c < self.comps.len() {
            if self.comps[c] >= RADIX {
                if c + 1 == self.comps.len() {
                    self.comps.push(0);
                }
                self.comps[c + 1] += self.comps[c] / RADIX;
                self.comps[c] %= RADIX;
            }
            c += 1;
        }

        while self.comps.len() > 1 && self.comps[self.comps.len() - 1] == 0 {
            self.comps.pop();
        }

        if self.is_zero() {
            self.sign = 1;
        }
    }
}

impl Default for BigInt {
    fn default() -> Self {
        BigInt::zero()
    }
}

/// Sign first, then digit count, then digits from the most significant down.
impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.sign != other.sign {
            return self.sign.cmp(&other.sign);
        }

        let magnitude = self
            .comps
            .len()
            .cmp(&other.comps.len())
            .then_with(|| self.comps.iter().rev().cmp(other.comps.iter().rev()));

        if self.sign < 0 {
            magnitude.reverse()
        } else {
            magnitude
        }
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Normalization Tests
    // ============================================================================

    #[test]
    fn test_normalize_carries_into_new_digit() {
        let value = BigInt::from_raw(1, vec![RADIX + 5]);
        assert_eq!(value.comps, vec![5, 1]);
        assert_eq!(value.sign, 1);
    }

    #[test]
    fn test_normalize_borrows_negative_lower_digit() {
        // 3 * RADIX - 5
        let value = BigInt::from_raw(1, vec![-5, 3]);
        assert_eq!(value.comps, vec![RADIX - 5, 2]);
    }

    #[test]
    fn test_normalize_borrows_exact_radix_multiple() {
        // 3 * RADIX - RADIX
        let value = BigInt::from_raw(1, vec![-RADIX, 3]);
        assert_eq!(value.comps, vec![0, 2]);
    }

    #[test]
    fn test_normalize_flips_negative_top() {
        // 3 - RADIX is negative
        let value = BigInt::from_raw(1, vec![3, -1]);
        assert_eq!(value.sign, -1);
        assert_eq!(value.comps, vec![RADIX - 3]);
    }

    #[test]
    fn test_normalize_negative_zero_becomes_positive() {
        let value = BigInt::from_raw(-1, vec![0, 0, 0]);
        assert!(value.is_zero());
        assert_eq!(value.sign, 1);
        assert_eq!(value, BigInt::zero());
    }

    #[test]
    fn test_normalize_trims_leading_zeros() {
        let value = BigInt::from_raw(1, vec![7, 0, 0]);
        assert_eq!(value.num_comps(), 1);
    }

    // ============================================================================
    // Comparison Tests
    // ============================================================================

    #[test]
    fn test_compare_by_sign_then_length() {
        let big = BigInt::from(1i64 << 40);
        let small = BigInt::from(12);
        let negative_big = BigInt::from(-(1i64 << 40));

        assert!(big > small);
        assert!(negative_big < small);
        assert!(negative_big < BigInt::from(-1));
        assert!(BigInt::from(-1) < BigInt::zero());
    }

    #[test]
    fn test_compare_digit_by_digit() {
        let a = BigInt::from_raw(1, vec![5, 9]);
        let b = BigInt::from_raw(1, vec![6, 8]);
        assert!(a > b);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
        assert!(a.clone().negate() < b.negate());
    }

    // ============================================================================
    // Predicate Tests
    // ============================================================================

    #[test]
    fn test_predicates() {
        assert!(BigInt::zero().is_zero());
        assert!(BigInt::one().is_one());
        assert!(!BigInt::from(-1).is_one());
        assert!(BigInt::from(-7).is_odd());
        assert!(BigInt::from(10).is_even());
        assert!(BigInt::from(-3).is_negative());
        assert_eq!(BigInt::from(-3).signum(), -1);
        assert_eq!(BigInt::zero().signum(), 0);
    }

    #[test]
    fn test_bits() {
        assert_eq!(BigInt::zero().bits(), 0);
        assert_eq!(BigInt::one().bits(), 1);
        assert_eq!(BigInt::from(255).bits(), 8);
        assert_eq!(BigInt::from(1i64 << 31).bits(), 32);
        assert_eq!(BigInt::from(u64::MAX).bits(), 64);
    }
}
