use std::cmp::Ordering;
use std::ops::{Div, Rem};

use super::{BigInt, RADIX, RADIX_SQRT};

impl BigInt {
    /// Quotient truncated toward zero.
    ///
    /// # Panics
    /// If `denominator` is zero.
    pub fn divide(self, denominator: BigInt) -> BigInt {
        assert!(!denominator.is_zero(), "division by zero");

        let sign = self.sign * denominator.sign;
        let numerator = self.abs();
        let denominator = denominator.abs();

        if numerator.is_zero() {
            return BigInt::zero();
        }

        let magnitude = match numerator.cmp(&denominator) {
            Ordering::Less => return BigInt::zero(),
            Ordering::Equal => BigInt::one(),
            Ordering::Greater if denominator.num_comps() == 1 => {
                numerator.div_rem_small(denominator.comps[0]).0
            }
            Ordering::Greater => multi_divide(numerator, denominator),
        };

        magnitude.with_sign(sign)
    }

    /// `self - (self / m) * m`. The result takes the sign of `self`.
    pub fn remainder(self, m: BigInt) -> BigInt {
        let quotient = self.clone().divide(m.clone());
        self - quotient * m
    }

    /// Reduces into `[0, m)`.
    ///
    /// # Panics
    /// If `m` is not positive.
    pub fn modulo(self, m: BigInt) -> BigInt {
        assert!(
            !m.is_negative() && !m.is_zero(),
            "modulus must be positive, got {}",
            m
        );
        let r = self.remainder(m.clone());
        if r.is_negative() {
            r + m
        } else {
            r
        }
    }

    pub fn div_int(self, i: i32) -> BigInt {
        assert!(i != 0, "division by zero");
        let sign = if i < 0 { -self.sign } else { self.sign };
        self.div_rem_small(i.unsigned_abs() as i64).0.with_sign(sign)
    }

    /// Remainder after division by `i`, carrying the sign of `self`.
    pub fn rem_int(&self, i: i32) -> i32 {
        assert!(i != 0, "division by zero");
        let divisor = i.unsigned_abs() as i64;
        let magnitude = self
            .comps
            .iter()
            .rev()
            .fold(0i64, |r, &comp| (r * RADIX + comp) % divisor);
        (magnitude * self.sign as i64) as i32
    }

    /// Residue in `[0, m)`.
    pub fn mod_int(&self, m: i32) -> i32 {
        assert!(m > 0, "modulus must be positive, got {}", m);
        let r = self.rem_int(m);
        if r < 0 {
            r + m
        } else {
            r
        }
    }

    /// One pass of digit-wise long division of the magnitude by a divisor in
    /// `(0, RADIX]`. Returns the quotient (keeping the sign of `self`) and the
    /// magnitude of the remainder.
    pub(crate) fn div_rem_small(mut self, divisor: i64) -> (BigInt, i64) {
        let mut r = 0i64;
        for comp in self.comps.iter_mut().rev() {
            r = r * RADIX + *comp;
            *comp = r / divisor;
            r %= divisor;
        }
        self.normalize();
        (self, r)
    }

    /// Shift-and-subtract division. Much slower than [`BigInt::divide`] and
    /// kept as an independent reference for checking it.
    pub fn binary_divide(self, denominator: BigInt) -> BigInt {
        assert!(!denominator.is_zero(), "division by zero");

        let sign = self.sign * denominator.sign;
        let mut rest = self.abs();

        let mut multiples = vec![(denominator.abs(), BigInt::one())];
        loop {
            let (multiple, power) = &multiples[multiples.len() - 1];
            if *multiple > rest {
                break;
            }
            let next = (multiple.clone().double(), power.clone().double());
            multiples.push(next);
        }

        let mut quotient = BigInt::zero();
        for (multiple, power) in multiples.into_iter().rev() {
            if multiple <= rest {
                rest = rest - multiple;
                quotient = quotient + power;
            }
        }

        quotient.with_sign(sign)
    }
}

/// Division of positive values where the denominator has at least two digits
/// and is smaller than the numerator.
fn multi_divide(numerator: BigInt, denominator: BigInt) -> BigInt {
    // a small top digit makes the top-digit estimate too coarse; scaling both
    // sides leaves the quotient unchanged
    let (numerator, denominator) = if denominator.top() < RADIX_SQRT {
        (numerator.mul_small(RADIX_SQRT), denominator.mul_small(RADIX_SQRT))
    } else {
        (numerator, denominator)
    };

    converge(numerator, &denominator)
}

/// Estimates the quotient from the denominator's top digit alone, which can
/// only overshoot, then recurses on the overshoot until it is below one
/// denominator.
fn converge(numerator: BigInt, denominator: &BigInt) -> BigInt {
    let shift = denominator.num_comps() - 1;
    let (mut estimate, _) = numerator.clone().div_rem_small(denominator.top());
    if estimate.comps.len() > shift {
        estimate.comps.drain(..shift);
    } else {
        estimate = BigInt::zero();
    }

    let overshoot = estimate.clone() * denominator.clone() - numerator.clone();

    let (quotient, remainder) = if overshoot < *denominator {
        (estimate, overshoot.negate())
    } else {
        let quotient = estimate - converge(overshoot, denominator);
        let remainder = numerator - quotient.clone() * denominator.clone();
        (quotient, remainder)
    };

    if remainder.is_negative() {
        quotient.sub_int(1)
    } else {
        quotient
    }
}

impl Div for BigInt {
    type Output = BigInt;

    fn div(self, other: BigInt) -> BigInt {
        self.divide(other)
    }
}

impl Rem for BigInt {
    type Output = BigInt;

    fn rem(self, other: BigInt) -> BigInt {
        self.remainder(other)
    }
}
