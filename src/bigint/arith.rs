use std::ops::{Add, Mul, Neg, Sub};

use super::{BigInt, RADIX_HALF};

/// Operands with at least this many digits each are multiplied with Karatsuba.
pub(crate) const KARATSUBA_THRESHOLD: usize = 12;

impl BigInt {
    pub fn negate(self) -> BigInt {
        let sign = -self.sign;
        self.with_sign(sign)
    }

    pub fn abs(mut self) -> BigInt {
        self.sign = 1;
        self
    }

    pub fn add_int(self, i: i32) -> BigInt {
        self.add_small(i as i64)
    }

    pub fn sub_int(self, i: i32) -> BigInt {
        self.add_small(-(i as i64))
    }

    fn add_small(mut self, i: i64) -> BigInt {
        if self.sign > 0 {
            self.comps[0] += i;
        } else {
            self.comps[0] -= i;
        }
        self.normalize();
        self
    }

    pub fn mul_int(self, i: i32) -> BigInt {
        let sign = if i < 0 { -self.sign } else { self.sign };
        self.mul_small(i.unsigned_abs() as i64).with_sign(sign)
    }

    /// Multiplies the magnitude by `factor`, which must be below the radix.
    pub(crate) fn mul_small(mut self, factor: i64) -> BigInt {
        for comp in self.comps.iter_mut() {
            *comp *= factor;
        }
        self.normalize();
        self
    }

    pub fn double(self) -> BigInt {
        self.mul_small(2)
    }

    /// Halves the value, rounding the magnitude down.
    pub fn half(mut self) -> BigInt {
        for c in 0..self.comps.len() {
            if self.comps[c] & 1 == 1 && c > 0 {
                self.comps[c - 1] += RADIX_HALF;
            }
            self.comps[c] >>= 1;
        }
        self.normalize();
        self
    }

    pub fn square(self) -> BigInt {
        self.clone() * self
    }

    /// Raises the value to a non-negative power.
    ///
    /// # Panics
    /// If `exponent` is negative.
    pub fn power(self, exponent: i32) -> BigInt {
        assert!(exponent >= 0, "negative exponent {} in power", exponent);

        let mut result = BigInt::one();
        let mut base = self;
        let mut remaining = exponent as u32;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result * base.clone();
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.square();
            }
        }
        result
    }

    fn add_signed(mut self, other: BigInt, other_sign: i8) -> BigInt {
        if self.comps.len() < other.comps.len() {
            self.comps.resize(other.comps.len(), 0);
        }

        let same_sign = self.sign == other_sign;
        for (slot, comp) in self.comps.iter_mut().zip(&other.comps) {
            if same_sign {
                *slot += comp;
            } else {
                *slot -= comp;
            }
        }

        self.normalize();
        self
    }

    /// Splits the magnitude into (digits `n..`, digits `..n`).
    fn split_at(&self, n: usize) -> (BigInt, BigInt) {
        let cut = n.min(self.comps.len());
        let low = BigInt::from_raw(1, self.comps[..cut].to_vec());
        let high = BigInt::from_raw(1, self.comps[cut..].to_vec());
        (high, low)
    }

    /// Adds the magnitude of `other`, shifted up by `shift` digits, without normalizing.
    fn accumulate_shifted(&mut self, other: &BigInt, shift: usize) {
        let needed = other.comps.len() + shift;
        if self.comps.len() < needed {
            self.comps.resize(needed, 0);
        }
        for (c, comp) in other.comps.iter().enumerate() {
            self.comps[c + shift] += comp;
        }
    }
}

/// Schoolbook multiplication, normalizing after every row so that no digit
/// slot accumulates more than one product on top of a reduced digit.
pub(crate) fn regular_multiply(a: &BigInt, b: &BigInt) -> BigInt {
    let width = a.comps.len() + b.comps.len();
    let mut result = BigInt {
        sign: 1,
        comps: vec![0; width],
    };

    for (i, &x) in a.comps.iter().enumerate() {
        // normalize trims the top digits the next row still writes into
        result.comps.resize(width, 0);
        for (j, &y) in b.comps.iter().enumerate() {
            result.comps[i + j] += x * y;
        }
        result.normalize();
    }

    result.with_sign(a.sign * b.sign)
}

/// Karatsuba multiplication over the magnitudes, split at half the longer operand.
///
/// `hh·r^2n + (mid − hh − ll)·r^n + ll`, where `mid = (high_a + low_a)(high_b + low_b)`.
pub(crate) fn karatsuba_multiply(a: BigInt, b: BigInt) -> BigInt {
    let n = (a.comps.len().max(b.comps.len()) + 1) / 2;
    let (a_high, a_low) = a.split_at(n);
    let (b_high, b_low) = b.split_at(n);

    let high = a_high.clone() * b_high.clone();
    let low = a_low.clone() * b_low.clone();
    let middle = (a_high + a_low) * (b_high + b_low) - high.clone() - low.clone();

    let mut result = low;
    result.accumulate_shifted(&middle, n);
    result.accumulate_shifted(&high, 2 * n);
    result.sign = a.sign * b.sign;
    result.normalize();
    result
}

impl Add for BigInt {
    type Output = BigInt;

    fn add(self, other: BigInt) -> BigInt {
        let other_sign = other.sign;
        self.add_signed(other, other_sign)
    }
}

impl Sub for BigInt {
    type Output = BigInt;

    fn sub(self, other: BigInt) -> BigInt {
        let other_sign = -other.sign;
        self.add_signed(other, other_sign)
    }
}

impl Mul for BigInt {
    type Output = BigInt;

    fn mul(self, other: BigInt) -> BigInt {
        if self.comps.len().min(other.comps.len()) < KARATSUBA_THRESHOLD {
            regular_multiply(&self, &other)
        } else {
            karatsuba_multiply(self, other)
        }
    }
}

impl Neg for BigInt {
    type Output = BigInt;

    fn neg(self) -> BigInt {
        self.negate()
    }
}
