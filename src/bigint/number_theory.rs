use std::cmp::Ordering;

use log::debug;
use rand::Rng;

use super::{BigInt, LOW_PRIMES, RADIX};

/// Candidates probed from one random starting point before drawing another.
const PRIME_PROBE_WINDOW: usize = 1000;

impl BigInt {
    /// `self^exponent mod modulus` by square-and-multiply from the low bit up.
    ///
    /// A negative exponent computes with its absolute value and returns the
    /// modular inverse of the result.
    pub fn mod_power(self, exponent: BigInt, modulus: BigInt) -> BigInt {
        let invert = exponent.is_negative();
        let mut exponent = exponent.abs();
        let mut base = self.modulo(modulus.clone());
        let mut result = BigInt::one().modulo(modulus.clone());

        while !exponent.is_zero() {
            if exponent.is_odd() {
                result = (result * base.clone()).modulo(modulus.clone());
            }
            exponent = exponent.half();
            if !exponent.is_zero() {
                base = base.square().modulo(modulus.clone());
            }
        }

        if invert {
            result.mod_inverse(modulus)
        } else {
            result
        }
    }

    /// Greatest common divisor of the magnitudes.
    pub fn gcd(self, other: BigInt) -> BigInt {
        let mut a = self.abs();
        let mut b = other.abs();
        while !b.is_zero() {
            let r = a.modulo(b.clone());
            a = b;
            b = r;
        }
        a
    }

    pub fn lcm(self, other: BigInt) -> BigInt {
        if self.is_zero() || other.is_zero() {
            return BigInt::zero();
        }
        let divisor = self.clone().gcd(other.clone());
        (self * other).abs().divide(divisor)
    }

    /// Extended Euclid.
    ///
    /// # Returns
    /// `(g, x, y)` with `x * self + y * other == g == gcd(self, other)`
    ///
    /// # Panics
    /// If the running remainder ever goes negative, which would mean the
    /// algorithm itself is broken.
    pub fn egcd(self, other: BigInt) -> (BigInt, BigInt, BigInt) {
        if self.is_negative() {
            let (g, x, y) = self.negate().egcd(other);
            return (g, x.negate(), y);
        }
        if other.is_negative() {
            let (g, x, y) = self.egcd(other.negate());
            return (g, x, y.negate());
        }

        let (mut x0, mut y0, mut r0) = (BigInt::one(), BigInt::zero(), self);
        let (mut x1, mut y1, mut r1) = (BigInt::zero(), BigInt::one(), other);

        while !r1.is_zero() {
            let q = r0.clone().divide(r1.clone());
            let x2 = x0 - q.clone() * x1.clone();
            let y2 = y0 - q.clone() * y1.clone();
            let r2 = r0 - q * r1.clone();
            assert!(!r2.is_negative(), "negative remainder in extended gcd");

            (x0, y0, r0) = (x1, y1, r1);
            (x1, y1, r1) = (x2, y2, r2);
        }

        (r0, x0, y0)
    }

    /// Inverse of `self` modulo `modulus`, in `[0, modulus)`.
    ///
    /// # Panics
    /// If `self` and `modulus` are not coprime.
    pub fn mod_inverse(self, modulus: BigInt) -> BigInt {
        let (g, _, inverse) = modulus.clone().egcd(self);
        assert!(g.is_one(), "modular inverse of non-coprime values (gcd {})", g);
        inverse.modulo(modulus)
    }

    /// Jacobi symbol `(self / n)` as -1, 0 or 1.
    ///
    /// # Panics
    /// If `n` is even.
    pub fn jacobi(self, n: BigInt) -> i32 {
        assert!(n.is_odd(), "Jacobi symbol with even modulus {}", n);

        if self.is_negative() || self >= n {
            return self.modulo(n.clone()).jacobi(n);
        }
        if self.is_zero() || self.is_one() {
            return self.signum();
        }
        if self == BigInt::from(2) {
            return match n.mod_int(8) {
                1 | 7 => 1,
                _ => -1,
            };
        }
        if self.is_even() {
            return BigInt::from(2).jacobi(n.clone()) * self.half().jacobi(n);
        }
        if self.mod_int(4) == 3 && n.mod_int(4) == 3 {
            -n.jacobi(self)
        } else {
            n.jacobi(self)
        }
    }

    /// Uniform-ish value in `[0, bound)`: fills twice as many digits as the
    /// bound with random digits and reduces.
    pub fn random_below<R: Rng + ?Sized>(bound: BigInt, rng: &mut R) -> BigInt {
        let mut value = bound.clone().square();
        for comp in value.comps.iter_mut() {
            *comp = rng.random_range(0..RADIX);
        }
        value.sign = 1;
        value.normalize();
        value.modulo(bound)
    }

    /// Trial division by [`LOW_PRIMES`], then `certainty` probabilistic rounds.
    ///
    /// With `certainty >= 5` the first two rounds are Fermat tests. Every
    /// other round is a gcd check followed by Solovay–Strassen.
    pub fn is_probable_prime<R: Rng + ?Sized>(&self, certainty: u32, rng: &mut R) -> bool {
        for &prime in LOW_PRIMES.iter() {
            match self.cmp(&BigInt::from(prime)) {
                Ordering::Equal => return true,
                Ordering::Less => return false,
                Ordering::Greater => {
                    if self.mod_int(prime) == 0 {
                        return false;
                    }
                }
            }
        }

        let n_minus_one = self.clone().sub_int(1);
        let half_order = n_minus_one.clone().half();

        for round in 0..certainty {
            let witness = BigInt::random_below(self.clone(), rng);

            if round < 2 && certainty >= 5 {
                let fermat = witness.mod_power(n_minus_one.clone(), self.clone());
                if !fermat.is_one() {
                    return false;
                }
                continue;
            }

            if !self.clone().gcd(witness.clone()).is_one() {
                return false;
            }
            let euler = witness.clone().mod_power(half_order.clone(), self.clone());
            let euler = if euler.is_one() {
                1
            } else if euler == n_minus_one {
                -1
            } else {
                return false;
            };
            if witness.jacobi(self.clone()) != euler {
                return false;
            }
        }

        true
    }

    /// Random probable prime of `bits` bits.
    ///
    /// # Process
    /// 1. Draws a random start in `[2^(bits-1), 2^bits)`
    /// 2. Moves it up onto a `6k±1` residue
    /// 3. Probes a window of candidates stepping 4 and 2 alternately
    /// 4. Draws a new start if the window holds no prime
    ///
    /// A start near the top of the range can probe past `2^bits`, so the
    /// result occasionally has `bits + 1` bits.
    pub fn generate_prime<R: Rng + ?Sized>(bits: u32, certainty: u32, rng: &mut R) -> BigInt {
        assert!(bits >= 2, "cannot generate a {}-bit prime", bits);
        let floor = BigInt::from(2).power(bits as i32 - 1);

        loop {
            let mut candidate = BigInt::random_below(floor.clone(), rng) + floor.clone();
            let (snap, mut step) = match candidate.mod_int(6) {
                0 => (1, 4),
                1 => (0, 4),
                2 => (3, 2),
                3 => (2, 2),
                4 => (1, 2),
                _ => (0, 2),
            };
            candidate = candidate.add_int(snap);

            for _ in 0..PRIME_PROBE_WINDOW {
                if candidate.is_probable_prime(certainty, rng) {
                    return candidate;
                }
                candidate = candidate.add_int(step);
                step = 6 - step;
            }
            debug!("No {}-bit prime in probe window, drawing a new start", bits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(text: &str) -> BigInt {
        text.parse().unwrap()
    }

    // ============================================================================
    // Modular Exponentiation Tests
    // ============================================================================

    #[test]
    fn test_mod_power_small_values() {
        // 4^13 mod 497 = 445
        let r = BigInt::from(4).mod_power(BigInt::from(13), BigInt::from(497));
        assert_eq!(r, BigInt::from(445));

        let r = BigInt::from(3).mod_power(BigInt::from(200), BigInt::from(1_000_000_007));
        let expected = (0..200).fold(1u64, |acc, _| acc * 3 % 1_000_000_007);
        assert_eq!(r, BigInt::from(expected));
    }

    #[test]
    fn test_mod_power_matches_power_then_modulo() {
        let base = big("123456789012345678901234567890");
        let modulus = big("987654321098765432109876543211");
        for exp in [0, 1, 2, 17, 64] {
            let direct = base.clone().power(exp).modulo(modulus.clone());
            let fast = base.clone().mod_power(BigInt::from(exp), modulus.clone());
            assert_eq!(direct, fast, "exponent {}", exp);
        }
    }

    #[test]
    fn test_mod_power_negative_exponent_is_inverse() {
        let modulus = big("170141183460469231731687303715884105727");
        let a = big("31415926535897932384626433832795");
        let e = big("2718281828459045235360287");

        let forward = a.clone().mod_power(e.clone(), modulus.clone());
        let backward = a.mod_power(e.negate(), modulus.clone());
        assert!((forward * backward).modulo(modulus).is_one());
    }

    // ============================================================================
    // GCD Tests
    // ============================================================================

    #[test]
    fn test_gcd_and_lcm() {
        assert_eq!(BigInt::from(462).gcd(BigInt::from(1071)), BigInt::from(21));
        assert_eq!(BigInt::from(-462).gcd(BigInt::from(1071)), BigInt::from(21));
        assert_eq!(BigInt::from(4).lcm(BigInt::from(6)), BigInt::from(12));
    }

    #[test]
    fn test_egcd_bezout_identity() {
        let pairs = [
            (big("240"), big("46")),
            (big("-240"), big("46")),
            (big("240"), big("-46")),
            (big("98765432109876543210987"), big("1234567890123456789")),
        ];
        for (a, b) in pairs {
            let (g, x, y) = a.clone().egcd(b.clone());
            assert_eq!(x * a.clone() + y * b.clone(), g);
            assert_eq!(g, a.gcd(b));
        }
    }

    #[test]
    fn test_mod_inverse() {
        let inverse = BigInt::from(3).mod_inverse(BigInt::from(11));
        assert_eq!(inverse, BigInt::from(4));

        let modulus = big("340282366920938463463374607431768211507");
        let a = big("12345678901234567890");
        let inverse = a.clone().mod_inverse(modulus.clone());
        assert!((a * inverse).modulo(modulus).is_one());
    }

    #[test]
    #[should_panic(expected = "non-coprime")]
    fn test_mod_inverse_non_coprime_panics() {
        BigInt::from(6).mod_inverse(BigInt::from(9));
    }

    // ============================================================================
    // Jacobi Symbol Tests
    // ============================================================================

    #[test]
    fn test_jacobi_known_values() {
        let cases = [
            (1, 3, 1),
            (2, 3, -1),
            (2, 7, 1),
            (5, 21, 1),
            (8, 21, -1),
            (19, 45, 1),
            (1001, 9907, -1),
            (0, 5, 0),
            (30, 15, 0),
        ];
        for (a, n, expected) in cases {
            assert_eq!(
                BigInt::from(a).jacobi(BigInt::from(n)),
                expected,
                "({} / {})",
                a,
                n
            );
        }
    }

    #[test]
    #[should_panic(expected = "even modulus")]
    fn test_jacobi_even_modulus_panics() {
        BigInt::from(3).jacobi(BigInt::from(8));
    }

    // ============================================================================
    // Primality Tests
    // ============================================================================

    #[test]
    fn test_small_primes_and_composites() {
        let mut rng = StdRng::seed_from_u64(31);
        let primes = [
            2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79,
            83, 89, 97,
        ];
        for n in 0..=100 {
            let expected = primes.contains(&n);
            assert_eq!(
                BigInt::from(n).is_probable_prime(20, &mut rng),
                expected,
                "classification of {}",
                n
            );
        }
    }

    #[test]
    fn test_large_known_primes() {
        let mut rng = StdRng::seed_from_u64(32);
        // 2^61 - 1, 2^89 - 1, 2^127 - 1
        for exp in [61, 89, 127] {
            let mersenne = BigInt::from(2).power(exp).sub_int(1);
            assert!(mersenne.is_probable_prime(20, &mut rng), "2^{} - 1", exp);
        }
    }

    #[test]
    fn test_large_composites_rejected() {
        let mut rng = StdRng::seed_from_u64(33);
        let p = BigInt::from(2).power(61).sub_int(1);
        let q = BigInt::from(2).power(31).sub_int(1);
        assert!(!(p.clone() * q).is_probable_prime(20, &mut rng));
        assert!(!(p.clone() * p).is_probable_prime(20, &mut rng));
    }

    #[test]
    fn test_generate_prime() {
        let mut rng = StdRng::seed_from_u64(34);
        let prime = BigInt::generate_prime(96, 20, &mut rng);

        assert!(prime.bits() >= 96);
        assert!(prime.bits() <= 97);
        for &small in LOW_PRIMES.iter().take(50) {
            assert_ne!(prime.mod_int(small), 0, "divisible by {}", small);
        }
        assert!(prime.is_probable_prime(30, &mut rng));
    }

    // ============================================================================
    // Random Generation Tests
    // ============================================================================

    #[test]
    fn test_random_below_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(35);
        let bound = big("100000000000000000000000000007");
        for _ in 0..200 {
            let value = BigInt::random_below(bound.clone(), &mut rng);
            assert!(!value.is_negative());
            assert!(value < bound);
        }
    }

    #[test]
    fn test_random_below_small_bound_hits_every_value() {
        let mut rng = StdRng::seed_from_u64(36);
        let mut seen = [false; 6];
        for _ in 0..500 {
            let value = BigInt::random_below(BigInt::from(6), &mut rng);
            seen[i32::try_from(&value).unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|&hit| hit));
    }
}
