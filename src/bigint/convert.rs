use std::fmt;
use std::str::FromStr;

use super::{BigInt, BigIntError, RADIX, RADIX_BITS};

const DIGITS: &[u8; 16] = b"0123456789abcdef";

impl From<u64> for BigInt {
    fn from(value: u64) -> Self {
        let mut magnitude = value;
        let mut comps = Vec::with_capacity(3);
        loop {
            comps.push((magnitude % RADIX as u64) as i64);
            magnitude /= RADIX as u64;
            if magnitude == 0 {
                break;
            }
        }
        BigInt::from_raw(1, comps)
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        let magnitude = BigInt::from(value.unsigned_abs());
        if value < 0 {
            magnitude.negate()
        } else {
            magnitude
        }
    }
}

impl From<i32> for BigInt {
    fn from(value: i32) -> Self {
        BigInt::from(value as i64)
    }
}

impl From<u32> for BigInt {
    fn from(value: u32) -> Self {
        BigInt::from(value as u64)
    }
}

impl TryFrom<&BigInt> for i64 {
    type Error = BigIntError;

    fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
        if value.bits() > 64 {
            return Err(BigIntError::Overflow);
        }
        let magnitude = value
            .comps
            .iter()
            .rev()
            .fold(0i128, |acc, &comp| (acc << RADIX_BITS) | comp as i128);
        i64::try_from(magnitude * value.sign as i128).map_err(|_| BigIntError::Overflow)
    }
}

impl TryFrom<&BigInt> for i32 {
    type Error = BigIntError;

    fn try_from(value: &BigInt) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value)?;
        i32::try_from(wide).map_err(|_| BigIntError::Overflow)
    }
}

/// Decimal with an optional leading `-`.
impl FromStr for BigInt {
    type Err = BigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(BigIntError::Empty);
        }

        let mut value = BigInt::zero();
        for ch in digits.chars() {
            let digit = ch.to_digit(10).ok_or(BigIntError::InvalidDigit(ch))?;
            value = value.mul_int(10).add_int(digit as i32);
        }

        Ok(if negative { value.negate() } else { value })
    }
}

impl BigInt {
    /// Reads hexadecimal text the way protocol constants are written down.
    ///
    /// Spaces, tabs, newlines and `:` separators are skipped. Reading stops
    /// silently at the first other non-hex character, returning what was
    /// accumulated so far.
    pub fn from_hex(text: &str) -> BigInt {
        let mut value = BigInt::zero();
        for ch in text.chars() {
            if matches!(ch, ' ' | ':' | '\n' | '\t') {
                continue;
            }
            match ch.to_digit(16) {
                Some(digit) => value = value.mul_int(16).add_int(digit as i32),
                None => break,
            }
        }
        value
    }

    /// Renders the value in any base from 2 to 16, lowercase, with a leading
    /// `-` for negatives.
    pub fn to_str_radix(&self, base: u32) -> String {
        assert!((2..=16).contains(&base), "unsupported base {}", base);

        if self.is_zero() {
            return "0".to_string();
        }

        let mut digits = Vec::new();
        let mut magnitude = self.clone().abs();
        while !magnitude.is_zero() {
            let (quotient, digit) = magnitude.div_rem_small(base as i64);
            digits.push(DIGITS[digit as usize]);
            magnitude = quotient;
        }
        if self.is_negative() {
            digits.push(b'-');
        }
        digits.reverse();

        String::from_utf8_lossy(&digits).into_owned()
    }

    /// Reads an unsigned big-endian byte string.
    pub fn from_bytes_be(bytes: &[u8]) -> BigInt {
        bytes
            .iter()
            .fold(BigInt::zero(), |value, &byte| value.mul_int(256).add_int(byte as i32))
    }

    /// Minimum number of bytes needed to hold the magnitude.
    pub fn byte_len(&self) -> usize {
        self.bits().div_ceil(8) as usize
    }

    /// Writes the magnitude as exactly `len` big-endian bytes.
    ///
    /// Shorter values are left-padded with zeros. If `len` is too small only
    /// the low-order bytes are kept. The sign is not encoded.
    pub fn to_bytes_be(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (k, slot) in out.iter_mut().rev().enumerate() {
            *slot = self.low_byte(k);
        }
        out
    }

    /// Byte `k` of the magnitude, counting from the least significant.
    fn low_byte(&self, k: usize) -> u8 {
        let bit = k * 8;
        let comp = bit / RADIX_BITS as usize;
        let offset = (bit % RADIX_BITS as usize) as u32;

        let low = self.comps.get(comp).copied().unwrap_or(0) >> offset;
        let high = if offset + 8 > RADIX_BITS {
            self.comps.get(comp + 1).copied().unwrap_or(0) << (RADIX_BITS - offset)
        } else {
            0
        };
        ((low | high) & 0xff) as u8
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(!self.is_negative(), "", &self.clone().abs().to_str_radix(10))
    }
}

impl fmt::LowerHex for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(!self.is_negative(), "0x", &self.clone().abs().to_str_radix(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // ============================================================================
    // Native Integer Round Trips
    // ============================================================================

    #[test]
    fn test_i32_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut samples = vec![0, 1, -1, i32::MAX, i32::MIN, 46_340, 1 << 30];
        samples.extend((0..200).map(|_| rng.random::<i32>()));

        for n in samples {
            let value = BigInt::from(n);
            assert_eq!(i32::try_from(&value), Ok(n), "round trip of {}", n);
        }
    }

    #[test]
    fn test_i64_round_trip_across_digits() {
        for n in [i64::MAX, i64::MIN, 1 << 31, (1 << 62) + 3, -(1 << 33)] {
            assert_eq!(i64::try_from(&BigInt::from(n)), Ok(n));
        }
    }

    #[test]
    fn test_narrowing_overflow() {
        let too_big = BigInt::from(i32::MAX as i64 + 1);
        assert_eq!(i32::try_from(&too_big), Err(BigIntError::Overflow));

        let huge = BigInt::from(u64::MAX).mul_int(3);
        assert_eq!(i64::try_from(&huge), Err(BigIntError::Overflow));
    }

    // ============================================================================
    // Decimal Text Tests
    // ============================================================================

    #[test]
    fn test_decimal_round_trip() {
        let samples = [
            "0",
            "7",
            "-7",
            "2147483648",
            "-9223372036854775809",
            "5444762750983890360126153101805222686888682531235746",
        ];
        for text in samples {
            let value: BigInt = text.parse().unwrap();
            assert_eq!(value.to_string(), text);
        }
    }

    #[test]
    fn test_decimal_strips_leading_zeros() {
        let value: BigInt = "000123".parse().unwrap();
        assert_eq!(value.to_string(), "123");

        let negative_zero: BigInt = "-000".parse().unwrap();
        assert_eq!(negative_zero.to_string(), "0");
    }

    #[test]
    fn test_decimal_rejects_bad_input() {
        assert_eq!("".parse::<BigInt>(), Err(BigIntError::Empty));
        assert_eq!("-".parse::<BigInt>(), Err(BigIntError::Empty));
        assert_eq!("12a4".parse::<BigInt>(), Err(BigIntError::InvalidDigit('a')));
    }

    // ============================================================================
    // Hex and Radix Tests
    // ============================================================================

    #[test]
    fn test_from_hex_skips_separators() {
        let value = BigInt::from_hex("FF:ff 01\n\t02");
        assert_eq!(value, BigInt::from(0xffff_0102i64));
    }

    #[test]
    fn test_from_hex_stops_at_invalid_character() {
        assert_eq!(BigInt::from_hex("1fz99"), BigInt::from(0x1f));
    }

    #[test]
    fn test_to_str_radix() {
        let value = BigInt::from(-255);
        assert_eq!(value.to_str_radix(16), "-ff");
        assert_eq!(value.to_str_radix(2), "-11111111");
        assert_eq!(format!("{:x}", BigInt::from(48879)), "beef");
        assert_eq!(format!("{:#x}", BigInt::from(48879)), "0xbeef");
    }

    // ============================================================================
    // Binary Encoding Tests
    // ============================================================================

    #[test]
    fn test_bytes_round_trip_fixed_width() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut bytes = [0u8; 192];
        rng.fill(&mut bytes[..]);
        bytes[0] |= 0x80;

        let value = BigInt::from_bytes_be(&bytes);
        assert_eq!(value.byte_len(), 192);
        assert_eq!(value.to_bytes_be(192), bytes.to_vec());
    }

    #[test]
    fn test_to_bytes_pads_and_truncates() {
        let value = BigInt::from(0x0102_0304i64);
        assert_eq!(value.to_bytes_be(6), vec![0, 0, 1, 2, 3, 4]);
        assert_eq!(value.to_bytes_be(2), vec![3, 4]);
        assert_eq!(BigInt::zero().to_bytes_be(3), vec![0, 0, 0]);
        assert_eq!(BigInt::zero().byte_len(), 0);
    }
}
