use std::ops::{AddAssign, BitXor, BitXorAssign};

use sha2::{Digest, Sha256};

use crate::{BLOCK_BYTES, HALF_BLOCK_BYTES};

/// One cipher unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block(pub [u8; BLOCK_BYTES]);

/// Left or right half of a [`Block`], the operand of a Feistel round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LrSide(pub [u8; HALF_BLOCK_BYTES]);

impl Block {
    /// SHA-256 of an arbitrary byte string. The digest is exactly one block.
    pub fn digest(data: &[u8]) -> Block {
        let mut hasher = Sha256::default();
        hasher.update(data);
        Block(hasher.finalize().into())
    }

    /// SHA-256 over the concatenated bytes of `blocks`.
    pub fn digest_blocks(blocks: &[Block]) -> Block {
        let mut hasher = Sha256::default();
        for block in blocks {
            hasher.update(block.0);
        }
        Block(hasher.finalize().into())
    }

    /// Copies up to one block of bytes, zero-filling the tail.
    pub fn from_slice(bytes: &[u8]) -> Block {
        let mut block = Block::default();
        let len = bytes.len().min(BLOCK_BYTES);
        block.0[..len].copy_from_slice(&bytes[..len]);
        block
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_BYTES] {
        &self.0
    }

    pub fn halves(&self) -> (LrSide, LrSide) {
        let mut left = LrSide::default();
        let mut right = LrSide::default();
        left.0.copy_from_slice(&self.0[..HALF_BLOCK_BYTES]);
        right.0.copy_from_slice(&self.0[HALF_BLOCK_BYTES..]);
        (left, right)
    }

    pub fn from_halves(left: LrSide, right: LrSide) -> Block {
        let mut block = Block::default();
        block.0[..HALF_BLOCK_BYTES].copy_from_slice(&left.0);
        block.0[HALF_BLOCK_BYTES..].copy_from_slice(&right.0);
        block
    }
}

impl BitXor for Block {
    type Output = Block;

    fn bitxor(mut self, rhs: Block) -> Block {
        self ^= rhs;
        self
    }
}

impl BitXorAssign for Block {
    fn bitxor_assign(&mut self, rhs: Block) {
        for (byte, other) in self.0.iter_mut().zip(rhs.0) {
            *byte ^= other;
        }
    }
}

/// Lane-wise wrapping addition over four little-endian u64 lanes. No carry
/// crosses lanes, so this is not integer addition of the whole block.
/// Kept for the additive key-permutation variant; the default XOR round-key
/// schedule does not use it.
impl AddAssign for Block {
    fn add_assign(&mut self, rhs: Block) {
        for (lane, other) in self.0.chunks_exact_mut(8).zip(rhs.0.chunks_exact(8)) {
            let mut a = [0u8; 8];
            let mut b = [0u8; 8];
            a.copy_from_slice(lane);
            b.copy_from_slice(other);
            let sum = u64::from_le_bytes(a).wrapping_add(u64::from_le_bytes(b));
            lane.copy_from_slice(&sum.to_le_bytes());
        }
    }
}

impl LrSide {
    /// Circular right rotation of the half read as one little-endian 128-bit
    /// value. `amount` is taken modulo 128.
    pub fn rotate_right(self, amount: u32) -> LrSide {
        LrSide(u128::from_le_bytes(self.0).rotate_right(amount % 128).to_le_bytes())
    }
}

impl BitXor for LrSide {
    type Output = LrSide;

    fn bitxor(mut self, rhs: LrSide) -> LrSide {
        self ^= rhs;
        self
    }
}

impl BitXorAssign for LrSide {
    fn bitxor_assign(&mut self, rhs: LrSide) {
        for (byte, other) in self.0.iter_mut().zip(rhs.0) {
            *byte ^= other;
        }
    }
}
