pub mod bigint;
pub mod block;
pub mod bytes;
pub mod commands;
pub mod cryptography;
pub mod error;
pub mod feistel;
pub mod networking;
pub mod stream;
pub mod utils;

pub const BLOCK_BYTES: usize = 32;
pub const HALF_BLOCK_BYTES: usize = BLOCK_BYTES / 2;
pub const CLUSTER_BYTES: usize = 4096;
pub const BLOCKS_PER_CLUSTER: usize = CLUSTER_BYTES / BLOCK_BYTES;

pub const FEISTEL_ROUNDS: u32 = 16;
pub const ROR_CONSTANT: u32 = 27;

// How many times OS entropy is hashed before it becomes an IV
pub const HASHING_REPEATS: usize = 2;

// Width of a Diffie-Hellman public value on the wire (1536-bit prime)
pub const PRIME_BYTES: usize = 192;

pub const MAX_FILENAME_BYTES: usize = 4096;
pub const LISTENING_PORT: u16 = 32121;
