use std::io::{Read, Write};

use log::{debug, info};
use rand::rngs::{OsRng, StdRng};
use rand::{SeedableRng, TryRngCore};

use crate::bigint::BigInt;
use crate::block::Block;
use crate::error::ScpError;
use crate::networking::{receive_bytes, send_bytes};
use crate::{BLOCK_BYTES, HASHING_REPEATS, PRIME_BYTES};

/// RFC 3526 1536-bit MODP group prime.
pub const PRIME_HEX: &str = "\
    FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1 \
    29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD \
    EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245 \
    E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED \
    EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D \
    C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F \
    83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D \
    670C354E 4ABC9804 F1746C08 CA237327 FFFFFFFF FFFFFFFF";

pub const GENERATOR_HEX: &str =
    "add4189f9c94ff2d61f33761aba3ae1f89cb26d28a50907448e28efefcfceb10";

const PRIVATE_EXPONENT_BITS: i32 = 256;

/// Public Diffie-Hellman parameters. Both peers use the same compiled-in
/// values; nothing is negotiated.
#[derive(Clone, Debug)]
pub struct DhParams {
    pub prime: BigInt,
    pub generator: BigInt,
}

impl Default for DhParams {
    fn default() -> Self {
        DhParams {
            prime: BigInt::from_hex(PRIME_HEX),
            generator: BigInt::from_hex(GENERATOR_HEX),
        }
    }
}

/// Fills `buffer` from the operating system's entropy source.
pub fn fill_random(buffer: &mut [u8]) -> Result<(), ScpError> {
    OsRng
        .try_fill_bytes(buffer)
        .map_err(|e| ScpError::Entropy(e.to_string()))
}

/// Fresh initialization value: one block of OS entropy hashed
/// [`HASHING_REPEATS`] times.
pub fn generate_iv() -> Result<Block, ScpError> {
    let mut iv = Block::default();
    fill_random(&mut iv.0)?;
    for _ in 0..HASHING_REPEATS {
        iv = Block::digest(iv.as_bytes());
    }
    Ok(iv)
}

/// One side of an unauthenticated Diffie-Hellman exchange.
///
/// Nothing here proves who the peer is, so an active man in the middle can
/// substitute its own public values.
pub struct KeyExchange {
    params: DhParams,
    private: BigInt,
}

impl KeyExchange {
    /// Draws a 256-bit private exponent from a generator seeded by the OS.
    pub fn new(params: DhParams) -> Result<Self, ScpError> {
        let mut rng = StdRng::try_from_os_rng().map_err(|e| ScpError::Entropy(e.to_string()))?;
        let bound = BigInt::from(2).power(PRIVATE_EXPONENT_BITS);
        let private = BigInt::random_below(bound, &mut rng);
        Ok(KeyExchange { params, private })
    }

    pub fn with_private(params: DhParams, private: BigInt) -> Self {
        KeyExchange { params, private }
    }

    /// `g^private mod p`
    pub fn public_value(&self) -> BigInt {
        self.params
            .generator
            .clone()
            .mod_power(self.private.clone(), self.params.prime.clone())
    }

    /// The public value as [`PRIME_BYTES`] big-endian bytes.
    pub fn encoded_public(&self) -> Vec<u8> {
        self.public_value().to_bytes_be(PRIME_BYTES)
    }

    /// Turns the peer's encoded public value into the session key.
    ///
    /// # Process
    /// 1. Computes the shared secret `peer^private mod p`
    /// 2. Encodes it as [`PRIME_BYTES`] big-endian bytes
    /// 3. Hashes the first block of that encoding into the key
    pub fn derive_key(&self, peer_public: &[u8]) -> Block {
        let peer = BigInt::from_bytes_be(peer_public);
        let shared = peer.mod_power(self.private.clone(), self.params.prime.clone());
        let encoded = shared.to_bytes_be(PRIME_BYTES);
        Block::digest(&encoded[..BLOCK_BYTES])
    }
}

/// Server half: waits for the client's public value, then answers with its own.
pub fn exchange_key_server<T: Read + Write + ?Sized>(transport: &mut T) -> Result<Block, ScpError> {
    let exchange = KeyExchange::new(DhParams::default())?;

    let mut peer_public = vec![0u8; PRIME_BYTES];
    receive_bytes(transport, &mut peer_public, "receiving client public value")?;
    debug!("Received client public value");

    send_bytes(transport, &exchange.encoded_public(), "sending server public value")?;
    debug!("Sent server public value");

    let key = exchange.derive_key(&peer_public);
    info!("Session key established");
    Ok(key)
}

/// Client half: sends its public value first, then waits for the server's.
pub fn exchange_key_client<T: Read + Write + ?Sized>(transport: &mut T) -> Result<Block, ScpError> {
    let exchange = KeyExchange::new(DhParams::default())?;

    send_bytes(transport, &exchange.encoded_public(), "sending client public value")?;
    debug!("Sent client public value");

    let mut peer_public = vec![0u8; PRIME_BYTES];
    receive_bytes(transport, &mut peer_public, "receiving server public value")?;
    debug!("Received server public value");

    let key = exchange.derive_key(&peer_public);
    info!("Session key established");
    Ok(key)
}
