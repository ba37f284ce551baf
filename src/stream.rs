//! Streaming cipher engine.
//!
//! A transfer on the wire:
//!
//! ```text
//! [u64 rounded length][u32 name length][name][IV]
//! [cluster 0] ... [final cluster + pad block][trailer]
//! ```
//!
//! Every non-final cluster is [`BLOCKS_PER_CLUSTER`] blocks. Blocks are
//! chained CBC-style across cluster boundaries. The trailer is the hash of
//! the ordered per-cluster plaintext hashes and travels unencrypted.

use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::block::Block;
use crate::bytes::{blocks_to_bytes, open_input, read_blocks, round_up_to_block, DataSource};
use crate::cryptography::generate_iv;
use crate::error::ScpError;
use crate::feistel::{BlockPosition, FeistelCipher};
use crate::networking::{
    receive_block, receive_blocks, receive_declared_size, receive_filename, send_block,
    send_blocks, send_declared_size, send_filename,
};
use crate::utils::TransferReport;
use crate::{BLOCKS_PER_CLUSTER, BLOCK_BYTES, CLUSTER_BYTES};

/// Per-transfer state. One session drives one transfer at a time; every
/// counter is reset when a transfer ends, whether it succeeded or not.
#[derive(Default)]
pub struct Session {
    key: Option<Block>,
    input: Option<(DataSource, u64)>,
    destination_name: String,
    /// Last ciphertext block seen, or the IV before the first cluster
    chain: Block,
    position: BlockPosition,
    stream_offset: u64,
    cluster_hashes: Vec<Block>,
}

/// Offset inside the pad block that holds the meaningful-byte count, derived
/// from the ciphertext block just before the pad.
fn padding_slot(previous: &Block) -> usize {
    Block::digest(previous.as_bytes()).0[0] as usize % BLOCK_BYTES
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn set_key(&mut self, key: Block) {
        self.key = Some(key);
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Opens `input_path` as the plaintext to send. The destination name
    /// defaults to the file's own name if none was set.
    pub fn set_input(&mut self, input_path: &Path) -> Result<(), ScpError> {
        let (reader, size) = open_input(input_path)?;
        if self.destination_name.is_empty() {
            if let Some(name) = input_path.file_name() {
                self.destination_name = name.to_string_lossy().into_owned();
            }
        }
        self.set_input_reader(Box::new(reader), size);
        Ok(())
    }

    /// Uses any reader as the plaintext. `size` must be exactly the number of
    /// bytes the reader will yield.
    pub fn set_input_reader(&mut self, reader: DataSource, size: u64) {
        self.input = Some((reader, size));
    }

    pub fn set_destination_name(&mut self, name: impl Into<String>) {
        self.destination_name = name.into();
    }

    pub fn input_size(&self) -> Option<u64> {
        self.input.as_ref().map(|(_, size)| *size)
    }

    /// Forgets the key, the input and every stream counter.
    pub fn cleanup(&mut self) {
        *self = Session::default();
    }

    /// Sends the configured input over `transport`.
    ///
    /// # Process
    /// 1. Sends the rounded-up length, the destination name and a fresh IV
    /// 2. For each cluster, hashes the plaintext, CBC-encrypts it and sends it;
    ///    the final cluster gets the pad block appended
    /// 3. Sends the hash of all cluster hashes as the trailer
    ///
    /// # Returns
    /// The number of plaintext bytes sent
    pub fn encrypt<W: Write + ?Sized>(&mut self, transport: &mut W) -> Result<u64, ScpError> {
        if self.input.is_none() {
            return Err(ScpError::NoInput);
        }
        let key = self.key.ok_or(ScpError::NoKey)?;
        let (mut source, size) = self.input.take().ok_or(ScpError::NoInput)?;

        let result = self.encrypt_stream(&FeistelCipher::new(key), &mut source, size, transport);
        self.cleanup();
        result
    }

    fn encrypt_stream<W: Write + ?Sized>(
        &mut self,
        cipher: &FeistelCipher,
        source: &mut DataSource,
        size: u64,
        transport: &mut W,
    ) -> Result<u64, ScpError> {
        send_declared_size(transport, round_up_to_block(size))?;
        send_filename(transport, &self.destination_name)?;

        self.chain = generate_iv()?;
        send_block(transport, &self.chain, "sending IV")?;

        loop {
            let last = self.stream_offset + CLUSTER_BYTES as u64 >= size;
            let len = if last {
                (size - self.stream_offset) as usize
            } else {
                CLUSTER_BYTES
            };

            let mut blocks = read_blocks(source, len)?;
            self.stream_offset += len as u64;
            self.cluster_hashes.push(Block::digest_blocks(&blocks));

            self.encrypt_cluster(cipher, &mut blocks, last.then_some(size))?;
            send_blocks(transport, &blocks)?;
            debug!(
                "Sent cluster {} ({} blocks, {} of {} bytes)",
                self.position.cluster - 1,
                blocks.len(),
                self.stream_offset,
                size
            );

            if last {
                break;
            }
        }

        let trailer = Block::digest_blocks(&self.cluster_hashes);
        send_block(transport, &trailer, "sending trailer")?;
        info!(
            "Sent {} bytes in {} clusters",
            size,
            self.cluster_hashes.len()
        );
        Ok(size)
    }

    /// CBC-encrypts one cluster in place. When `total_size` is given this is
    /// the final cluster and the pad block is appended.
    fn encrypt_cluster(
        &mut self,
        cipher: &FeistelCipher,
        blocks: &mut Vec<Block>,
        total_size: Option<u64>,
    ) -> Result<(), ScpError> {
        for i in 0..blocks.len() {
            if i == 0 {
                blocks[0] ^= self.chain;
            } else {
                self.position.block += 1;
                let previous = blocks[i - 1];
                blocks[i] ^= previous;
            }
            cipher.encrypt_block(&mut blocks[i], self.position);
        }
        if let Some(&last) = blocks.last() {
            self.chain = last;
        }

        if let Some(size) = total_size {
            // random filler with the count hidden at a ciphertext-derived slot
            let mut pad = generate_iv()?;
            pad.0[padding_slot(&self.chain)] = (size % BLOCK_BYTES as u64) as u8;
            pad ^= self.chain;
            if !blocks.is_empty() {
                self.position.block += 1;
            }
            cipher.encrypt_block(&mut pad, self.position);
            blocks.try_reserve(1)?;
            blocks.push(pad);
        }

        self.position.cluster += 1;
        Ok(())
    }

    /// Receives one transfer from `transport`.
    ///
    /// `open_output` is called with the sender's filename once the header has
    /// arrived and returns where the plaintext goes.
    ///
    /// # Returns
    /// A report whose `verified` flag says whether the trailer matched. A
    /// mismatch is not an error; the caller decides what to do with the output.
    pub fn decrypt<R, O, F>(&mut self, transport: &mut R, open_output: F) -> Result<TransferReport, ScpError>
    where
        R: Read + ?Sized,
        O: Write,
        F: FnOnce(&str) -> Result<O, ScpError>,
    {
        let key = self.key.ok_or(ScpError::NoKey)?;

        let result = self.decrypt_stream(&FeistelCipher::new(key), transport, open_output);
        self.cleanup();
        result
    }

    fn decrypt_stream<R, O, F>(
        &mut self,
        cipher: &FeistelCipher,
        transport: &mut R,
        open_output: F,
    ) -> Result<TransferReport, ScpError>
    where
        R: Read + ?Sized,
        O: Write,
        F: FnOnce(&str) -> Result<O, ScpError>,
    {
        let declared = receive_declared_size(transport)?;
        if declared % BLOCK_BYTES as u64 != 0 {
            return Err(ScpError::Protocol(format!(
                "declared size {} is not a whole number of blocks",
                declared
            )));
        }

        let filename = receive_filename(transport)?;
        let mut output = open_output(&filename)?;
        self.chain = receive_block(transport, "receiving IV")?;

        let mut bytes_written = 0u64;
        let trailer = loop {
            let remaining = declared - self.stream_offset;

            if remaining > CLUSTER_BYTES as u64 {
                let mut blocks = receive_blocks(transport, BLOCKS_PER_CLUSTER)?;
                self.decrypt_cluster(cipher, &mut blocks);
                self.cluster_hashes.push(Block::digest_blocks(&blocks));

                output
                    .write_all(&blocks_to_bytes(&blocks))
                    .map_err(ScpError::OutputWrite)?;
                self.stream_offset += CLUSTER_BYTES as u64;
                bytes_written += CLUSTER_BYTES as u64;
                debug!(
                    "Received cluster {} ({} of {} bytes)",
                    self.position.cluster - 1,
                    self.stream_offset,
                    declared
                );
                continue;
            }

            // final cluster: real blocks, the pad block, then the trailer
            let real_blocks = (remaining / BLOCK_BYTES as u64) as usize;
            let mut blocks = receive_blocks(transport, real_blocks + 1)?;
            let trailer = receive_block(transport, "receiving trailer")?;

            let before_pad = if real_blocks > 0 {
                blocks[real_blocks - 1]
            } else {
                self.chain
            };
            self.decrypt_cluster(cipher, &mut blocks);
            let pad = blocks.pop().unwrap_or_default();

            // 0 means the whole last block is meaningful
            let count = pad.0[padding_slot(&before_pad)] as u64;
            let meaningful = if count == 0 {
                remaining
            } else {
                (remaining.saturating_sub(BLOCK_BYTES as u64) + count).min(remaining)
            };

            self.cluster_hashes.push(Block::digest_blocks(&blocks));
            let plaintext = blocks_to_bytes(&blocks);
            output
                .write_all(&plaintext[..meaningful as usize])
                .map_err(ScpError::OutputWrite)?;
            self.stream_offset += remaining;
            bytes_written += meaningful;
            break trailer;
        };
        output.flush().map_err(ScpError::OutputWrite)?;

        let verified = Block::digest_blocks(&self.cluster_hashes) == trailer;
        if verified {
            info!("Received {} ({} bytes), integrity verified", filename, bytes_written);
        } else {
            warn!("Received {} ({} bytes), integrity check FAILED", filename, bytes_written);
        }

        Ok(TransferReport {
            filename,
            bytes_written,
            verified,
        })
    }

    /// Inverse CBC over one cluster in place, advancing the chain value.
    fn decrypt_cluster(&mut self, cipher: &FeistelCipher, blocks: &mut [Block]) {
        let mut previous = self.chain;
        for (i, block) in blocks.iter_mut().enumerate() {
            if i > 0 {
                self.position.block += 1;
            }
            let ciphertext = *block;
            cipher.decrypt_block(block, self.position);
            *block ^= previous;
            previous = ciphertext;
        }
        self.chain = previous;
        self.position.cluster += 1;
    }
}
