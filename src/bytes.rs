use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::block::Block;
use crate::error::ScpError;
use crate::BLOCK_BYTES;

/// Anything the sender can stream plaintext from.
pub type DataSource = Box<dyn Read + Send>;

/// Opens a file for sending.
///
/// # Arguments
/// * `input_path` - File to read
///
/// # Returns
/// A buffered reader over the file and the file's size in bytes
pub fn open_input(input_path: &Path) -> Result<(BufReader<File>, u64), ScpError> {
    let open_error = |source| ScpError::InputOpen {
        path: input_path.to_path_buf(),
        source,
    };
    let file = File::open(input_path).map_err(open_error)?;
    let size = file.metadata().map_err(open_error)?.len();
    debug!("Opened input {} ({} bytes)", input_path.display(), size);
    Ok((BufReader::new(file), size))
}

/// Creates a buffered writer for a new file at the specified path.
///
/// The file is created (or truncated if it exists) and opened for writing.
///
/// # Arguments
/// * `output_path` - Path where the file should be created
///
/// # Returns
/// A BufWriter for efficient file writing
pub fn create_file_bufwriter(output_path: &Path) -> Result<BufWriter<File>, ScpError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_path)
        .map_err(|source| ScpError::OutputOpen {
            path: output_path.to_path_buf(),
            source,
        })?;
    debug!("Writing to file: {}", output_path.display());

    Ok(BufWriter::new(file))
}

/// Places a peer-supplied filename inside `output_dir`.
///
/// Only plain relative names are accepted. Absolute paths, `..`, `.` and
/// empty names are rejected so a sender cannot write outside the directory.
pub fn resolve_output_path(output_dir: &Path, filename: &str) -> Result<PathBuf, ScpError> {
    let relative = Path::new(filename);
    let mut components = relative.components().peekable();
    if components.peek().is_none()
        || !components.all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(ScpError::Protocol(format!(
            "refusing unsafe filename {:?}",
            filename
        )));
    }
    Ok(output_dir.join(relative))
}

/// Rounds a byte count up to whole blocks.
pub fn round_up_to_block(size: u64) -> u64 {
    size.div_ceil(BLOCK_BYTES as u64) * BLOCK_BYTES as u64
}

/// Reads exactly `len` bytes of plaintext and packs them into blocks, the
/// last one zero-filled.
///
/// # Arguments
/// * `data_source` - Plaintext reader
/// * `len` - Bytes to take; the source running dry first is an error
pub fn read_blocks<R: Read + ?Sized>(data_source: &mut R, len: usize) -> Result<Vec<Block>, ScpError> {
    let block_count = len.div_ceil(BLOCK_BYTES);
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(block_count * BLOCK_BYTES)?;
    buffer.resize(block_count * BLOCK_BYTES, 0);

    data_source
        .read_exact(&mut buffer[..len])
        .map_err(ScpError::InputRead)?;

    Ok(buffer.chunks_exact(BLOCK_BYTES).map(Block::from_slice).collect())
}

/// Flattens blocks back into bytes.
pub fn blocks_to_bytes(blocks: &[Block]) -> Vec<u8> {
    blocks.iter().flat_map(|block| block.0).collect()
}
