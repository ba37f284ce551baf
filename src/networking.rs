use std::error::Error;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use log::debug;
use tokio::net::{TcpListener, TcpStream};

use crate::block::Block;
use crate::error::ScpError;
use crate::{BLOCK_BYTES, MAX_FILENAME_BYTES};

/// Binds the receiving side on every interface.
pub async fn bind_listener(port: u16) -> Result<TcpListener, Box<dyn Error>> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    debug!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Waits for the next peer and hands its connection back in blocking mode,
/// ready to be driven from a blocking task.
pub async fn accept_connection(
    listener: &TcpListener,
) -> Result<(std::net::TcpStream, SocketAddr), Box<dyn Error>> {
    let (stream, peer) = listener.accept().await?;
    debug!("Accepted connection from {}", peer);
    Ok((into_blocking(stream)?, peer))
}

/// Connects to a listening peer and returns the connection in blocking mode.
pub async fn connect(addr: &str, port: u16) -> Result<std::net::TcpStream, Box<dyn Error>> {
    let stream = TcpStream::connect((addr, port)).await?;
    debug!("Connected to {}", stream.peer_addr()?);
    Ok(into_blocking(stream)?)
}

fn into_blocking(stream: TcpStream) -> io::Result<std::net::TcpStream> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Sends every byte of `bytes` or fails.
pub fn send_bytes<W: Write + ?Sized>(
    transport: &mut W,
    bytes: &[u8],
    context: &'static str,
) -> Result<(), ScpError> {
    transport
        .write_all(bytes)
        .map_err(ScpError::transport(context))
}

/// Fills `buffer` completely from the transport or fails.
pub fn receive_bytes<R: Read + ?Sized>(
    transport: &mut R,
    buffer: &mut [u8],
    context: &'static str,
) -> Result<(), ScpError> {
    transport
        .read_exact(buffer)
        .map_err(ScpError::transport(context))
}

/// Writes the plaintext length rounded up to whole blocks (8 bytes, little-endian).
pub fn send_declared_size<W: Write + ?Sized>(transport: &mut W, size: u64) -> Result<(), ScpError> {
    debug!("Sending declared size: {} bytes", size);
    send_bytes(transport, &size.to_le_bytes(), "sending declared size")
}

pub fn receive_declared_size<R: Read + ?Sized>(transport: &mut R) -> Result<u64, ScpError> {
    let mut buffer = [0u8; 8];
    receive_bytes(transport, &mut buffer, "receiving declared size")?;
    let size = u64::from_le_bytes(buffer);
    debug!("Received declared size: {} bytes", size);
    Ok(size)
}

/// Writes a 4-byte little-endian length followed by the name's bytes.
/// Names longer than [`MAX_FILENAME_BYTES`] are cut to that many bytes.
pub fn send_filename<W: Write + ?Sized>(transport: &mut W, name: &str) -> Result<(), ScpError> {
    let bytes = &name.as_bytes()[..name.len().min(MAX_FILENAME_BYTES)];
    send_bytes(
        transport,
        &(bytes.len() as u32).to_le_bytes(),
        "sending filename length",
    )?;
    send_bytes(transport, bytes, "sending filename")
}

/// Reads a length-prefixed filename. An out-of-range length is folded back
/// under [`MAX_FILENAME_BYTES`] rather than trusted.
pub fn receive_filename<R: Read + ?Sized>(transport: &mut R) -> Result<String, ScpError> {
    let mut length = [0u8; 4];
    receive_bytes(transport, &mut length, "receiving filename length")?;
    let mut length = u32::from_le_bytes(length) as usize;
    if length > MAX_FILENAME_BYTES {
        length %= MAX_FILENAME_BYTES;
    }

    let mut name = vec![0u8; length];
    receive_bytes(transport, &mut name, "receiving filename")?;
    Ok(String::from_utf8_lossy(&name).into_owned())
}

pub fn send_block<W: Write + ?Sized>(
    transport: &mut W,
    block: &Block,
    context: &'static str,
) -> Result<(), ScpError> {
    send_bytes(transport, block.as_bytes(), context)
}

pub fn receive_block<R: Read + ?Sized>(
    transport: &mut R,
    context: &'static str,
) -> Result<Block, ScpError> {
    let mut block = Block::default();
    receive_bytes(transport, &mut block.0, context)?;
    Ok(block)
}

/// Sends a run of blocks as one write.
pub fn send_blocks<W: Write + ?Sized>(transport: &mut W, blocks: &[Block]) -> Result<(), ScpError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(blocks.len() * BLOCK_BYTES)?;
    for block in blocks {
        buffer.extend_from_slice(block.as_bytes());
    }
    send_bytes(transport, &buffer, "sending cluster")
}

/// Receives exactly `count` blocks.
pub fn receive_blocks<R: Read + ?Sized>(
    transport: &mut R,
    count: usize,
) -> Result<Vec<Block>, ScpError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(count * BLOCK_BYTES)?;
    buffer.resize(count * BLOCK_BYTES, 0);
    receive_bytes(transport, &mut buffer, "receiving cluster")?;
    Ok(buffer.chunks_exact(BLOCK_BYTES).map(Block::from_slice).collect())
}
