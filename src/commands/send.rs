use std::error::Error;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::bytes::open_input;
use crate::cryptography::exchange_key_client;
use crate::error::ScpError;
use crate::networking::connect;
use crate::stream::Session;
use crate::utils::Throughput;
use crate::LISTENING_PORT;

/// Function handler to kickoff sender logic:
///     - Open the input file and wrap it in a progress bar
///     - Connect to the listening peer
///     - Run the key exchange (client side sends first)
///     - Encrypt and stream the file, then print the average throughput
///
/// A `port` of 0 means the default listening port.
pub async fn run(
    file_path: &str,
    destination_name: Option<String>,
    addr: &str,
    port: u16,
) -> Result<(), Box<dyn Error>> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Err(format!("Not a file: {}", file_path).into());
    }
    let port = if port == 0 { LISTENING_PORT } else { port };

    let destination_name = destination_name
        .or_else(|| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| file_path.to_string());

    let (reader, file_size) = open_input(path)?;
    debug!("Sending {} ({} bytes) as {}", file_path, file_size, destination_name);

    let bar = ProgressBar::new(file_size);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {bytes}/{total_bytes} ({bytes_per_sec})")?,
    );

    let mut session = Session::new();
    session.set_destination_name(destination_name);
    session.set_input_reader(Box::new(bar.wrap_read(reader)), file_size);

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Connecting to {}:{}", addr, port));
    let stream = connect(addr, port).await?;
    spinner.finish_and_clear();

    // The session is blocking I/O end to end, so it runs off the async workers
    let started = Instant::now();
    let sent = tokio::task::spawn_blocking(move || send_session(stream, session)).await??;
    bar.finish();

    println!("{}", Throughput::measure(sent, started.elapsed()));
    debug!("Transfer completed successfully");
    Ok(())
}

fn send_session(mut stream: TcpStream, mut session: Session) -> Result<u64, ScpError> {
    debug!("Performing key exchange");
    session.set_key(exchange_key_client(&mut stream)?);

    let sent = session.encrypt(&mut stream)?;
    stream
        .flush()
        .map_err(ScpError::transport("flushing connection"))?;
    Ok(sent)
}
