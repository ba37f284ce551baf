use std::error::Error;
use std::fs;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::bytes::{create_file_bufwriter, resolve_output_path};
use crate::cryptography::exchange_key_server;
use crate::error::ScpError;
use crate::networking::{accept_connection, bind_listener};
use crate::stream::Session;
use crate::utils::{Throughput, TransferReport};
use crate::LISTENING_PORT;

/// Function handler for the receiving side:
///     - Bind the listening port
///     - Accept one peer at a time; each connection is fully handled
///       (key exchange, decrypt, close) before the next is accepted
///     - Report whether the trailer verified, deleting unverified output
///       unless asked to keep it
///
/// With `multiple` set, a failed session is reported and the loop keeps
/// listening. Otherwise the first session's error is returned.
pub async fn run(
    port: u16,
    multiple: bool,
    output_dir: PathBuf,
    keep_unverified: bool,
) -> Result<(), Box<dyn Error>> {
    let port = if port == 0 { LISTENING_PORT } else { port };
    let listener = bind_listener(port).await?;
    println!(
        "Listening for {} on port {}",
        if multiple { "multiple files" } else { "a file" },
        port
    );

    loop {
        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Waiting to receive file");

        let (stream, peer) = accept_connection(&listener).await?;
        spinner.finish_and_clear();
        info!("Receiving from {}", peer);

        let session_dir = output_dir.clone();
        let started = Instant::now();
        let outcome =
            tokio::task::spawn_blocking(move || receive_session(stream, &session_dir)).await;

        match outcome {
            Ok(Ok(report)) => {
                print_outcome(&report, started.elapsed());
                if !report.verified && !keep_unverified {
                    discard(&output_dir, &report.filename);
                }
            }
            Ok(Err(e)) if multiple => eprintln!("\n******\n{}\n******\n", e),
            Ok(Err(e)) => return Err(e.into()),
            Err(e) if multiple => {
                eprintln!("\n******\nUnspecified failure in session: {}\n******\n", e)
            }
            Err(e) => return Err(e.into()),
        }

        if !multiple {
            break;
        }
    }

    Ok(())
}

fn receive_session(mut stream: TcpStream, output_dir: &Path) -> Result<TransferReport, ScpError> {
    debug!("Performing key exchange");
    let mut session = Session::new();
    session.set_key(exchange_key_server(&mut stream)?);

    session.decrypt(&mut stream, |filename| {
        create_file_bufwriter(&resolve_output_path(output_dir, filename)?)
    })
}

fn print_outcome(report: &TransferReport, elapsed: Duration) {
    if report.verified {
        println!("File {} was successfully received", report.filename);
        println!("{}", Throughput::measure(report.bytes_written, elapsed));
    } else {
        println!("File {} was not successfully received", report.filename);
    }
}

fn discard(output_dir: &Path, filename: &str) {
    let path = match resolve_output_path(output_dir, filename) {
        Ok(path) => path,
        Err(e) => {
            warn!("Not removing unverified file: {}", e);
            return;
        }
    };
    match fs::remove_file(&path) {
        Ok(()) => info!("Removed unverified file {}", path.display()),
        Err(e) => warn!("Could not remove unverified file {}: {}", path.display(), e),
    }
}
