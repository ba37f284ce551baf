use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use feistelcp::LISTENING_PORT;

#[derive(Parser)]
#[command(name = "feistelcp")]
#[command(about = "Encrypted point-to-point file transfer", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a file to a listening peer
    Send {
        /// Path to the file to send
        file_path: String,
        /// Name the receiver should store the file under (default: the file's own name)
        #[arg(short, long)]
        name: Option<String>,
        /// Address of the receiving peer
        #[arg(short, long, default_value = "127.0.0.1")]
        addr: String,
        /// Port the receiver listens on (0 picks the default)
        #[arg(short, long, default_value_t = LISTENING_PORT)]
        port: u16,
    },
    /// Listen for incoming files
    Receive {
        /// Port to listen on (0 picks the default)
        #[arg(short, long, default_value_t = LISTENING_PORT)]
        port: u16,
        /// Keep accepting files until interrupted
        #[arg(short, long)]
        multiple: bool,
        /// Directory received files are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Keep files whose integrity check failed
        #[arg(long)]
        keep_unverified: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Configure logging based on verbose flag
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        log::info!("Verbose logging enabled");
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    match cli.command {
        Commands::Send {
            file_path,
            name,
            addr,
            port,
        } => {
            feistelcp::commands::send::run(&file_path, name, &addr, port).await?;
        }
        Commands::Receive {
            port,
            multiple,
            output_dir,
            keep_unverified,
        } => {
            feistelcp::commands::receive::run(port, multiple, output_dir, keep_unverified).await?;
        }
    }

    Ok(())
}
