use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can end a transfer session early.
///
/// An integrity mismatch is not an error: decrypt reports it through
/// [`TransferReport::verified`](crate::utils::TransferReport::verified).
#[derive(Debug, Error)]
pub enum ScpError {
    #[error("no session key has been established")]
    NoKey,

    #[error("no input file has been set")]
    NoInput,

    #[error("cannot open input file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open output file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading input: {0}")]
    InputRead(#[source] io::Error),

    #[error("failed writing output: {0}")]
    OutputWrite(#[source] io::Error),

    #[error("transport failed while {context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("OS entropy source unavailable: {0}")]
    Entropy(String),

    #[error("allocation error, sufficient memory might not be available: {0}")]
    Allocation(#[from] TryReserveError),
}

impl ScpError {
    pub(crate) fn transport(context: &'static str) -> impl FnOnce(io::Error) -> ScpError {
        move |source| ScpError::Transport { context, source }
    }
}
