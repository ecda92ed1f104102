//! Error type shared by the dump reader, the converter and the block file writer.
//!
//! Every variant is fatal for a run. `main` prints the `Display` form as a
//! single line on stderr and exits non-zero.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dump::QuoteFault;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The dump file could not be opened
    #[error("failed to open dump {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The dump stream failed mid-read
    #[error("failed to read dump: {source}")]
    Read {
        #[source]
        source: csv::Error,
    },

    /// Delimited-text structure the reader cannot tolerate
    #[error("failed to parse dump: {source}")]
    Parse {
        #[source]
        source: ParseError,
    },

    /// Txid column is not 64 hex characters
    #[error("failed to decode txid {field:?} on line {line}: {source}")]
    Decode {
        line: u64,
        field: String,
        #[source]
        source: hex::FromHexError,
    },

    /// Output (or block file) could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Existing block file could not be read back
    #[error("failed to read block file {}: {source}", path.display())]
    BlockFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Block file size is not a multiple of 32
    #[error("invalid block file {}: {len} bytes is not a whole number of txids", path.display())]
    BlockFile { path: PathBuf, len: u64 },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Why a dump could not be parsed
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Quote(#[from] QuoteFault),

    #[error(transparent)]
    Record(csv::Error),
}

impl ConvertError {
    /// Split csv reader errors into stream failures and malformed records.
    ///
    /// Quoting faults travel through the csv reader as I/O errors and are
    /// unwrapped back into parse errors here.
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let fault = match err.kind() {
            csv::ErrorKind::Io(io_err) => io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<QuoteFault>())
                .copied(),
            _ => None,
        };

        match fault {
            Some(fault) => ConvertError::Parse { source: ParseError::Quote(fault) },
            None if err.is_io_error() => ConvertError::Read { source: err },
            None => ConvertError::Parse { source: ParseError::Record(err) },
        }
    }
}
