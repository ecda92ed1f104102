//! Block File Writer and Reader
//!
//! A block file (`<height>.bin`) is a flat concatenation of 32-byte txids in
//! internal byte order: no header, no length prefix, no checksum.
//!
//! Writes are all-or-nothing. The bytes go to a sibling `<height>.bin.tmp`,
//! are synced, and the temp file is renamed over the target. A crash or a
//! failed write therefore never leaves a truncated block file behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{is_whole_txid_len, BLOCK_FILE_EXTENSION, TEMP_FILE_SUFFIX, TXID_LEN};
use crate::error::{ConvertError, Result};
use crate::txid::Txid;

/// Append-only accumulator of internal-order txids
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TxidBuffer {
    bytes: Vec<u8>,
}

impl TxidBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, txid: &Txid) {
        self.bytes.extend_from_slice(txid.as_bytes());
    }

    /// Number of txids held
    pub fn txid_count(&self) -> usize {
        self.bytes.len() / TXID_LEN
    }

    /// Byte length, always a multiple of 32
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = Txid> + '_ {
        self.bytes.chunks_exact(TXID_LEN).map(txid_from_chunk)
    }
}

/// `<height>.bin`, using the height text verbatim
pub fn block_file_name(height: &str) -> String {
    format!("{}.{}", height, BLOCK_FILE_EXTENSION)
}

pub fn block_file_path(dir: &Path, height: &str) -> PathBuf {
    dir.join(block_file_name(height))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Create or truncate `path`, owner rw and world r on unix
fn create_output(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = create_output(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Atomically write the buffer to `path`, replacing any existing file
pub fn write_block_file(path: &Path, buffer: &TxidBuffer) -> Result<()> {
    let tmp = temp_path(path);

    let result = write_synced(&tmp, buffer.as_bytes()).and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = result {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp block file");
            }
        }
        return Err(ConvertError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!(
        path = %path.display(),
        txids = buffer.txid_count(),
        bytes = buffer.len(),
        "Block file written"
    );
    Ok(())
}

/// Load a block file back into txids, rejecting partial trailing entries
pub fn read_block_file(path: &Path) -> Result<Vec<Txid>> {
    let bytes = fs::read(path).map_err(|source| ConvertError::BlockFileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let len = bytes.len() as u64;
    if !is_whole_txid_len(len) {
        return Err(ConvertError::BlockFile {
            path: path.to_path_buf(),
            len,
        });
    }

    Ok(bytes.chunks_exact(TXID_LEN).map(txid_from_chunk).collect())
}

fn txid_from_chunk(chunk: &[u8]) -> Txid {
    let mut bytes = [0u8; TXID_LEN];
    bytes.copy_from_slice(chunk);
    Txid::from_internal_bytes(bytes)
}
