//! Dump Format and Block File Constants
//!
//! Column positions, identifier sizes and file naming shared by the reader,
//! the converter and the block file writer. Use these instead of magic numbers.

/// Size of a transaction id in bytes
pub const TXID_LEN: usize = 32;

/// Length of a hex-encoded transaction id (two characters per byte)
pub const TXID_HEX_LEN: usize = TXID_LEN * 2;

/// Column holding the block height, compared as exact text
pub const HEIGHT_COLUMN: usize = 0;

/// Column holding the display-order hex txid
pub const TXID_COLUMN: usize = 1;

/// Rows with fewer fields than this are skipped
pub const MIN_ROW_FIELDS: usize = 2;

/// Blockchair dumps are tab separated
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Extension of the per-height output file (`<height>.bin`)
pub const BLOCK_FILE_EXTENSION: &str = "bin";

/// Suffix of the sibling file written before the final rename
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Base name of the optional settings file in the working directory
pub const CONFIG_FILE_NAME: &str = "dump2bin";

/// Prefix for environment variable overrides (`DUMP2BIN_OUTPUT_DIR`, ...)
pub const ENV_PREFIX: &str = "DUMP2BIN";

/// Emit a progress event every N dump rows
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000_000;

/// Check if a block file length holds a whole number of txids
#[inline]
pub fn is_whole_txid_len(len: u64) -> bool {
    len % TXID_LEN as u64 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txid_sizes() {
        assert_eq!(TXID_LEN, 32);
        assert_eq!(TXID_HEX_LEN, 64);
    }

    #[test]
    fn test_columns() {
        assert!(HEIGHT_COLUMN < MIN_ROW_FIELDS);
        assert!(TXID_COLUMN < MIN_ROW_FIELDS);
        assert_ne!(HEIGHT_COLUMN, TXID_COLUMN);
    }

    #[test]
    fn test_whole_txid_len() {
        assert!(is_whole_txid_len(0));
        assert!(is_whole_txid_len(32));
        assert!(is_whole_txid_len(64_000));
        assert!(!is_whole_txid_len(31));
        assert!(!is_whole_txid_len(33));
    }
}
