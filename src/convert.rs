//! Dump → block file conversion.
//!
//! One pass over the dump: skip short rows, keep rows whose height column
//! equals the requested height exactly, decode and reverse their txids, and
//! write everything to `<height>.bin` once the input is exhausted. Any error
//! while reading drops the accumulated txids and nothing is written.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::block_file::{block_file_path, write_block_file, TxidBuffer};
use crate::config::Settings;
use crate::constants::PROGRESS_LOG_INTERVAL;
use crate::dump::{DumpOptions, DumpReader};
use crate::error::Result;
use crate::telemetry::{truncate_hex, ProgressCounter};

/// Row tallies for one pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConvertStats {
    pub rows_read: u64,
    /// Rows with fewer than two fields
    pub rows_short: u64,
    pub rows_matched: u64,
}

/// Result of the reading phase
#[derive(Debug, Clone)]
pub struct Conversion {
    pub txids: TxidBuffer,
    pub stats: ConvertStats,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub stats: ConvertStats,
    pub bytes_written: usize,
}

pub struct Converter {
    options: DumpOptions,
    output_dir: PathBuf,
}

impl Converter {
    pub fn new(options: DumpOptions, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.dump_options()?, settings.output_dir.clone()))
    }

    /// Replace the output directory, e.g. from a command line override
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read the dump at `path` and return the reversed txids for `height`
    pub fn convert(&self, path: &Path, height: &str) -> Result<TxidBuffer> {
        Ok(self.convert_file(path, height)?.txids)
    }

    fn convert_file(&self, path: &Path, height: &str) -> Result<Conversion> {
        let reader = DumpReader::open(path, self.options)?;
        collect_txids(reader, height)
    }

    /// Same as `convert` for an already open stream
    pub fn convert_reader<R: Read>(&self, reader: R, height: &str) -> Result<Conversion> {
        collect_txids(DumpReader::from_reader(reader, self.options), height)
    }

    /// Convert and write `<height>.bin` into the output directory
    pub fn run(&self, path: &Path, height: &str) -> Result<ConvertReport> {
        info!(dump = %path.display(), height = height, "Conversion start");

        let Conversion { txids, stats } = self.convert_file(path, height)?;

        if stats.rows_matched == 0 {
            info!(height = height, rows_read = stats.rows_read, "No transactions found for height");
        }

        let output = block_file_path(&self.output_dir, height);
        write_block_file(&output, &txids)?;

        info!(
            output = %output.display(),
            rows_read = stats.rows_read,
            rows_short = stats.rows_short,
            txids = stats.rows_matched,
            "Conversion complete"
        );

        Ok(ConvertReport {
            output,
            stats,
            bytes_written: txids.len(),
        })
    }
}

/// Drain the reader, keeping txids of rows at `height` in row order
pub fn collect_txids<R: Read>(reader: DumpReader<R>, height: &str) -> Result<Conversion> {
    let height = height.as_bytes();
    let progress = ProgressCounter::new(PROGRESS_LOG_INTERVAL);
    let mut stats = ConvertStats::default();
    let mut txids = TxidBuffer::new();

    for row in reader {
        let row = row?;
        stats.rows_read += 1;
        if progress.should_log() {
            debug!(rows_read = stats.rows_read, txids = stats.rows_matched, "Progress");
        }

        if !row.is_eligible() {
            stats.rows_short += 1;
            continue;
        }
        if !row.matches_height(height) {
            continue;
        }

        let txid = row.txid()?;
        debug!(line = row.line(), txid = %truncate_hex(&txid.to_display_hex(), 16), "Matched");
        txids.push(&txid);
        stats.rows_matched += 1;
    }

    Ok(Conversion { txids, stats })
}
