//! Blockchair transaction dump reader.
//!
//! Dumps are tab separated with no header row and a variable number of
//! columns. Records are read as raw bytes so that junk in columns we never
//! look at cannot fail a run.
//!
//! Quoting is strict: a `"` inside an unquoted field, a quoted field that
//! is followed by anything but a delimiter or line end, and a quoted field
//! still open at end of input all fail the run. The csv crate would accept
//! these and silently merge the following lines into one field.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use thiserror::Error;

use crate::constants::{DEFAULT_DELIMITER, HEIGHT_COLUMN, MIN_ROW_FIELDS, TXID_COLUMN};
use crate::error::{ConvertError, Result};
use crate::txid::Txid;

/// Reader knobs taken from settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    pub delimiter: u8,
    pub quoting: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            quoting: true,
        }
    }
}

/// Quoting violation found while streaming the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuoteFault {
    #[error("bare \" in non-quoted field on line {line}")]
    BareQuote { line: u64 },

    #[error("extraneous or missing \" in quoted field on line {line}")]
    ExtraneousQuote { line: u64 },

    #[error("quoted field opened on line {line} is never closed")]
    Unterminated { line: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw `"` inside a quoted field: either an escape or the closing quote
    QuoteInQuoted,
}

/// Pass-through reader that tracks quote state across the whole stream.
///
/// Violations surface as `io::ErrorKind::InvalidData` wrapping a
/// `QuoteFault`, which `ConvertError::from_csv` turns back into a parse
/// error. Once tripped, every further read fails the same way.
pub struct QuoteGuard<R> {
    inner: R,
    enabled: bool,
    delimiter: u8,
    state: QuoteState,
    line: u64,
    quote_line: u64,
    fault: Option<QuoteFault>,
}

impl<R: Read> QuoteGuard<R> {
    pub fn new(inner: R, options: DumpOptions) -> Self {
        Self {
            inner,
            enabled: options.quoting,
            delimiter: options.delimiter,
            state: QuoteState::FieldStart,
            line: 1,
            quote_line: 1,
            fault: None,
        }
    }

    fn scan(&mut self, bytes: &[u8]) -> std::result::Result<(), QuoteFault> {
        for &b in bytes {
            let end_of_field = b == self.delimiter;
            let end_of_line = b == b'\n' || b == b'\r';

            self.state = match self.state {
                QuoteState::FieldStart if b == b'"' => {
                    self.quote_line = self.line;
                    QuoteState::Quoted
                }
                QuoteState::FieldStart | QuoteState::Unquoted if end_of_field || end_of_line => {
                    QuoteState::FieldStart
                }
                QuoteState::FieldStart | QuoteState::Unquoted if b == b'"' => {
                    return Err(QuoteFault::BareQuote { line: self.line });
                }
                QuoteState::FieldStart | QuoteState::Unquoted => QuoteState::Unquoted,
                QuoteState::Quoted if b == b'"' => QuoteState::QuoteInQuoted,
                QuoteState::Quoted => QuoteState::Quoted,
                QuoteState::QuoteInQuoted if b == b'"' => QuoteState::Quoted,
                QuoteState::QuoteInQuoted if end_of_field || end_of_line => QuoteState::FieldStart,
                QuoteState::QuoteInQuoted => {
                    return Err(QuoteFault::ExtraneousQuote { line: self.line });
                }
            };

            if b == b'\n' {
                self.line += 1;
            }
        }
        Ok(())
    }

    fn trip(&mut self, fault: QuoteFault) -> io::Error {
        self.fault = Some(fault);
        io::Error::new(io::ErrorKind::InvalidData, fault)
    }
}

impl<R: Read> Read for QuoteGuard<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(fault) = self.fault {
            return Err(io::Error::new(io::ErrorKind::InvalidData, fault));
        }

        let n = self.inner.read(buf)?;
        if !self.enabled {
            return Ok(n);
        }

        if n == 0 && self.state == QuoteState::Quoted {
            let line = self.quote_line;
            return Err(self.trip(QuoteFault::Unterminated { line }));
        }
        if let Err(fault) = self.scan(&buf[..n]) {
            return Err(self.trip(fault));
        }
        Ok(n)
    }
}

/// Lazy row iterator over a dump stream
pub struct DumpReader<R> {
    records: ByteRecordsIntoIter<QuoteGuard<R>>,
}

impl DumpReader<File> {
    /// Open a dump file. The handle is closed when the reader is dropped.
    pub fn open(path: &Path, options: DumpOptions) -> Result<Self> {
        let file = File::open(path).map_err(|source| ConvertError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(file, options))
    }
}

impl<R: Read> DumpReader<R> {
    pub fn from_reader(reader: R, options: DumpOptions) -> Self {
        let records = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quoting(options.quoting)
            .has_headers(false)
            .flexible(true)
            .from_reader(QuoteGuard::new(reader, options))
            .into_byte_records();
        Self { records }
    }
}

impl<R: Read> Iterator for DumpReader<R> {
    type Item = Result<DumpRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.map(DumpRow::new).map_err(ConvertError::from_csv))
    }
}

/// One dump record
#[derive(Debug, Clone)]
pub struct DumpRow {
    record: ByteRecord,
}

impl DumpRow {
    pub fn new(record: ByteRecord) -> Self {
        Self { record }
    }

    /// 1-based line the record started on, 0 if unknown
    pub fn line(&self) -> u64 {
        self.record.position().map(|pos| pos.line()).unwrap_or(0)
    }

    pub fn field_count(&self) -> usize {
        self.record.len()
    }

    /// Rows need a height and a txid column to take part
    pub fn is_eligible(&self) -> bool {
        self.field_count() >= MIN_ROW_FIELDS
    }

    pub fn height(&self) -> Option<&[u8]> {
        self.record.get(HEIGHT_COLUMN)
    }

    pub fn txid_field(&self) -> Option<&[u8]> {
        self.record.get(TXID_COLUMN)
    }

    /// Exact byte equality on the height column; "0170" is not "170"
    pub fn matches_height(&self, height: &[u8]) -> bool {
        self.is_eligible() && self.height() == Some(height)
    }

    /// Decode the txid column into internal byte order
    pub fn txid(&self) -> Result<Txid> {
        let field = self.txid_field().unwrap_or_default();
        Txid::from_display_hex(field).map_err(|source| ConvertError::Decode {
            line: self.line(),
            field: String::from_utf8_lossy(field).into_owned(),
            source,
        })
    }
}
