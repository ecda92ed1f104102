//! Convert Blockchair transaction dumps into per-height `.bin` txid files.
//!
//! ```text
//! dump.tsv --DumpReader--> rows --height filter--> Txid --TxidBuffer--> <height>.bin
//! ```

pub mod block_file;
pub mod config;
pub mod constants;
pub mod convert;
pub mod dump;
pub mod error;
pub mod telemetry;
pub mod txid;


pub use block_file::{read_block_file, write_block_file, TxidBuffer};
pub use convert::{ConvertReport, ConvertStats, Converter};
pub use error::{ConvertError, Result};
pub use txid::Txid;
