use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use dump2bin::config::{get_global_config, init_global_config};
use dump2bin::telemetry::{init_tracing, TelemetryConfig};
use dump2bin::{Converter, Result};

#[derive(Parser, Debug)]
#[clap(name = "dump2bin")]
#[clap(about = "Extract one block's txids from a Blockchair transaction dump into <height>.bin", long_about = None)]
struct Args {
    /// Tab-separated transaction dump (e.g. from gz.blockchair.com, decompressed)
    dump_file: PathBuf,

    /// Block height, matched as exact text against the dump's first column
    block_height: String,

    /// Directory for <height>.bin (defaults to output_dir from config, else cwd)
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Anything after the height is accepted and ignored
    #[clap(hide = true)]
    _extra: Vec<String>,
}

fn run(args: &Args) -> Result<()> {
    init_global_config()?;
    let settings = get_global_config()?;

    let mut converter = Converter::from_settings(settings)?;
    if let Some(dir) = &args.output_dir {
        converter = converter.with_output_dir(dir.clone());
    }

    let report = converter.run(&args.dump_file, &args.block_height)?;
    debug!(
        output = %report.output.display(),
        bytes = report.bytes_written,
        "Done"
    );
    Ok(())
}

fn main() -> ExitCode {
    // Missing arguments exit here with clap's usage text, before any I/O
    let args = Args::parse();

    let _log_guard = match init_tracing(TelemetryConfig::default()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Conversion failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positionals() {
        let args = Args::try_parse_from(["dump2bin", "dump.tsv", "170"]).unwrap();
        assert_eq!(args.dump_file, PathBuf::from("dump.tsv"));
        assert_eq!(args.block_height, "170");
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn test_extra_arguments_ignored() {
        let args = Args::try_parse_from(["dump2bin", "dump.tsv", "170", "extra", "args"]).unwrap();
        assert_eq!(args.block_height, "170");
    }

    #[test]
    fn test_missing_height_is_usage_error() {
        let err = Args::try_parse_from(["dump2bin", "dump.tsv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_output_dir_flag() {
        let args =
            Args::try_parse_from(["dump2bin", "--output-dir", "/tmp/out", "dump.tsv", "170"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
    }
}
