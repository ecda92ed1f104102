pub use config::{Config, Environment, File as ConfigFile};
pub use once_cell::sync::OnceCell;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_DELIMITER, ENV_PREFIX};
use crate::dump::DumpOptions;
use crate::error::{ConvertError, Result};

static GLOBAL_CONFIG: OnceCell<Settings> = OnceCell::new();

/// Converter settings.
///
/// Layered as: built-in defaults, then an optional `dump2bin.toml` in the
/// working directory, then `DUMP2BIN_*` environment variables. With no file
/// and no variables the defaults reproduce the plain `<dump> <height>` run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Single ASCII field separator
    pub delimiter: String,
    /// Honor double-quote quoting in the dump
    pub quoting: bool,
    /// Where `<height>.bin` is written
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delimiter: (DEFAULT_DELIMITER as char).to_string(),
            quoting: true,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from the optional file in the working directory
    pub fn load() -> Result<Self> {
        Self::build(ConfigFile::with_name(CONFIG_FILE_NAME).required(false))
    }

    /// Load settings from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(ConfigFile::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let config = Config::builder()
            .set_default("delimiter", defaults.delimiter)?
            .set_default("quoting", defaults.quoting)?
            .set_default("output_dir", defaults.output_dir.to_string_lossy().into_owned())?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        // Reject a bad delimiter before any I/O happens
        settings.delimiter_byte()?;
        Ok(settings)
    }

    /// The delimiter as the single byte the csv reader wants
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ConvertError::InvalidSetting(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }

    pub fn dump_options(&self) -> Result<DumpOptions> {
        Ok(DumpOptions {
            delimiter: self.delimiter_byte()?,
            quoting: self.quoting,
        })
    }
}

pub fn init_global_config() -> Result<()> {
    let settings = Settings::load()?;
    GLOBAL_CONFIG
        .set(settings)
        .map_err(|_| ConvertError::InvalidSetting("config already set".to_string()))?;
    Ok(())
}

pub fn get_global_config() -> Result<&'static Settings> {
    GLOBAL_CONFIG
        .get()
        .ok_or_else(|| ConvertError::InvalidSetting("config not initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.delimiter, "\t");
        assert!(settings.quoting);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn test_delimiter_validation() {
        let mut settings = Settings::default();

        settings.delimiter = ",".to_string();
        assert_eq!(settings.delimiter_byte().unwrap(), b',');

        settings.delimiter = "".to_string();
        assert!(matches!(settings.delimiter_byte(), Err(ConvertError::InvalidSetting(_))));

        settings.delimiter = "ab".to_string();
        assert!(matches!(settings.delimiter_byte(), Err(ConvertError::InvalidSetting(_))));

        settings.delimiter = "é".to_string();
        assert!(matches!(settings.delimiter_byte(), Err(ConvertError::InvalidSetting(_))));
    }

    #[test]
    fn test_dump_options() {
        let mut settings = Settings::default();
        settings.quoting = false;
        let options = settings.dump_options().unwrap();
        assert_eq!(options.delimiter, b'\t');
        assert!(!options.quoting);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "delimiter = \",\"\nquoting = false\noutput_dir = \"/tmp/blocks\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.delimiter, ",");
        assert!(!settings.quoting);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/blocks"));
    }

    #[test]
    fn test_load_from_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "output_dir = \"out\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.delimiter, "\t");
        assert!(settings.quoting);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_load_from_file_bad_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "delimiter = \"::\"\n").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(ConvertError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(Settings::load_from(&path), Err(ConvertError::Config(_))));
    }
}
