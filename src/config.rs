//! Command-line arguments and the resolved runtime configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;
use tracing::Level;

/// Folder name used beneath the user's home directory for library data.
const DATA_DIR_NAME: &str = ".city-library";
/// Log file written inside the data directory.
const LOG_FILE_NAME: &str = "library.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "City library catalog and membership manager")]
pub struct Args {
    /// Directory holding books.txt and members.txt
    #[arg(short, long, env = "CITY_LIBRARY_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG when set
    #[arg(long, default_value = "info")]
    pub log_level: Level,
}

/// Settings the binary runs with once defaults are filled in.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let data_dir = match args.data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Self {
            data_dir,
            log_level: args.log_level,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// Resolve the data directory inside the user's home.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
