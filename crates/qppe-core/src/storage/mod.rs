mod config;
pub mod database;
pub mod prefs;

pub use config::{Config, Defaults, LoggingConfig};
pub use database::{ActivityEntry, Database, PrefGroup};
pub use prefs::{MemoryStore, PreferenceStore, StoredValue};

use std::path::PathBuf;

/// Returns the qPPE data directory, creating it if needed.
///
/// Defaults to `~/.config/qppe/`. Set QPPE_DATA_DIR to use another
/// directory (tests point it at a temporary one).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("QPPE_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("qppe"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
