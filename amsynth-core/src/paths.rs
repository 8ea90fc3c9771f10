//! Where banks live on disk.

use std::path::{Path, PathBuf};

use crate::bank::BankDirectory;
use crate::config::Config;

/// File name of a user directory's primary bank.
pub const DEFAULT_BANK_FILE: &str = "default";

const FACTORY_BANKS_DIR: &str = match option_env!("AMSYNTH_FACTORY_BANKS") {
    Some(dir) => dir,
    None => "/usr/share/amsynth/banks",
};

/// Writable per-user bank directory (`~/.amsynth/banks` unless configured).
pub fn user_banks_dir(config: &Config) -> PathBuf {
    if let Some(dir) = config.user_banks_dir() {
        return expand_home(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".amsynth")
        .join("banks")
}

/// Read-only directory of banks shipped with the instrument.
pub fn factory_banks_dir(config: &Config) -> PathBuf {
    match config.factory_banks_dir() {
        Some(dir) => expand_home(dir),
        None => PathBuf::from(FACTORY_BANKS_DIR),
    }
}

pub fn default_bank_path(config: &Config) -> PathBuf {
    user_banks_dir(config).join(DEFAULT_BANK_FILE)
}

/// The user and factory directories in scan order, with the factory
/// directory dropped when both resolve to the same place (e.g. an install
/// prefix under the user's home).
pub fn bank_directories(config: &Config) -> Vec<BankDirectory> {
    dedup_directories(vec![
        BankDirectory::writable(user_banks_dir(config)),
        BankDirectory::read_only(factory_banks_dir(config)),
    ])
}

/// Remove directories that resolve to one already listed; the first
/// occurrence wins.
pub fn dedup_directories(directories: Vec<BankDirectory>) -> Vec<BankDirectory> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut result = Vec::new();
    for dir in directories {
        let key = canonical(&dir.path);
        if seen.contains(&key) {
            log::debug!(target: "bank", "skipping duplicate directory {}", dir.path.display());
            continue;
        }
        seen.push(key);
        result.push(dir);
    }
    result
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
