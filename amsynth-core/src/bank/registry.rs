use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use amsynth_types::PresetBank;
use serde::Serialize;

use super::codec;
use crate::error::BankError;
use crate::paths::DEFAULT_BANK_FILE;

/// Label for a directory's `default` bank when none is configured.
pub const DEFAULT_USER_BANK_LABEL: &str = "User bank";

/// Extension given to banks created through [`BankRegistry::create_bank`].
pub const BANK_EXTENSION: &str = "bank";

/// A directory to scan for banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankDirectory {
    pub path: PathBuf,
    pub read_only: bool,
}

impl BankDirectory {
    pub fn writable(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), read_only: false }
    }

    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), read_only: true }
    }
}

/// Catalogue entry for one bank file, including its parsed contents.
#[derive(Debug, Clone, Serialize)]
pub struct BankInfo {
    pub name: String,
    pub file_path: PathBuf,
    pub read_only: bool,
    /// Modification time observed when the file was scanned.
    #[serde(skip)]
    pub modified: Option<SystemTime>,
    #[serde(skip)]
    pub presets: PresetBank,
}

/// Process-wide catalogue of bank files, shared by handle.
///
/// The catalogue is built on first access and only ever replaced whole by
/// [`rescan`](Self::rescan); readers hold an `Arc` to a complete catalogue.
pub struct BankRegistry {
    directories: Vec<BankDirectory>,
    user_bank_label: String,
    catalogue: RwLock<Option<Arc<[BankInfo]>>>,
}

impl BankRegistry {
    /// `directories` are scanned in order and should already be
    /// deduplicated (see [`crate::paths::bank_directories`]).
    pub fn new(directories: Vec<BankDirectory>) -> Self {
        Self::with_label(directories, DEFAULT_USER_BANK_LABEL)
    }

    pub fn with_label(directories: Vec<BankDirectory>, user_bank_label: impl Into<String>) -> Self {
        Self {
            directories,
            user_bank_label: user_bank_label.into(),
            catalogue: RwLock::new(None),
        }
    }

    pub fn directories(&self) -> &[BankDirectory] {
        &self.directories
    }

    /// The current catalogue, scanning on first use.
    pub fn banks(&self) -> Arc<[BankInfo]> {
        if let Some(banks) = self
            .catalogue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(banks);
        }
        let mut slot = self.catalogue.write().unwrap_or_else(PoisonError::into_inner);
        // another caller may have scanned while we waited for the write lock
        if let Some(banks) = slot.as_ref() {
            return Arc::clone(banks);
        }
        let banks: Arc<[BankInfo]> = scan(&self.directories, &self.user_bank_label).into();
        *slot = Some(Arc::clone(&banks));
        banks
    }

    /// Rebuild the catalogue from disk and swap it in.
    pub fn rescan(&self) -> Arc<[BankInfo]> {
        let banks: Arc<[BankInfo]> = scan(&self.directories, &self.user_bank_label).into();
        *self.catalogue.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&banks));
        banks
    }

    /// Index of the catalogued bank stored at `path`.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.banks().iter().position(|bank| bank.file_path == path)
    }

    pub fn get(&self, index: usize) -> Option<BankInfo> {
        self.banks().get(index).cloned()
    }

    /// Create an empty bank named `name` in the first writable directory.
    /// Fails if the file already exists. The catalogue is not rescanned.
    pub fn create_bank(&self, name: &str) -> Result<PathBuf, BankError> {
        let dir = self
            .directories
            .iter()
            .find(|dir| !dir.read_only)
            .ok_or(BankError::NoWritableDirectory)?;
        let path = dir.path.join(format!("{}.{}", name, BANK_EXTENSION));
        create_empty_bank(&path)?;
        log::info!(target: "bank", "created bank {}", path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for BankRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankRegistry")
            .field("directories", &self.directories)
            .finish_non_exhaustive()
    }
}

/// Write an empty bank at `path`, refusing to overwrite anything.
pub fn create_empty_bank(path: &Path) -> Result<(), BankError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => BankError::AlreadyExists(path.to_path_buf()),
            _ => BankError::io(path, e),
        })?;
    file.write_all(codec::empty_bank().as_bytes())
        .map_err(|e| BankError::io(path, e))
}

/// Display name for a bank file: the directory's `default` file gets
/// `user_bank_label`; otherwise everything from the first `.` is dropped.
/// Underscores become spaces.
pub fn display_name(file_name: &str, user_bank_label: &str) -> String {
    let base = if file_name == DEFAULT_BANK_FILE {
        user_bank_label
    } else {
        match file_name.find('.') {
            Some(pos) => &file_name[..pos],
            None => file_name,
        }
    };
    base.replace('_', " ")
}

/// Scan `directories` in order and build a fresh catalogue.
///
/// Within a directory the `default` bank comes first, then the rest in
/// byte-wise file name order. Unreadable directories are skipped.
pub fn scan(directories: &[BankDirectory], user_bank_label: &str) -> Vec<BankInfo> {
    let mut banks = Vec::new();
    for dir in directories {
        scan_directory(dir, user_bank_label, &mut banks);
    }
    log::debug!(target: "bank", "scan found {} banks", banks.len());
    banks
}

fn scan_directory(dir: &BankDirectory, user_bank_label: &str, banks: &mut Vec<BankInfo>) {
    let entries = match fs::read_dir(&dir.path) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!(target: "bank", "skipping {}: {}", dir.path.display(), e);
            return;
        }
    };

    let mut file_names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| match entry.file_name().into_string() {
            Ok(name) => Some(name),
            Err(name) => {
                log::warn!(target: "bank", "skipping non UTF-8 file name {:?}", name);
                None
            }
        })
        .collect();
    file_names.sort_by(|a, b| {
        (a != DEFAULT_BANK_FILE)
            .cmp(&(b != DEFAULT_BANK_FILE))
            .then_with(|| a.as_bytes().cmp(b.as_bytes()))
    });

    for file_name in file_names {
        let file_path = dir.path.join(&file_name);
        if !codec::is_bank_file(&file_path) {
            continue;
        }
        let modified = fs::metadata(&file_path).and_then(|m| m.modified()).ok();
        let presets = match codec::read_bank_file(&file_path) {
            Ok(presets) => presets,
            Err(e) => {
                log::warn!(target: "bank", "skipping {}", e);
                continue;
            }
        };
        banks.push(BankInfo {
            name: display_name(&file_name, user_bank_label),
            file_path,
            read_only: dir.read_only,
            modified,
            presets,
        });
    }
}
