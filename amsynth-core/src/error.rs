use std::fmt;
use std::path::{Path, PathBuf};

use amsynth_types::{PresetTextError, NUM_PRESETS};

/// A bank or preset buffer that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The buffer does not start with the `amSynth\n` magic.
    MissingHeader,
    /// More `<preset>` lines than a bank has slots.
    TooManyPresets { limit: usize },
    /// A single exported preset that could not be read.
    Preset(PresetTextError),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "not an amSynth bank (bad header)"),
            Self::TooManyPresets { limit } => {
                write!(f, "bank declares more than {} presets", limit)
            }
            Self::Preset(e) => write!(f, "not an amSynth preset ({})", e),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<PresetTextError> for FormatError {
    fn from(e: PresetTextError) -> Self {
        FormatError::Preset(e)
    }
}

/// Failure of a bank, preset or registry operation.
#[derive(Debug)]
pub enum BankError {
    Io { path: PathBuf, source: std::io::Error },
    /// `path` is `None` when the input did not come from a file.
    Format { path: Option<PathBuf>, source: FormatError },
    PresetOutOfRange(usize),
    BankOutOfRange(usize),
    /// An operation needed the active bank file but none is loaded.
    NoBankLoaded,
    /// The target belongs to a read-only (factory) bank directory.
    ReadOnly(PathBuf),
    AlreadyExists(PathBuf),
    NoWritableDirectory,
}

impl BankError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn format(path: &Path, source: FormatError) -> Self {
        Self::Format {
            path: Some(path.to_path_buf()),
            source,
        }
    }

    /// True for errors caused by an invalid index passed by the caller.
    pub fn is_range_error(&self) -> bool {
        matches!(self, Self::PresetOutOfRange(_) | Self::BankOutOfRange(_))
    }
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::Format { path: Some(path), source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            Self::Format { path: None, source } => write!(f, "{}", source),
            Self::PresetOutOfRange(index) => write!(
                f,
                "preset index {} out of range (0..{})",
                index, NUM_PRESETS
            ),
            Self::BankOutOfRange(index) => write!(f, "no bank with index {}", index),
            Self::NoBankLoaded => write!(f, "no bank loaded"),
            Self::ReadOnly(path) => write!(f, "{} is read-only", path.display()),
            Self::AlreadyExists(path) => write!(f, "{} already exists", path.display()),
            Self::NoWritableDirectory => write!(f, "no writable bank directory"),
        }
    }
}

impl From<FormatError> for BankError {
    fn from(source: FormatError) -> Self {
        Self::Format { path: None, source }
    }
}

impl std::error::Error for BankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}
