//! The bank file format.
//!
//! ```text
//! amSynth
//! <preset> <name> First
//! <parameter> amp_attack 0
//! ...
//! <preset> <name> Second
//! ...
//! EOF
//! ```
//!
//! Slots named `unused` are not written. On read, missing slots are padded
//! with defaults and unknown parameter names are skipped, so files written by
//! older or newer versions with a different parameter set still load.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use amsynth_types::text::{self, Line, BANK_HEADER};
use amsynth_types::{Preset, PresetBank, NUM_PRESETS};
use tempfile::NamedTempFile;

use crate::error::{BankError, FormatError};

/// Whether `bytes` starts with the bank magic.
pub fn is_bank(bytes: &[u8]) -> bool {
    bytes.starts_with(BANK_HEADER)
}

/// Cheap identity check used while scanning: reads only the first 8 bytes.
/// Unreadable and short files are not banks.
pub fn is_bank_file(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(BANK_HEADER.len());
    match file.take(BANK_HEADER.len() as u64).read_to_end(&mut head) {
        Ok(_) => is_bank(&head),
        Err(_) => false,
    }
}

/// Parse a whole bank buffer.
///
/// Only newline-terminated lines are considered; a trailing fragment
/// without a newline is ignored.
pub fn parse(bytes: &[u8]) -> Result<PresetBank, FormatError> {
    let body = bytes
        .strip_prefix(BANK_HEADER.as_slice())
        .ok_or(FormatError::MissingHeader)?;

    let mut presets: Vec<Preset> = Vec::new();
    // `split` yields the unterminated tail last; drop it.
    let terminated = body.iter().filter(|b| **b == b'\n').count();

    for line in body.split(|b| *b == b'\n').take(terminated) {
        match text::parse_line(line) {
            Line::Preset(name) => {
                if presets.len() == NUM_PRESETS {
                    return Err(FormatError::TooManyPresets { limit: NUM_PRESETS });
                }
                presets.push(Preset::new(name));
            }
            Line::Parameter { name, value } => match presets.last() {
                Some(preset) => {
                    preset.apply_parameter(name, value);
                }
                None => {
                    log::debug!(target: "bank", "parameter line before any preset: {}", name);
                }
            },
            Line::Other => {}
        }
    }

    PresetBank::from_presets(presets).ok_or(FormatError::TooManyPresets { limit: NUM_PRESETS })
}

/// Serialize every used slot, in slot order.
pub fn serialize(bank: &PresetBank) -> String {
    let mut out = String::from_utf8_lossy(BANK_HEADER).into_owned();
    for (_, preset) in bank.used() {
        text::write_preset(&mut out, preset);
    }
    out.push_str(text::END_MARKER);
    out.push('\n');
    out
}

/// Serialized form of an empty bank.
pub fn empty_bank() -> String {
    serialize(&PresetBank::new())
}

pub fn read_bank_file(path: &Path) -> Result<PresetBank, BankError> {
    let bytes = fs::read(path).map_err(|e| BankError::io(path, e))?;
    parse(&bytes).map_err(|e| BankError::format(path, e))
}

/// Write `bank` to `path` atomically: the data goes to a temporary file in
/// the same directory which then replaces the target.
pub fn write_bank_file(path: &Path, bank: &PresetBank) -> Result<(), BankError> {
    write_atomically(path, serialize(bank).as_bytes())
}

pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), BankError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BankError::io(path, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| BankError::io(path, e))?;
    if let Ok(existing) = fs::metadata(path) {
        let _ = fs::set_permissions(tmp.path(), existing.permissions());
    }
    tmp.persist(path).map_err(|e| BankError::io(path, e.error))?;
    Ok(())
}
