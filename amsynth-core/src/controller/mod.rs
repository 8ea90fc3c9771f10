//! The working preset and everything that happens to it.
//!
//! A [`PresetController`] holds one bank's slots in memory plus a separate
//! "current" preset that edits apply to. The current preset is never
//! replaced, only assigned into, so [`ValueHandle`](amsynth_types::ValueHandle)s
//! handed to the render thread stay valid for the controller's lifetime.

mod history;
#[cfg(test)]
mod tests;

pub use history::{Change, ChangeHistory};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use amsynth_types::{ObserverList, ParamId, Preset, PresetBank, Subscription, NUM_PRESETS};
use rand::Rng;

use crate::bank::codec;
use crate::bank::BankRegistry;
use crate::error::{BankError, FormatError};
use crate::locks::ParameterLocks;

const IMPORTED_PREFIX: &str = "Imported: ";

/// Notified when the current preset is replaced as a whole (slot selection,
/// import, clear, rename). Individual value changes go to
/// [`ParameterObserver`](amsynth_types::ParameterObserver)s instead.
pub trait PresetListener: Send + Sync {
    fn on_preset_changed(&self, preset: &Preset);
}

/// Result of a successful [`PresetController::load_presets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Same file, unchanged on disk; nothing was read.
    Cached,
    Loaded,
}

pub struct PresetController {
    registry: Arc<BankRegistry>,
    locks: ParameterLocks,
    presets: PresetBank,
    bank_file: Option<PathBuf>,
    bank_modified: Option<SystemTime>,
    current_bank: Option<usize>,
    current_index: usize,
    current: Preset,
    history: ChangeHistory,
    listeners: ObserverList<dyn PresetListener>,
}

impl PresetController {
    /// Start on the first writable catalogued bank (or the first bank of any
    /// kind), with slot 0 selected. Without any banks the controller has
    /// default slots and no bank file.
    pub fn new(registry: Arc<BankRegistry>, locks: ParameterLocks) -> Self {
        let banks = registry.banks();
        let start = banks
            .iter()
            .position(|bank| !bank.read_only)
            .or_else(|| (!banks.is_empty()).then_some(0));

        let mut controller = Self {
            registry,
            locks,
            presets: PresetBank::new(),
            bank_file: None,
            bank_modified: None,
            current_bank: None,
            current_index: 0,
            current: Preset::default(),
            history: ChangeHistory::new(),
            listeners: ObserverList::new(),
        };
        match start {
            Some(index) => {
                if let Err(e) = controller.select_bank(index) {
                    log::warn!(target: "controller", "could not select initial bank: {}", e);
                }
            }
            None => log::info!(target: "controller", "no banks found, starting empty"),
        }
        controller.load_slot(0);
        controller
    }

    pub fn registry(&self) -> &Arc<BankRegistry> {
        &self.registry
    }

    pub fn locks(&self) -> &ParameterLocks {
        &self.locks
    }

    // ---- selection ----

    /// Copy slot `index` into the current preset. Erases undo history.
    pub fn select_preset(&mut self, index: usize) -> Result<(), BankError> {
        if index >= NUM_PRESETS {
            return Err(BankError::PresetOutOfRange(index));
        }
        self.load_slot(index);
        Ok(())
    }

    fn load_slot(&mut self, index: usize) {
        self.current_index = index;
        self.current.assign_from(&self.presets[index]);
        self.history.clear();
        self.notify_listeners();
    }

    /// Switch to catalogued bank `index` using its cached contents. The
    /// current preset is left alone until the next [`select_preset`](Self::select_preset).
    pub fn select_bank(&mut self, index: usize) -> Result<(), BankError> {
        if self.current_bank == Some(index) {
            return Ok(());
        }
        let bank = self
            .registry
            .get(index)
            .ok_or(BankError::BankOutOfRange(index))?;
        log::debug!(target: "controller", "selected bank {} ({})", bank.name, bank.file_path.display());
        self.presets = bank.presets;
        self.bank_file = Some(bank.file_path);
        self.bank_modified = bank.modified;
        self.current_bank = Some(index);
        Ok(())
    }

    // ---- bank files ----

    /// Read the bank at `path`, or re-read the active bank with `None`.
    ///
    /// Re-reading the active bank is skipped while its modification time is
    /// unchanged, so unsaved slot edits survive. A file that fails to parse
    /// leaves every piece of controller state as it was.
    pub fn load_presets(&mut self, path: Option<&Path>) -> Result<LoadOutcome, BankError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.bank_file.clone().ok_or(BankError::NoBankLoaded)?,
        };
        let modified = file_modified(&path);
        if self.bank_file.as_deref() == Some(path.as_path()) && self.bank_modified == modified {
            log::debug!(target: "controller", "{} unchanged, not reloading", path.display());
            return Ok(LoadOutcome::Cached);
        }

        let presets = codec::read_bank_file(&path)?;
        self.presets = presets;
        self.bank_modified = modified;
        self.current_bank = self.registry.index_of(&path);
        log::debug!(target: "controller", "loaded {}", path.display());
        self.bank_file = Some(path);
        Ok(LoadOutcome::Loaded)
    }

    /// Store the current preset in its slot and write the bank. The file is
    /// re-read first so slots saved meanwhile by another instance are kept.
    pub fn save_current_preset(&mut self) -> Result<(), BankError> {
        let path = self.writable_bank_path()?;
        self.reload_before_write(&path);
        self.commit_preset();
        self.write_bank(&path)
    }

    /// Write every slot to `path`, which becomes the active bank.
    pub fn save_presets_to(&mut self, path: &Path) -> Result<(), BankError> {
        self.check_writable(path)?;
        self.write_bank(path)?;
        self.current_bank = self.registry.index_of(path);
        Ok(())
    }

    /// Copy the current preset into its slot without touching the disk.
    pub fn commit_preset(&mut self) {
        if let Some(slot) = self.presets.get_mut(self.current_index) {
            *slot = self.current.clone();
        }
    }

    /// Reset the current slot to an unused default preset and save.
    pub fn clear_preset(&mut self) -> Result<(), BankError> {
        let path = self.writable_bank_path()?;
        self.reload_before_write(&path);
        self.current.assign_from(&Preset::default());
        self.commit_preset();
        self.history.clear();
        self.notify_listeners();
        self.write_bank(&path)
    }

    fn writable_bank_path(&self) -> Result<PathBuf, BankError> {
        let path = self.bank_file.clone().ok_or(BankError::NoBankLoaded)?;
        self.check_writable(&path)?;
        Ok(path)
    }

    fn check_writable(&self, path: &Path) -> Result<(), BankError> {
        let read_only = self
            .registry
            .banks()
            .iter()
            .any(|bank| bank.read_only && bank.file_path == path);
        if read_only {
            return Err(BankError::ReadOnly(path.to_path_buf()));
        }
        Ok(())
    }

    fn reload_before_write(&mut self, path: &Path) {
        if let Err(e) = self.load_presets(Some(path)) {
            log::warn!(target: "controller", "not merging before save: {}", e);
        }
    }

    fn write_bank(&mut self, path: &Path) -> Result<(), BankError> {
        codec::write_bank_file(path, &self.presets)?;
        self.bank_modified = file_modified(path);
        self.bank_file = Some(path.to_path_buf());
        log::info!(target: "controller", "saved {}", path.display());
        Ok(())
    }

    // ---- single presets ----

    /// Replace the current preset with one in exported text form. Its name
    /// gets an `Imported: ` prefix. Erases undo history.
    pub fn import_preset(&mut self, text: &str) -> Result<(), BankError> {
        let preset = Preset::from_text(text).map_err(FormatError::from)?;
        self.install_imported(preset);
        Ok(())
    }

    pub fn import_preset_file(&mut self, path: &Path) -> Result<(), BankError> {
        let text = fs::read_to_string(path).map_err(|e| BankError::io(path, e))?;
        let preset = Preset::from_text(&text).map_err(|e| BankError::format(path, e.into()))?;
        self.install_imported(preset);
        Ok(())
    }

    fn install_imported(&mut self, mut preset: Preset) {
        let name = format!("{}{}", IMPORTED_PREFIX, preset.name());
        preset.set_name(name);
        log::debug!(target: "controller", "importing {:?}", preset.name());
        self.current.assign_from(&preset);
        self.history.clear();
        self.notify_listeners();
    }

    /// Write the current preset's text form to `path`.
    pub fn export_preset(&self, path: &Path) -> Result<(), BankError> {
        codec::write_atomically(path, self.current.to_text().as_bytes())
    }

    pub fn rename_current_preset(&mut self, name: impl Into<String>) {
        self.current.set_name(name);
        self.notify_listeners();
    }

    // ---- edits and history ----

    /// Give every unlocked parameter a random value. Undoable as one step.
    pub fn randomise_current_preset(&mut self) {
        self.randomise_with(&mut rand::thread_rng());
    }

    pub fn randomise_with<R: Rng>(&mut self, rng: &mut R) {
        self.history.push(Change::randomise(&self.current));
        let locks = &self.locks;
        self.current.randomise(rng, |id| locks.is_locked(id));
    }

    /// Start of an edit gesture on `id`: the value it had before the gesture
    /// is what undo restores.
    pub fn begin_edit(&mut self, id: ParamId) {
        let parameter = self.current.parameter(id);
        self.history.push(Change::param(id, parameter.value()));
        parameter.begin_edit();
    }

    pub fn end_edit(&self, id: ParamId) {
        self.current.parameter(id).end_edit();
    }

    pub fn set_parameter(&self, id: ParamId, value: f32) {
        self.current.parameter(id).set_value(value);
    }

    /// Revert the last edit. Returns false when there was nothing to undo.
    pub fn undo_change(&mut self) -> bool {
        self.history.undo(&mut self.current)
    }

    pub fn redo_change(&mut self) -> bool {
        self.history.redo(&mut self.current)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- queries ----

    pub fn current_preset(&self) -> &Preset {
        &self.current
    }

    pub fn current_preset_index(&self) -> usize {
        self.current_index
    }

    pub fn current_bank_index(&self) -> Option<usize> {
        self.current_bank
    }

    pub fn bank_path(&self) -> Option<&Path> {
        self.bank_file.as_deref()
    }

    pub fn preset(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn presets(&self) -> &PresetBank {
        &self.presets
    }

    pub fn contains_preset_named(&self, name: &str) -> bool {
        self.presets.contains_name(name)
    }

    // ---- listeners ----

    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: Arc<dyn PresetListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    fn notify_listeners(&self) {
        self.listeners
            .notify(|listener| listener.on_preset_changed(&self.current));
    }
}

impl std::fmt::Debug for PresetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetController")
            .field("bank_file", &self.bank_file)
            .field("current_bank", &self.current_bank)
            .field("current_index", &self.current_index)
            .field("current", &self.current.name())
            .finish_non_exhaustive()
    }
}

fn file_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
