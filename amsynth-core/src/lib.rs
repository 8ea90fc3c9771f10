//! # amsynth-core
//!
//! Preset persistence for amSynth: bank files on disk, the catalogue of
//! available banks, and the controller that owns the working preset and its
//! undo history. Independent of any UI or audio backend.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use amsynth_core::bank::BankRegistry;
//! use amsynth_core::config::Config;
//! use amsynth_core::controller::PresetController;
//! use amsynth_core::paths;
//!
//! // 1. Resolve bank directories from config and build the shared catalogue
//! let config = Config::load();
//! let registry = Arc::new(BankRegistry::with_label(
//!     paths::bank_directories(&config),
//!     config.user_bank_label(),
//! ));
//!
//! // 2. A controller per synth instance; it starts on the first catalogued bank
//! let mut controller = PresetController::new(registry, config.parameter_locks());
//!
//! // 3. Hand lock-free value readers to the render thread
//! let handles = controller.current_preset().value_handles();
//!
//! // 4. Edit, undo, save
//! controller.select_preset(3)?;
//! controller.randomise_current_preset();
//! controller.undo_change();
//! controller.save_current_preset()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`bank`]: bank file codec (`codec`) and the process-wide `BankRegistry`
//! - [`controller`]: `PresetController`: working preset, bank load/save, undo/redo
//! - [`locks`]: `ParameterLocks`, parameters exempt from randomisation
//! - [`config`]: TOML configuration loading (embedded defaults + user override)
//! - [`paths`]: user and factory bank directories
//! - [`error`]: `BankError` and `FormatError`

pub mod bank;
pub mod config;
pub mod controller;
pub mod error;
pub mod locks;
pub mod paths;

pub use bank::{BankDirectory, BankInfo, BankRegistry};
pub use controller::{LoadOutcome, PresetController, PresetListener};
pub use error::{BankError, FormatError};
pub use locks::ParameterLocks;
