use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bank::DEFAULT_USER_BANK_LABEL;
use crate::locks::ParameterLocks;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Serialize, Default)]
struct ConfigFile {
    #[serde(default)]
    banks: BanksConfig,
    #[serde(default)]
    presets: PresetsConfig,
}

#[derive(Deserialize, Serialize, Default)]
struct BanksConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    factory_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_bank_label: Option<String>,
}

#[derive(Deserialize, Serialize, Default)]
struct PresetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_parameters: Option<String>,
}

pub struct Config {
    banks: BanksConfig,
    presets: PresetsConfig,
    path: Option<PathBuf>,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if any.
    pub fn load() -> Self {
        Self::load_from(user_config_path())
    }

    /// Like [`load`](Self::load) with an explicit user config location.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = path.as_deref() {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_banks(&mut base.banks, user.banks);
                            merge_presets(&mut base.presets, user.presets);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            banks: base.banks,
            presets: base.presets,
            path,
        }
    }

    /// Parse a config from a string, on top of the embedded defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        let user: ConfigFile = toml::from_str(contents)?;
        merge_banks(&mut base.banks, user.banks);
        merge_presets(&mut base.presets, user.presets);
        Ok(Config {
            banks: base.banks,
            presets: base.presets,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn user_banks_dir(&self) -> Option<&str> {
        self.banks.user_dir.as_deref()
    }

    pub fn factory_banks_dir(&self) -> Option<&str> {
        self.banks.factory_dir.as_deref()
    }

    /// Label shown for a directory's `default` bank.
    pub fn user_bank_label(&self) -> &str {
        self.banks
            .user_bank_label
            .as_deref()
            .unwrap_or(DEFAULT_USER_BANK_LABEL)
    }

    pub fn locked_parameters(&self) -> &str {
        self.presets.locked_parameters.as_deref().unwrap_or("")
    }

    pub fn set_locked_parameters(&mut self, names: impl Into<String>) {
        self.presets.locked_parameters = Some(names.into());
    }

    /// Lock set initialised from the stored name list.
    pub fn parameter_locks(&self) -> ParameterLocks {
        ParameterLocks::from_names(self.locked_parameters())
    }

    /// Record the current lock set so the next [`save`](Self::save) persists it.
    pub fn store_locks(&mut self, locks: &ParameterLocks) {
        self.set_locked_parameters(locks.names());
    }

    /// Write the config back to the file it was loaded from.
    pub fn save(&self) -> std::io::Result<()> {
        match self.path.as_deref() {
            Some(path) => self.save_to(path),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config path",
            )),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let file = ConfigFile {
            banks: BanksConfig {
                user_dir: self.banks.user_dir.clone(),
                factory_dir: self.banks.factory_dir.clone(),
                user_bank_label: self.banks.user_bank_label.clone(),
            },
            presets: PresetsConfig {
                locked_parameters: self.presets.locked_parameters.clone(),
            },
        };
        let contents = toml::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        log::debug!(target: "config", "saved config to {}", path.display());
        Ok(())
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("amsynth").join("config.toml"))
}

fn merge_banks(base: &mut BanksConfig, user: BanksConfig) {
    if user.user_dir.is_some() {
        base.user_dir = user.user_dir;
    }
    if user.factory_dir.is_some() {
        base.factory_dir = user.factory_dir;
    }
    if user.user_bank_label.is_some() {
        base.user_bank_label = user.user_bank_label;
    }
}

fn merge_presets(base: &mut PresetsConfig, user: PresetsConfig) {
    if user.locked_parameters.is_some() {
        base.locked_parameters = user.locked_parameters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amsynth_types::ParamId;

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_from(None);
        assert_eq!(config.user_bank_label(), "User bank");
        assert_eq!(config.locked_parameters(), "");
        assert!(config.user_banks_dir().is_none());
        assert!(config.factory_banks_dir().is_none());
    }

    #[test]
    fn user_values_override_defaults() {
        let config = Config::from_toml_str(
            "[banks]\nuser_bank_label = \"Benutzerbank\"\n[presets]\nlocked_parameters = \"master_vol\"\n",
        )
        .unwrap();
        assert_eq!(config.user_bank_label(), "Benutzerbank");
        let locks = config.parameter_locks();
        assert!(locks.is_locked(ParamId::from_name("master_vol").unwrap()));
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[banks\nnot toml").unwrap();
        let config = Config::load_from(Some(path));
        assert_eq!(config.user_bank_label(), "User bank");
    }

    #[test]
    fn locks_persist_through_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::load_from(Some(path.clone()));
        let locks = ParameterLocks::new();
        locks.set_locked(ParamId::from_name("osc_mix").unwrap(), true);
        locks.set_locked(ParamId::from_name("reverb_wet").unwrap(), true);
        config.store_locks(&locks);
        config.save().unwrap();

        let reloaded = Config::load_from(Some(path));
        assert_eq!(reloaded.locked_parameters(), "osc_mix reverb_wet");
        assert_eq!(reloaded.parameter_locks().locked(), locks.locked());
    }

    #[test]
    fn save_without_path_fails() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.save().is_err());
    }
}
