//! Persisted AES key/IV settings
//!
//! The decoder library never stores key material; this is the CLI-side
//! settings collaborator. Settings live in a small TOML file and a missing
//! file means the well-known Logan defaults.

use anyhow::{Context, Result};
use logan_decoder::{KeyMaterial, KeyProvider, DEFAULT_AES_IV, DEFAULT_AES_KEY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Key/IV settings as persisted on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_key")]
    pub aes_key: String,
    #[serde(default = "default_iv")]
    pub aes_iv: String,
}

fn default_key() -> String {
    DEFAULT_AES_KEY.to_string()
}

fn default_iv() -> String {
    DEFAULT_AES_IV.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aes_key: default_key(),
            aes_iv: default_iv(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Write settings back to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create settings dir: {:?}", parent))?;
            }
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", path))
    }

    /// Validate the key format: exactly 16 ASCII bytes each
    pub fn validate(&self) -> Result<()> {
        if self.aes_key.len() != 16 {
            anyhow::bail!("AES key must be exactly 16 bytes, got {}", self.aes_key.len());
        }
        if self.aes_iv.len() != 16 {
            anyhow::bail!("AES IV must be exactly 16 bytes, got {}", self.aes_iv.len());
        }
        if !self.aes_key.is_ascii() {
            anyhow::bail!("AES key must contain only ASCII characters");
        }
        if !self.aes_iv.is_ascii() {
            anyhow::bail!("AES IV must contain only ASCII characters");
        }
        Ok(())
    }

    pub fn is_using_default_keys(&self) -> bool {
        self.aes_key == DEFAULT_AES_KEY && self.aes_iv == DEFAULT_AES_IV
    }

    pub fn reset_to_default(&mut self) {
        *self = Self::default();
    }
}

/// [`KeyProvider`] backed by loaded settings
///
/// The provider holds the settings snapshot taken when the parse was set up;
/// later edits to the settings file do not affect a parse in flight.
#[derive(Debug, Clone)]
pub struct SettingsKeyProvider {
    settings: Settings,
}

impl SettingsKeyProvider {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl KeyProvider for SettingsKeyProvider {
    fn key_material(&self) -> logan_decoder::Result<KeyMaterial> {
        KeyMaterial::from_strs(&self.settings.aes_key, &self.settings.aes_iv)
    }
}
