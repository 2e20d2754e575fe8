//! Key material and collaborator configuration
//!
//! The decoder itself does not know where the AES key and IV come from - a
//! [`KeyProvider`] collaborator supplies them once per parse. This module
//! defines the validated key material type, the provider trait, and the
//! well-known Logan defaults.

use crate::types::{ParseError, Result};

/// AES key/IV length required by the Logan format
pub const KEY_LENGTH: usize = 16;

/// Default Logan AES key (the SDK ships with this value)
pub const DEFAULT_AES_KEY: &str = "0123456789012345";

/// Default Logan AES IV
pub const DEFAULT_AES_IV: &str = "0123456789012345";

/// Validated 16-byte AES key and IV
///
/// Construction is the only place key material is validated; once a
/// `KeyMaterial` exists, decryption cannot fail on it. The value is read once
/// at the start of a parse and treated as immutable for its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key: [u8; KEY_LENGTH],
    iv: [u8; KEY_LENGTH],
}

impl KeyMaterial {
    /// Build key material from raw bytes, failing fast on wrong lengths
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LENGTH] = key
            .try_into()
            .map_err(|_| ParseError::InvalidKey(key.len()))?;
        let iv: [u8; KEY_LENGTH] = iv
            .try_into()
            .map_err(|_| ParseError::InvalidIv(iv.len()))?;
        Ok(Self { key, iv })
    }

    /// Build key material from UTF-8 strings (the usual settings form)
    pub fn from_strs(key: &str, iv: &str) -> Result<Self> {
        Self::new(key.as_bytes(), iv.as_bytes())
    }

    pub fn key(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; KEY_LENGTH] {
        &self.iv
    }
}

impl Default for KeyMaterial {
    fn default() -> Self {
        // The well-known defaults are exactly 16 ASCII bytes
        Self::from_strs(DEFAULT_AES_KEY, DEFAULT_AES_IV)
            .unwrap_or_else(|_| unreachable!("default key material is 16 bytes"))
    }
}

/// Collaborator that owns the persisted key/IV configuration
///
/// Invoked exactly once per parse; a settings change mid-parse does not
/// affect a parse already in flight.
pub trait KeyProvider {
    fn key_material(&self) -> Result<KeyMaterial>;
}

/// Provider that always returns a fixed key pair - useful for tests and for
/// callers that take the key on the command line
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    material: KeyMaterial,
}

impl StaticKeyProvider {
    pub fn new(material: KeyMaterial) -> Self {
        Self { material }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn key_material(&self) -> Result<KeyMaterial> {
        Ok(self.material.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_material() {
        let material = KeyMaterial::default();
        assert_eq!(material.key(), b"0123456789012345");
        assert_eq!(material.iv(), b"0123456789012345");
    }

    #[test]
    fn test_key_length_validation() {
        match KeyMaterial::new(b"short", b"0123456789012345") {
            Err(ParseError::InvalidKey(5)) => {}
            other => panic!("expected InvalidKey(5), got {:?}", other),
        }
        match KeyMaterial::new(b"0123456789012345", b"0123456789012345678") {
            Err(ParseError::InvalidIv(19)) => {}
            other => panic!("expected InvalidIv(19), got {:?}", other),
        }
    }

    #[test]
    fn test_static_provider() {
        let material = KeyMaterial::from_strs("abcdefghijklmnop", "ponmlkjihgfedcba").unwrap();
        let provider = StaticKeyProvider::new(material.clone());
        assert_eq!(provider.key_material().unwrap(), material);
    }
}
