//! The symmetric field key.

use crate::error::ConfigError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{rand_core::RngCore, OsRng};
use secrecy::{ExposeSecret, Secret};
use std::fmt;
use zeroize::Zeroizing;

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Prefix marking a base64 encoded key value.
pub const BASE64_PREFIX: &str = "base64:";

/// Prefix marking a hex encoded key value.
pub const HEX_PREFIX: &str = "hex:";

/// A 256-bit symmetric key for field encryption.
///
/// The length is validated on construction, so holders of a `Key` never
/// need to check it again. Key material is zeroized on drop and never shows
/// up in `Debug` output.
pub struct Key {
    bytes: Secret<[u8; KEY_SIZE]>,
}

impl Key {
    /// Builds a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKeyLength` unless `bytes` is exactly
    /// [`KEY_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let array: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            ConfigError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() }
        })?;
        Ok(Self { bytes: Secret::new(array) })
    }

    /// Decodes a configured key value.
    ///
    /// Accepted forms:
    /// - `base64:<standard base64>`
    /// - `hex:<hex digits>`
    /// - anything else is taken as the raw UTF-8 bytes of the string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEncoding` if a prefixed value does not
    /// decode, and `ConfigError::InvalidKeyLength` if the decoded value is not
    /// [`KEY_SIZE`] bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldseal::key::Key;
    ///
    /// let key = Key::from_encoded("0123456789abcdef0123456789abcdef").unwrap();
    /// assert!(Key::from_encoded("too short").is_err());
    /// # drop(key);
    /// ```
    pub fn from_encoded(value: &str) -> Result<Self, ConfigError> {
        if let Some(encoded) = value.strip_prefix(BASE64_PREFIX) {
            let decoded = Zeroizing::new(
                STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| ConfigError::InvalidEncoding(format!("base64: {e}")))?,
            );
            return Self::from_bytes(&decoded);
        }
        if let Some(encoded) = value.strip_prefix(HEX_PREFIX) {
            let decoded = Zeroizing::new(
                hex::decode(encoded.trim())
                    .map_err(|e| ConfigError::InvalidEncoding(format!("hex: {e}")))?,
            );
            return Self::from_bytes(&decoded);
        }
        Self::from_bytes(value.as_bytes())
    }

    /// Generates a fresh key from the OS random number generator.
    #[must_use]
    pub fn generate() -> Self {
        let mut array = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut array);
        let key = Self { bytes: Secret::new(array) };
        zeroize::Zeroize::zeroize(&mut array);
        key
    }

    /// Encodes the key as a `base64:` value accepted by [`Key::from_encoded`].
    ///
    /// The returned string is key material; callers are responsible for where
    /// it ends up.
    #[must_use]
    pub fn export_encoded(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{BASE64_PREFIX}{}", STANDARD.encode(self.bytes.expose_secret())))
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        self.bytes.expose_secret()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}
