//! Field codec for encrypting and decrypting individual PII values.
//!
//! Each field is sealed on its own with a fresh random nonce, so two
//! encryptions of the same value never look alike and a damaged field does
//! not affect its neighbours.

use crate::blob::{self, EncryptedBlob, NONCE_SIZE};
use crate::context::EncryptionContext;
use crate::error::{ConfigError, DecryptError, Error};
use crate::key::Key;
use crate::key_provider::{self, KeyProvider};
use crate::settings::Settings;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{generic_array::GenericArray, rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    ChaCha20Poly1305,
};
use serde::Deserialize;
use std::sync::Arc;

/// AEAD used to seal fields.
///
/// Fixed per deployment and never recorded in the blob. Both modes use a
/// 96-bit nonce and a 128-bit tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// ChaCha20-Poly1305 AEAD cipher (default).
    ChaCha20Poly1305,
    /// AES-256-GCM AEAD cipher.
    Aes256Gcm,
}

impl Default for CipherMode {
    fn default() -> Self {
        Self::ChaCha20Poly1305
    }
}

/// Encrypts and decrypts PII fields under a single owned key.
///
/// Cloning is cheap and clones share the key, so one codec can be handed
/// to every worker thread.
///
/// # Example
///
/// ```
/// use fieldseal::codec::{CipherMode, FieldCodec};
/// use fieldseal::key::Key;
///
/// let codec = FieldCodec::new(Key::generate(), CipherMode::default());
///
/// let blob = codec.encrypt("alice@example.com").unwrap();
/// assert_eq!(codec.decrypt(blob.as_bytes()).unwrap(), "alice@example.com");
/// ```
#[derive(Debug, Clone)]
pub struct FieldCodec {
    key: Arc<Key>,
    cipher_mode: CipherMode,
}

impl FieldCodec {
    /// Creates a codec that owns `key`.
    #[must_use]
    pub fn new(key: Key, cipher_mode: CipherMode) -> Self {
        Self { key: Arc::new(key), cipher_mode }
    }

    /// Loads the key from `provider` and builds a codec.
    ///
    /// # Errors
    ///
    /// Returns the provider's `ConfigError` unchanged.
    pub fn from_provider(
        provider: &dyn KeyProvider,
        cipher_mode: CipherMode,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(provider.load()?, cipher_mode))
    }

    /// Builds a codec from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no usable key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let provider = key_provider::from_settings(settings)?;
        Self::from_provider(provider.as_ref(), settings.cipher)
    }

    /// Returns the cipher mode.
    #[must_use]
    pub const fn cipher_mode(&self) -> CipherMode {
        self.cipher_mode
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    /// Encrypts a plaintext field.
    ///
    /// The empty string encrypts to a valid blob, which lets callers store
    /// "no value" without a NULL marker.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedBlob, Error> {
        self.seal(plaintext.as_bytes(), &[])
    }

    /// Decrypts a blob produced by [`FieldCodec::encrypt`].
    ///
    /// # Errors
    ///
    /// - `DecryptError::Malformed` if the blob is too short
    /// - `DecryptError::Authentication` on tampering or a wrong key
    /// - `DecryptError::InvalidUtf8` if the plaintext is not UTF-8
    pub fn decrypt(&self, blob: &[u8]) -> Result<String, DecryptError> {
        self.open(blob, &[])
    }

    /// Encrypts a field bound to `context`.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt_in(
        &self,
        plaintext: &str,
        context: &EncryptionContext,
    ) -> Result<EncryptedBlob, Error> {
        let aad = context.to_string();
        self.seal(plaintext.as_bytes(), aad.as_bytes())
    }

    /// Decrypts a field that was bound to `context`.
    ///
    /// # Errors
    ///
    /// Same as [`FieldCodec::decrypt`]; a different context fails
    /// authentication.
    pub fn decrypt_in(
        &self,
        blob: &[u8],
        context: &EncryptionContext,
    ) -> Result<String, DecryptError> {
        let aad = context.to_string();
        self.open(blob, aad.as_bytes())
    }

    /// Encrypts a field into the bytes stored in its binary column.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt_field(&self, plaintext: &str) -> Result<Vec<u8>, Error> {
        self.encrypt(plaintext).map(EncryptedBlob::into_bytes)
    }

    /// Decrypts the bytes read from a binary column.
    ///
    /// # Errors
    ///
    /// See [`FieldCodec::decrypt`].
    pub fn decrypt_field(&self, bytes: &[u8]) -> Result<String, DecryptError> {
        self.decrypt(bytes)
    }

    fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<EncryptedBlob, Error> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let sealed = match self.cipher_mode {
            CipherMode::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(self.key.expose()));
                seal_with(&cipher, &nonce, plaintext, aad)
            }
            CipherMode::Aes256Gcm => {
                let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.expose()));
                seal_with(&cipher, &nonce, plaintext, aad)
            }
        }
        .map_err(|e| {
            Error::EncryptionFailed(format!("{:?} encryption failed: {e}", self.cipher_mode))
        })?;

        Ok(EncryptedBlob::assemble(&nonce, &sealed))
    }

    fn open(&self, blob: &[u8], aad: &[u8]) -> Result<String, DecryptError> {
        let (nonce, sealed) = blob::split(blob)?;

        let plaintext = match self.cipher_mode {
            CipherMode::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(self.key.expose()));
                open_with(&cipher, nonce, sealed, aad)
            }
            CipherMode::Aes256Gcm => {
                let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.expose()));
                open_with(&cipher, nonce, sealed, aad)
            }
        }
        .map_err(|_| DecryptError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| DecryptError::InvalidUtf8)
    }
}

fn seal_with<C: Aead>(
    cipher: &C,
    nonce: &[u8; NONCE_SIZE],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, chacha20poly1305::aead::Error> {
    cipher.encrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
}

fn open_with<C: Aead>(
    cipher: &C,
    nonce: &[u8; NONCE_SIZE],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, chacha20poly1305::aead::Error> {
    cipher.decrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
}
