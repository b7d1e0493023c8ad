//! Key provider abstraction for loading the field key.

use crate::error::ConfigError;
use crate::key::Key;
use crate::settings::Settings;
use secrecy::{ExposeSecret, SecretString};

/// Supplies the single field key for the lifetime of a process.
///
/// Implementations must be thread-safe (`Send + Sync`) so a provider can be
/// shared during startup wiring.
///
/// # Example
///
/// ```rust,ignore
/// use fieldseal::key_provider::KeyProvider;
///
/// struct VaultAgentProvider;
///
/// impl KeyProvider for VaultAgentProvider {
///     fn load(&self) -> Result<Key, ConfigError> {
///         // Implementation
///     }
/// }
/// ```
pub trait KeyProvider: Send + Sync {
    /// Loads the key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if key material is absent or malformed.
    fn load(&self) -> Result<Key, ConfigError>;

    /// Whether data encrypted under the loaded key survives a restart.
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Provider backed by an externally configured key value.
#[derive(Debug)]
pub struct ConfiguredKeyProvider {
    material: SecretString,
}

impl ConfiguredKeyProvider {
    /// Wraps an encoded key value (see [`Key::from_encoded`]).
    #[must_use]
    pub const fn new(material: SecretString) -> Self {
        Self { material }
    }
}

impl KeyProvider for ConfiguredKeyProvider {
    fn load(&self) -> Result<Key, ConfigError> {
        Key::from_encoded(self.material.expose_secret())
    }
}

/// Provider that synthesizes a random key on every load.
///
/// Ciphertext written under this key is unrecoverable once the process
/// exits. Only selected when explicitly requested via
/// `PII_DEV_EPHEMERAL_KEY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevModeKeyProvider;

impl KeyProvider for DevModeKeyProvider {
    fn load(&self) -> Result<Key, ConfigError> {
        tracing::warn!(
            "using an ephemeral development key; encrypted data will be unrecoverable after restart"
        );
        Ok(Key::generate())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// Picks the key provider described by `settings`.
///
/// A configured key always wins. Without one, the dev provider is used only
/// if `dev_ephemeral_key` is set.
///
/// # Errors
///
/// Returns `ConfigError::MissingKey` when no key is configured and dev mode
/// was not requested.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn KeyProvider>, ConfigError> {
    match (&settings.aes_key, settings.dev_ephemeral_key) {
        (Some(material), dev) => {
            if dev {
                tracing::warn!("PII_DEV_EPHEMERAL_KEY ignored because PII_AES_KEY is set");
            }
            tracing::info!("using configured field key");
            Ok(Box::new(ConfiguredKeyProvider::new(SecretString::new(
                material.expose_secret().clone(),
            ))))
        }
        (None, true) => Ok(Box::new(DevModeKeyProvider)),
        (None, false) => Err(ConfigError::MissingKey),
    }
}
