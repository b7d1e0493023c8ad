//! Settings loading.
//!
//! Values come from an optional TOML file overlaid by `PII_` prefixed
//! environment variables:
//!
//! | variable                | meaning                                        |
//! |-------------------------|------------------------------------------------|
//! | `PII_AES_KEY`           | key material, see [`Key::from_encoded`]        |
//! | `PII_DEV_EPHEMERAL_KEY` | `true` allows a throwaway key when none is set |
//! | `PII_CIPHER`            | `chacha20poly1305` (default) or `aes256gcm`    |
//! | `PII_LOG_LEVEL`         | tracing filter, default `info`                 |
//!
//! [`Key::from_encoded`]: crate::key::Key::from_encoded

use crate::codec::CipherMode;
use crate::error::ConfigError;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PII";

/// Runtime settings for the codec.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Encoded key material. Absent means no persistent key.
    #[serde(default)]
    pub aes_key: Option<SecretString>,

    /// Explicit opt-in for an ephemeral key when `aes_key` is absent.
    #[serde(default)]
    pub dev_ephemeral_key: bool,

    /// AEAD used for every field.
    #[serde(default)]
    pub cipher: CipherMode,

    /// Tracing filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aes_key: None,
            dev_ephemeral_key: false,
            cipher: CipherMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Source` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None, None)
    }

    /// Loads settings from an optional TOML file, then the environment.
    ///
    /// `env` replaces the process environment when given, which keeps tests
    /// free of global side effects.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Source` if the file is unreadable or any value
    /// fails to parse.
    pub fn load(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None, Some(env(&[]))).unwrap();
        assert!(settings.aes_key.is_none());
        assert!(!settings.dev_ephemeral_key);
        assert_eq!(settings.cipher, CipherMode::ChaCha20Poly1305);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_reads_prefixed_variables() {
        let settings = Settings::load(
            None,
            Some(env(&[
                ("PII_AES_KEY", "0123456789abcdef0123456789abcdef"),
                ("PII_DEV_EPHEMERAL_KEY", "true"),
                ("PII_CIPHER", "aes256gcm"),
                ("PII_LOG_LEVEL", "debug"),
            ])),
        )
        .unwrap();

        assert_eq!(
            settings.aes_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("0123456789abcdef0123456789abcdef")
        );
        assert!(settings.dev_ephemeral_key);
        assert_eq!(settings.cipher, CipherMode::Aes256Gcm);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_numeric_key_kept_verbatim() {
        for raw in ["12345678901234567890123456789012", "00000000000000000000000000000042"] {
            let settings = Settings::load(None, Some(env(&[("PII_AES_KEY", raw)]))).unwrap();
            assert_eq!(settings.aes_key.as_ref().map(|k| k.expose_secret().as_str()), Some(raw));
        }
    }

    #[test]
    fn test_ignores_unprefixed_variables() {
        let settings = Settings::load(None, Some(env(&[("AES_KEY", "x")]))).unwrap();
        assert!(settings.aes_key.is_none());
    }

    #[test]
    fn test_rejects_unknown_cipher() {
        let result = Settings::load(None, Some(env(&[("PII_CIPHER", "rot13")])));
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "cipher = \"aes256gcm\"\nlog_level = \"warn\"").unwrap();

        let settings =
            Settings::load(Some(file.path()), Some(env(&[("PII_LOG_LEVEL", "trace")]))).unwrap();

        assert_eq!(settings.cipher, CipherMode::Aes256Gcm);
        assert_eq!(settings.log_level, "trace");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/fieldseal.toml")), Some(env(&[])));
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }
}
