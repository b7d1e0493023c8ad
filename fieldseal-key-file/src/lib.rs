//! File-based key provider for `FieldSeal`.
//!
//! Keeps the field key in a single file instead of the environment. The file
//! holds one key value in any form accepted by `Key::from_encoded`;
//! [`FileKeyProvider::init`] writes a fresh `base64:` key readable only by its
//! owner.

#![warn(clippy::pedantic, clippy::nursery)]

use fieldseal::error::ConfigError;
use fieldseal::key::Key;
use fieldseal::key_provider::KeyProvider;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Key provider reading the field key from a file.
///
/// ```text
/// /etc/fieldseal/field.key   (0600, one line: base64:...)
/// ```
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    /// Creates a new `FileKeyProvider`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if the file does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.is_file() {
            tracing::error!(path = %path.display(), "key file not found");
            return Err(ConfigError::MissingKey);
        }
        Ok(Self { path })
    }

    /// Returns the key file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a freshly generated key to `path`.
    ///
    /// Parent directories are created as needed. On Unix the file is created
    /// with mode `0600`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file already exists or cannot be
    /// written.
    pub fn init(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = Key::generate();

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(key.export_encoded().as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        tracing::info!(path = %path.display(), "wrote new field key");
        Ok(())
    }
}

impl KeyProvider for FileKeyProvider {
    fn load(&self) -> Result<Key, ConfigError> {
        let contents = Zeroizing::new(fs::read_to_string(&self.path)?);
        let value = contents.trim_end_matches(['\r', '\n']);
        if value.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        Key::from_encoded(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldseal::key::{BASE64_PREFIX, KEY_SIZE};
    use tempfile::TempDir;

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("field.key");

        FileKeyProvider::init(&path).unwrap();
        let provider = FileKeyProvider::new(&path).unwrap();

        assert!(provider.load().is_ok());
        assert!(provider.is_persistent());
    }

    #[test]
    fn test_loads_same_key_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        FileKeyProvider::init(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(BASE64_PREFIX));
        assert!(contents.ends_with('\n'));

        let provider = FileKeyProvider::new(&path).unwrap();
        let a = provider.load().unwrap().export_encoded();
        let b = provider.load().unwrap().export_encoded();
        assert_eq!(a, b);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");

        FileKeyProvider::init(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(matches!(FileKeyProvider::init(&path), Err(ConfigError::Io(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_init_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        FileKeyProvider::init(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = FileKeyProvider::new(dir.path().join("absent.key"));
        assert!(matches!(result, Err(ConfigError::MissingKey)));
    }

    #[test]
    fn test_raw_key_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        fs::write(&path, "0123456789abcdef0123456789abcdef\n").unwrap();

        let provider = FileKeyProvider::new(&path).unwrap();
        assert!(provider.load().is_ok());
    }

    #[test]
    fn test_raw_key_keeps_spaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        let raw = " 123456789abcdef0123456789abcde ";
        fs::write(&path, format!("{raw}\r\n")).unwrap();

        let loaded = FileKeyProvider::new(&path).unwrap().load().unwrap();
        let expected = Key::from_bytes(raw.as_bytes()).unwrap();
        assert_eq!(loaded.export_encoded(), expected.export_encoded());
    }

    #[test]
    fn test_wrong_length_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        fs::write(&path, "hex:00ff\n").unwrap();

        let provider = FileKeyProvider::new(&path).unwrap();
        assert!(matches!(
            provider.load(),
            Err(ConfigError::InvalidKeyLength { expected: KEY_SIZE, actual: 2 })
        ));
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.key");
        fs::write(&path, "\n").unwrap();

        let provider = FileKeyProvider::new(&path).unwrap();
        assert!(matches!(provider.load(), Err(ConfigError::MissingKey)));
    }
}
