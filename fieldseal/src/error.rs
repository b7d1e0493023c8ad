//! Error types for `FieldSeal` operations.

use std::fmt;

/// Main error type for `FieldSeal` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A blob could not be decrypted
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptError),

    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Blind index generation failed
    #[error("blind index generation failed: {0}")]
    IndexGenerationFailed(String),

    /// No record matched the requested identity
    #[error("record not found")]
    NotFound,

    /// A stored record exists but cannot be read back
    #[error("record unreadable")]
    Unreadable,

    /// The record store failed
    #[error("store error: {0}")]
    Store(String),
}

/// Failure to decrypt a single encrypted blob.
///
/// Recoverable per call. The identity resolver swallows these and moves on
/// to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecryptError {
    /// Blob is too short to hold a nonce and tag
    #[error("malformed blob: {len} bytes")]
    Malformed {
        /// Length of the rejected blob
        len: usize,
    },

    /// Tag verification failed (tampered blob, wrong key or wrong context)
    #[error("authentication failed: ciphertext may be corrupted or tampered")]
    Authentication,

    /// Decrypted bytes are not valid UTF-8
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors raised while loading key material or settings.
///
/// All of these are fatal at startup: a process that hits one must not serve
/// encrypt or decrypt traffic.
#[derive(Debug)]
pub enum ConfigError {
    /// No key configured and dev mode not requested
    MissingKey,

    /// Decoded key has the wrong length
    InvalidKeyLength {
        /// Required length in bytes
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Prefixed key value failed to decode
    InvalidEncoding(String),

    /// Settings source could not be read or parsed
    Source(String),

    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey => {
                write!(f, "no key configured (set PII_AES_KEY or enable PII_DEV_EPHEMERAL_KEY)")
            }
            Self::InvalidKeyLength { expected, actual } => {
                write!(f, "key must be {expected} bytes after decoding, got {actual}")
            }
            Self::InvalidEncoding(msg) => write!(f, "invalid key encoding: {msg}"),
            Self::Source(msg) => write!(f, "settings unavailable: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Source(err.to_string())
    }
}
