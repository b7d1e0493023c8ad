//! Encrypted blob format.
//!
//! Every encrypted field is stored as one opaque byte string:
//!
//! ```text
//! [nonce:12][ciphertext:N][tag:16]
//! ```
//!
//! The layout carries no version, algorithm or key identifier. Nonce and tag
//! lengths are fixed by the deployment's cipher, and both supported ciphers
//! use the same sizes.

use crate::error::DecryptError;

/// Nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// Smallest valid blob: the encryption of an empty string.
pub const MIN_BLOB_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// An encrypted field value as persisted by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub(crate) fn assemble(nonce: &[u8; NONCE_SIZE], sealed: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(NONCE_SIZE + sealed.len());
        bytes.extend_from_slice(nonce);
        bytes.extend_from_slice(sealed);
        Self(bytes)
    }

    /// Rebuilds a blob from rows that keep the IV in a sibling column.
    ///
    /// `body` is the ciphertext with its trailing tag.
    ///
    /// # Errors
    ///
    /// Returns `DecryptError::Malformed` if `iv` is not [`NONCE_SIZE`] bytes
    /// or `body` is shorter than a tag.
    pub fn from_parts(iv: &[u8], body: &[u8]) -> Result<Self, DecryptError> {
        let nonce: &[u8; NONCE_SIZE] =
            iv.try_into().map_err(|_| DecryptError::Malformed { len: iv.len() + body.len() })?;
        if body.len() < TAG_SIZE {
            return Err(DecryptError::Malformed { len: iv.len() + body.len() });
        }
        Ok(Self::assemble(nonce, body))
    }

    /// Returns the nonce prefix, if the blob is long enough to have one.
    #[must_use]
    pub fn nonce(&self) -> Option<&[u8]> {
        self.0.get(..NONCE_SIZE)
    }

    /// Checks a sibling IV column against the nonce embedded in the blob.
    ///
    /// The blob is authoritative; a mismatch means the IV column is stale.
    #[must_use]
    pub fn matches_iv(&self, iv: &[u8]) -> bool {
        self.nonce() == Some(iv)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the blob, returning the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the blob length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the blob holds no bytes. Never the case for codec output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for EncryptedBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncryptedBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<EncryptedBlob> for Vec<u8> {
    fn from(blob: EncryptedBlob) -> Self {
        blob.0
    }
}

/// Splits raw blob bytes into nonce and sealed body.
pub(crate) fn split(bytes: &[u8]) -> Result<(&[u8; NONCE_SIZE], &[u8]), DecryptError> {
    if bytes.len() < MIN_BLOB_SIZE {
        return Err(DecryptError::Malformed { len: bytes.len() });
    }
    let (nonce, sealed) = bytes.split_at(NONCE_SIZE);
    let nonce = nonce.try_into().map_err(|_| DecryptError::Malformed { len: bytes.len() })?;
    Ok((nonce, sealed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rejects_short_input() {
        assert_eq!(split(&[]), Err(DecryptError::Malformed { len: 0 }));
        assert_eq!(
            split(&[0u8; MIN_BLOB_SIZE - 1]),
            Err(DecryptError::Malformed { len: MIN_BLOB_SIZE - 1 })
        );
    }

    #[test]
    fn test_split_layout() {
        let mut bytes = vec![1u8; NONCE_SIZE];
        bytes.extend_from_slice(&[2u8; TAG_SIZE + 3]);

        let (nonce, sealed) = split(&bytes).unwrap();
        assert_eq!(nonce, &[1u8; NONCE_SIZE]);
        assert_eq!(sealed.len(), TAG_SIZE + 3);
    }

    #[test]
    fn test_from_parts_matches_iv() {
        let iv = [5u8; NONCE_SIZE];
        let blob = EncryptedBlob::from_parts(&iv, &[0u8; TAG_SIZE]).unwrap();

        assert_eq!(blob.len(), MIN_BLOB_SIZE);
        assert!(blob.matches_iv(&iv));
        assert!(!blob.matches_iv(&[6u8; NONCE_SIZE]));
    }

    #[test]
    fn test_from_parts_rejects_bad_iv() {
        let result = EncryptedBlob::from_parts(&[0u8; 8], &[0u8; TAG_SIZE]);
        assert!(matches!(result, Err(DecryptError::Malformed { .. })));

        let result = EncryptedBlob::from_parts(&[0u8; NONCE_SIZE], &[0u8; 4]);
        assert!(matches!(result, Err(DecryptError::Malformed { .. })));
    }

    #[test]
    fn test_nonce_on_short_blob() {
        let blob = EncryptedBlob::from(vec![0u8; 4]);
        assert_eq!(blob.nonce(), None);
        assert!(!blob.matches_iv(&[0u8; 4]));
    }
}
