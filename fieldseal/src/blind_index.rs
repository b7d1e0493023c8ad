//! Blind index generation for indexed identity lookup.
//!
//! Field ciphertexts are randomized, so equal identities never produce equal
//! blobs. A blind index is a keyed one-way digest of the normalized identity
//! stored next to the randomized blob. It gives O(1) equality lookup while the
//! blob itself stays randomized.

use crate::context::IndexContext;
use crate::error::Error;
use crate::kdf::{derive_subkey, BLIND_INDEX_INFO};
use crate::key::Key;
use crate::resolver::normalize_identity;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretVec};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Standard blind index output size (16 bytes).
pub const BLIND_INDEX_SIZE: usize = 16;

/// Computes blind indexes under a pepper derived from the field key.
///
/// The blind index is computed as:
/// `HMAC-SHA256(pepper, normalize(value) || 0x00 || context)[..16]`
///
/// # Example
///
/// ```
/// use fieldseal::blind_index::BlindIndexer;
/// use fieldseal::context::IndexContext;
/// use fieldseal::key::Key;
///
/// let indexer = BlindIndexer::new(&Key::generate()).unwrap();
/// let context = IndexContext::new("patients", "email");
///
/// let a = indexer.index("Alice@Example.com ", &context).unwrap();
/// let b = indexer.index("alice@example.com", &context).unwrap();
/// assert_eq!(a, b);
/// ```
pub struct BlindIndexer {
    pepper: SecretVec<u8>,
}

impl BlindIndexer {
    /// Derives the pepper from `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexGenerationFailed` if derivation fails.
    pub fn new(key: &Key) -> Result<Self, Error> {
        Ok(Self { pepper: derive_subkey(key, BLIND_INDEX_INFO)? })
    }

    /// Computes the blind index of an identity value.
    ///
    /// The value is normalized first, so it matches under the same rules as
    /// the scanning resolver.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexGenerationFailed` if the HMAC cannot be keyed.
    pub fn index(&self, value: &str, context: &IndexContext) -> Result<Vec<u8>, Error> {
        let mut mac = HmacSha256::new_from_slice(self.pepper.expose_secret())
            .map_err(|e| Error::IndexGenerationFailed(format!("Invalid pepper: {e}")))?;

        mac.update(normalize_identity(value).as_bytes());
        // Separator keeps value and context from running together
        mac.update(&[0]);
        mac.update(context.to_string().as_bytes());

        let bytes = mac.finalize().into_bytes();
        Ok(bytes[..BLIND_INDEX_SIZE].to_vec())
    }
}

impl std::fmt::Debug for BlindIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlindIndexer([REDACTED])")
    }
}
